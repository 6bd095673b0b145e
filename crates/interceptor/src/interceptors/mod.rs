pub mod check_interceptor;
pub mod select_limit_fallback;

pub use check_interceptor::CheckInterceptor;
pub use select_limit_fallback::SelectLimitFallback;
