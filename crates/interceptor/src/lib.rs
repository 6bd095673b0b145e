pub mod chain;
pub mod inner;
pub mod interceptors;
pub mod outer;
pub mod strategy;

pub use chain::{BlockError, InterceptorChain, Operation};
pub use inner::InnerInterceptor;
pub use interceptors::{check_interceptor::take_last_validation_result, CheckInterceptor, SelectLimitFallback};
pub use outer::{Driver, DriverError, DriverOutcome, ExecuteError, OuterInterceptor};
pub use strategy::ValidationStrategy;
