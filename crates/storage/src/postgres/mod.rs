pub mod log_repository;
pub mod report_repository;

pub use log_repository::PostgresLogRepository;
pub use report_repository::PostgresReportRepository;
