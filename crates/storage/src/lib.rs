pub mod error;
pub mod log_repository;
pub mod memory;
pub mod postgres;
pub mod report_repository;

pub use error::{StorageError, StorageResult};
pub use log_repository::ExecutionLogRepository;
pub use memory::{InMemoryLogRepository, InMemoryReportRepository};
pub use postgres::{PostgresLogRepository, PostgresReportRepository};
pub use report_repository::AuditReportRepository;
