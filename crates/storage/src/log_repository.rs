use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sqlguard_audit::AuditEvent;

use crate::error::StorageResult;

/// Log store interface (spec.md §4.9). `log_batch` is the hot path —
/// implementations must write it as one batched operation, not a loop of
/// single-row inserts, since the consumer pipeline (C7) flushes a whole
/// worker batch at once.
#[async_trait]
pub trait ExecutionLogRepository: Send + Sync {
    async fn log(&self, event: &AuditEvent) -> StorageResult<()>;
    async fn log_batch(&self, events: &[AuditEvent]) -> StorageResult<()>;
    async fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<Vec<AuditEvent>>;
    async fn count_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<i64>;

    /// Safe to call concurrently with writers; must not block them beyond
    /// the granularity of a single partition/index delete (spec.md §4.9).
    async fn delete_older_than(&self, threshold: DateTime<Utc>) -> StorageResult<u64>;
}
