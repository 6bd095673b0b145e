use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use sqlguard_scoring::AuditReport;

use crate::error::StorageResult;

/// Metadata store interface (spec.md §4.9). `save` must be idempotent by
/// `report_id` so at-least-once redelivery of the same event upserts
/// instead of duplicating (spec.md §4.7's exactly-once stance).
#[async_trait]
pub trait AuditReportRepository: Send + Sync {
    async fn save(&self, report: &AuditReport) -> StorageResult<()>;
    async fn find_by_id(&self, report_id: Uuid) -> StorageResult<Option<AuditReport>>;
    async fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<Vec<AuditReport>>;
}
