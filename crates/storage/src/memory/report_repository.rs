use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use sqlguard_scoring::AuditReport;

use crate::error::StorageResult;
use crate::report_repository::AuditReportRepository;

/// In-process backing for tests and local development: a plain
/// `parking_lot::RwLock`-guarded map, matching the pack's idiom for
/// read-heavy in-memory stores rather than a bespoke lock-free structure.
#[derive(Default)]
pub struct InMemoryReportRepository {
    reports: RwLock<HashMap<Uuid, AuditReport>>,
}

impl InMemoryReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditReportRepository for InMemoryReportRepository {
    async fn save(&self, report: &AuditReport) -> StorageResult<()> {
        self.reports.write().insert(report.report_id, report.clone());
        Ok(())
    }

    async fn find_by_id(&self, report_id: Uuid) -> StorageResult<Option<AuditReport>> {
        Ok(self.reports.read().get(&report_id).cloned())
    }

    async fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<Vec<AuditReport>> {
        let mut matching: Vec<AuditReport> =
            self.reports.read().values().filter(|r| r.created_at >= start && r.created_at < end).cloned().collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }
}
