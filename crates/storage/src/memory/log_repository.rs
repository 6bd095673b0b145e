use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use sqlguard_audit::AuditEvent;

use crate::error::StorageResult;
use crate::log_repository::ExecutionLogRepository;

#[derive(Default)]
pub struct InMemoryLogRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionLogRepository for InMemoryLogRepository {
    async fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        self.events.write().push(event.clone());
        Ok(())
    }

    async fn log_batch(&self, events: &[AuditEvent]) -> StorageResult<()> {
        self.events.write().extend(events.iter().cloned());
        Ok(())
    }

    async fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<Vec<AuditEvent>> {
        Ok(self.events.read().iter().filter(|e| e.timestamp >= start && e.timestamp < end).cloned().collect())
    }

    async fn count_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<i64> {
        Ok(self.events.read().iter().filter(|e| e.timestamp >= start && e.timestamp < end).count() as i64)
    }

    async fn delete_older_than(&self, threshold: DateTime<Utc>) -> StorageResult<u64> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|e| e.timestamp >= threshold);
        Ok((before - events.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlguard_ast::{CommandType, ExecutionLayer};
    use sqlguard_audit::AuditEventBuilder;

    fn event() -> AuditEvent {
        AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc).build().unwrap()
    }

    #[tokio::test]
    async fn log_batch_appends_all_events() {
        let repo = InMemoryLogRepository::new();
        repo.log_batch(&[event(), event(), event()]).await.unwrap();
        let now = Utc::now();
        let count = repo.count_by_time_range(now - Duration::hours(1), now + Duration::hours(1)).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn delete_older_than_removes_only_stale_events() {
        let repo = InMemoryLogRepository::new();
        let mut old = event();
        old.timestamp = Utc::now() - Duration::days(100);
        repo.log(&old).await.unwrap();
        repo.log(&event()).await.unwrap();
        let deleted = repo.delete_older_than(Utc::now() - Duration::days(1)).await.unwrap();
        assert_eq!(deleted, 1);
        let now = Utc::now();
        let remaining = repo.count_by_time_range(now - Duration::hours(1), now + Duration::hours(1)).await.unwrap();
        assert_eq!(remaining, 1);
    }
}
