use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use sqlguard_audit::AuditEvent;
use sqlguard_observability::Metrics;

use crate::error::StorageResult;
use crate::log_repository::ExecutionLogRepository;

const REPOSITORY_LABEL: &str = "execution_log";

/// Monthly-range-partitioned relational backing for the log store
/// (spec.md §4.9/§6), grounded directly on `audit-consumer/src/main.rs`'s
/// batch-insert-with-`ON CONFLICT DO NOTHING` and time-threshold delete
/// idiom.
pub struct PostgresLogRepository {
    pool: PgPool,
    metrics: Arc<Metrics>,
}

impl PostgresLogRepository {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self { pool, metrics }
    }

    async fn log_batch_inner(&self, events: &[AuditEvent]) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        for event in events {
            let payload = serde_json::to_value(event)?;
            sqlx::query(
                r#"INSERT INTO execution_log (id, sql_id, timestamp, event_json)
                   VALUES ($1, $2, $3, $4)
                   ON CONFLICT (id) DO NOTHING"#,
            )
            .bind(event.id)
            .bind(&event.sql_id)
            .bind(event.timestamp)
            .bind(payload)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(FromRow)]
struct EventRow {
    event_json: serde_json::Value,
}

#[async_trait]
impl ExecutionLogRepository for PostgresLogRepository {
    async fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        self.log_batch(std::slice::from_ref(event)).await
    }

    async fn log_batch(&self, events: &[AuditEvent]) -> StorageResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let started = std::time::Instant::now();
        let outcome = self.log_batch_inner(events).await;
        self.metrics.write_latency_seconds.observe(started.elapsed().as_secs_f64());
        match &outcome {
            Ok(()) => {
                self.metrics.writes_total.with_label_values(&[REPOSITORY_LABEL, "success"]).inc();
            }
            Err(_) => {
                self.metrics.writes_total.with_label_values(&[REPOSITORY_LABEL, "error"]).inc();
                self.metrics.write_errors_total.with_label_values(&[REPOSITORY_LABEL]).inc();
            }
        }
        outcome
    }

    async fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<Vec<AuditEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"SELECT event_json FROM execution_log WHERE timestamp >= $1 AND timestamp < $2 ORDER BY timestamp"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| serde_json::from_value(r.event_json).map_err(Into::into)).collect()
    }

    async fn count_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT count(*)::BIGINT FROM execution_log WHERE timestamp >= $1 AND timestamp < $2"#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn delete_older_than(&self, threshold: DateTime<Utc>) -> StorageResult<u64> {
        let done = sqlx::query(r#"DELETE FROM execution_log WHERE timestamp < $1"#)
            .bind(threshold)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
