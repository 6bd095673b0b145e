use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use sqlguard_ast::RiskLevel;
use sqlguard_observability::Metrics;
use sqlguard_scoring::{AuditReport, CheckerResult, RiskScore};

use crate::error::{StorageError, StorageResult};
use crate::report_repository::AuditReportRepository;

const REPOSITORY_LABEL: &str = "audit_reports";

/// Relational metadata store backing (spec.md §6: `audit_reports(report_id
/// PK, sql_id indexed, original_event_json, checker_results_json,
/// risk_level, risk_score, created_at indexed)`), grounded on the teacher's
/// `payment-service::repo` upsert idiom (`ON CONFLICT ... DO UPDATE`).
pub struct PostgresReportRepository {
    pool: PgPool,
    metrics: Arc<Metrics>,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self { pool, metrics }
    }
}

#[derive(FromRow)]
struct ReportRow {
    report_id: Uuid,
    sql_id: String,
    original_event_json: serde_json::Value,
    checker_results_json: serde_json::Value,
    risk_level: String,
    risk_score: Option<f64>,
    created_at: DateTime<Utc>,
}

impl ReportRow {
    fn into_report(self) -> StorageResult<AuditReport> {
        let original_event = serde_json::from_value(self.original_event_json)?;
        let checker_results: Vec<CheckerResult> = serde_json::from_value(self.checker_results_json)?;
        let severity = parse_risk_level(&self.risk_level);
        Ok(AuditReport {
            report_id: self.report_id,
            sql_id: self.sql_id,
            original_event,
            checker_results,
            aggregated_risk_score: RiskScore { severity, confidence: self.risk_score, justification: "aggregated from checker results".to_string() },
            created_at: self.created_at,
        })
    }
}

fn parse_risk_level(s: &str) -> RiskLevel {
    match s {
        "LOW" => RiskLevel::Low,
        "MEDIUM" => RiskLevel::Medium,
        "HIGH" => RiskLevel::High,
        "CRITICAL" => RiskLevel::Critical,
        _ => RiskLevel::Safe,
    }
}

fn risk_level_str(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Safe => "SAFE",
        RiskLevel::Low => "LOW",
        RiskLevel::Medium => "MEDIUM",
        RiskLevel::High => "HIGH",
        RiskLevel::Critical => "CRITICAL",
    }
}

#[async_trait]
impl AuditReportRepository for PostgresReportRepository {
    async fn save(&self, report: &AuditReport) -> StorageResult<()> {
        let original_event_json = serde_json::to_value(&report.original_event)?;
        let checker_results_json = serde_json::to_value(&report.checker_results)?;
        let started = std::time::Instant::now();
        let outcome = sqlx::query(
            r#"INSERT INTO audit_reports (report_id, sql_id, original_event_json, checker_results_json, risk_level, risk_score, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (report_id) DO UPDATE SET
                 original_event_json = EXCLUDED.original_event_json,
                 checker_results_json = EXCLUDED.checker_results_json,
                 risk_level = EXCLUDED.risk_level,
                 risk_score = EXCLUDED.risk_score"#,
        )
        .bind(report.report_id)
        .bind(&report.sql_id)
        .bind(original_event_json)
        .bind(checker_results_json)
        .bind(risk_level_str(report.aggregated_risk_score.severity))
        .bind(report.aggregated_risk_score.confidence)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from);
        self.metrics.write_latency_seconds.observe(started.elapsed().as_secs_f64());
        match outcome {
            Ok(_) => {
                self.metrics.writes_total.with_label_values(&[REPOSITORY_LABEL, "success"]).inc();
                Ok(())
            }
            Err(e) => {
                self.metrics.writes_total.with_label_values(&[REPOSITORY_LABEL, "error"]).inc();
                self.metrics.write_errors_total.with_label_values(&[REPOSITORY_LABEL]).inc();
                Err(e)
            }
        }
    }

    async fn find_by_id(&self, report_id: Uuid) -> StorageResult<Option<AuditReport>> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"SELECT report_id, sql_id, original_event_json, checker_results_json, risk_level, risk_score, created_at
               FROM audit_reports WHERE report_id = $1"#,
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ReportRow::into_report).transpose()
    }

    async fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StorageResult<Vec<AuditReport>> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"SELECT report_id, sql_id, original_event_json, checker_results_json, risk_level, risk_score, created_at
               FROM audit_reports WHERE created_at >= $1 AND created_at < $2 ORDER BY created_at"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ReportRow::into_report).collect()
    }
}
