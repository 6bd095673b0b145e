use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use sqlguard_ast::RiskLevel;
use sqlguard_audit::AuditEvent;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("rows_affected must be >= -1, got {0}")]
    InvalidRowsAffected(i64),
    #[error("execution_time_ms must be >= 0, got {0}")]
    InvalidExecutionTime(i64),
    /// A `ScoringChecker` panicked instead of returning. Treated as a bug in
    /// the checker, not a malformed event (spec.md §4.7's third failure
    /// class) — the caller retries and eventually routes to the DLQ rather
    /// than trusting a half-aggregated report.
    #[error("scoring checker panicked: {0}")]
    CheckerPanicked(String),
}

/// A single post-execution checker's finding (spec.md §3 `RiskScore`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub severity: RiskLevel,
    pub confidence: Option<f64>,
    pub justification: String,
}

impl RiskScore {
    pub fn new(severity: RiskLevel, justification: impl Into<String>) -> Self {
        Self { severity, confidence: None, justification: justification.into() }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Post-execution observation handed to the scoring engine (spec.md §3).
/// `rows_affected >= -1` and `execution_time_ms >= 0` are enforced at
/// construction, mirroring the audit crate's `AuditEventBuilder` invariant
/// style rather than trusting the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub rows_affected: i64,
    pub result_set_size: Option<i64>,
    pub execution_time_ms: i64,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
    pub metrics: serde_json::Value,
}

impl ExecutionResult {
    pub fn new(rows_affected: i64, execution_time_ms: i64, executed_at: DateTime<Utc>) -> Result<Self, ScoringError> {
        if rows_affected < -1 {
            return Err(ScoringError::InvalidRowsAffected(rows_affected));
        }
        if execution_time_ms < 0 {
            return Err(ScoringError::InvalidExecutionTime(execution_time_ms));
        }
        Ok(Self {
            rows_affected,
            result_set_size: None,
            execution_time_ms,
            error_message: None,
            executed_at,
            metrics: serde_json::Value::Null,
        })
    }

    pub fn with_result_set_size(mut self, size: i64) -> Self {
        self.result_set_size = Some(size);
        self
    }

    pub fn with_error_message(mut self, msg: impl Into<String>) -> Self {
        self.error_message = Some(msg.into());
        self
    }
}

/// One checker's contribution to an `AuditReport` (spec.md §3
/// `checkerResults`): the checker id alongside whatever `RiskScore`s it
/// produced, so an empty `scores` vec records "this checker ran and found
/// nothing" distinctly from "this checker was disabled".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerResult {
    pub checker_id: &'static str,
    pub scores: Vec<RiskScore>,
}

/// Aggregated post-execution verdict for one `AuditEvent` (spec.md §3/§6).
/// `report_id` is deterministic from `(sql_id, timestamp bucket)` so
/// `AuditReportRepository::save` can upsert idempotently under
/// at-least-once delivery (spec.md §4.7's exactly-once stance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub report_id: Uuid,
    pub sql_id: String,
    pub original_event: AuditEvent,
    pub checker_results: Vec<CheckerResult>,
    pub aggregated_risk_score: RiskScore,
    pub created_at: DateTime<Utc>,
}
