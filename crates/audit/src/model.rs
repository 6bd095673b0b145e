use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use sqlguard_ast::{CommandType, ExecutionLayer, ValidationResult};

use crate::fingerprint::fingerprint;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("rows_affected must be >= -1, got {0}")]
    InvalidRowsAffected(i64),
    #[error("timestamp {0} is outside the allowed clock-skew tolerance")]
    TimestampOutOfRange(DateTime<Utc>),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Tolerance applied when a caller supplies an explicit `occurred_at`
/// instead of letting the builder stamp `Utc::now()` — guards against a
/// misconfigured host clock silently producing unusable audit trails.
/// One-sided: spec.md §3 only bounds how far into the future a timestamp
/// may be ("timestamp <= now + 5s"); a timestamp in the past is always
/// legitimate (clock drift, delayed emission) and is never rejected here.
const CLOCK_SKEW_TOLERANCE_SECS: i64 = 5;

/// Sentinel for `rows_affected` when no row count applies — the statement
/// was blocked before execution, or the driver never reported one.
pub const ROWS_AFFECTED_NA: i64 = -1;

/// One audit record for a single SQL execution attempt (spec.md §3/§6).
/// Every field here is populated exactly once, through `AuditEventBuilder`
/// — never constructed with plain struct-literal syntax outside this crate,
/// so the `sql_id == md5(sql)` and `rows_affected >= -1` invariants cannot
/// be bypassed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub sql_id: String,
    pub sql: String,
    pub sql_type: CommandType,
    pub execution_layer: ExecutionLayer,
    pub statement_id: Option<String>,
    pub datasource: Option<String>,
    pub params: serde_json::Value,
    /// `0` when the statement never executed (e.g. blocked pre-execution).
    pub execution_time_ms: i64,
    /// `-1` (`ROWS_AFFECTED_NA`) when no row count applies.
    pub rows_affected: i64,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub pre_validation_result: Option<ValidationSummary>,
}

/// `ValidationResult` flattened into a serializable summary — the audit
/// event carries the outcome of pre-execution checking, not the checker
/// machinery itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub passed: bool,
    pub risk_level: sqlguard_ast::RiskLevel,
    pub violation_count: usize,
}

impl From<&ValidationResult> for ValidationSummary {
    fn from(result: &ValidationResult) -> Self {
        Self {
            passed: result.passed(),
            risk_level: result.risk_level(),
            violation_count: result.violations().len(),
        }
    }
}

pub struct AuditEventBuilder {
    sql: Option<String>,
    sql_type: Option<CommandType>,
    execution_layer: Option<ExecutionLayer>,
    statement_id: Option<String>,
    datasource: Option<String>,
    params: serde_json::Value,
    execution_time_ms: i64,
    rows_affected: i64,
    error_message: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    pre_validation_result: Option<ValidationSummary>,
}

impl AuditEventBuilder {
    pub fn new(sql: impl Into<String>, sql_type: CommandType, execution_layer: ExecutionLayer) -> Self {
        Self {
            sql: Some(sql.into()),
            sql_type: Some(sql_type),
            execution_layer: Some(execution_layer),
            statement_id: None,
            datasource: None,
            params: serde_json::Value::Null,
            execution_time_ms: 0,
            rows_affected: ROWS_AFFECTED_NA,
            error_message: None,
            timestamp: None,
            pre_validation_result: None,
        }
    }

    pub fn statement_id(mut self, id: impl Into<String>) -> Self {
        self.statement_id = Some(id.into());
        self
    }

    pub fn datasource(mut self, ds: impl Into<String>) -> Self {
        self.datasource = Some(ds.into());
        self
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    pub fn execution_time_ms(mut self, ms: i64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    pub fn rows_affected(mut self, rows: i64) -> Self {
        self.rows_affected = rows;
        self
    }

    pub fn error_message(mut self, msg: impl Into<String>) -> Self {
        self.error_message = Some(msg.into());
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn pre_validation_result(mut self, result: &ValidationResult) -> Self {
        self.pre_validation_result = Some(ValidationSummary::from(result));
        self
    }

    pub fn build(self) -> AuditResult<AuditEvent> {
        let sql = self.sql.expect("AuditEventBuilder::new always sets sql");
        let sql_type = self.sql_type.expect("AuditEventBuilder::new always sets sql_type");
        let execution_layer = self.execution_layer.expect("AuditEventBuilder::new always sets execution_layer");

        if self.rows_affected < ROWS_AFFECTED_NA {
            return Err(AuditError::InvalidRowsAffected(self.rows_affected));
        }

        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let now = Utc::now();
        if (timestamp - now).num_seconds() > CLOCK_SKEW_TOLERANCE_SECS {
            return Err(AuditError::TimestampOutOfRange(timestamp));
        }

        Ok(AuditEvent {
            id: Uuid::new_v4(),
            sql_id: fingerprint(&sql),
            sql,
            sql_type,
            execution_layer,
            statement_id: self.statement_id,
            datasource: self.datasource,
            params: self.params,
            execution_time_ms: self.execution_time_ms,
            rows_affected: self.rows_affected,
            error_message: self.error_message,
            timestamp,
            pre_validation_result: self.pre_validation_result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_id_is_the_fingerprint_of_sql() {
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Mybatis).build().unwrap();
        assert_eq!(event.sql_id, fingerprint("SELECT 1"));
    }

    #[test]
    fn negative_rows_affected_below_sentinel_is_rejected() {
        let err = AuditEventBuilder::new("DELETE FROM t", CommandType::Delete, ExecutionLayer::Jdbc)
            .rows_affected(-2)
            .build()
            .unwrap_err();
        assert!(matches!(err, AuditError::InvalidRowsAffected(-2)));
    }

    #[test]
    fn sentinel_rows_affected_of_negative_one_is_allowed() {
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc)
            .rows_affected(-1)
            .build()
            .unwrap();
        assert_eq!(event.rows_affected, -1);
    }

    #[test]
    fn timestamp_far_in_the_future_is_rejected() {
        let bogus = Utc::now() + Duration::days(1);
        let err = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc)
            .timestamp(bogus)
            .build()
            .unwrap_err();
        assert!(matches!(err, AuditError::TimestampOutOfRange(_)));
    }

    #[test]
    fn timestamp_far_in_the_past_is_allowed() {
        let old = Utc::now() - Duration::days(365);
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc)
            .timestamp(old)
            .build()
            .unwrap();
        assert_eq!(event.timestamp, old);
    }

    #[test]
    fn unset_rows_affected_and_execution_time_default_to_sentinels() {
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc).build().unwrap();
        assert_eq!(event.rows_affected, ROWS_AFFECTED_NA);
        assert_eq!(event.execution_time_ms, 0);
    }
}
