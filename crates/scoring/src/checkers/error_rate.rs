use sqlguard_ast::RiskLevel;
use sqlguard_audit::fingerprint;

use crate::checker::ScoringChecker;
use crate::model::{ExecutionResult, RiskScore};
use crate::sliding_window::SqlIdWindow;

/// Tracks a rolling error rate per `sql_id` (spec.md §4.8: "error-rate spike
/// via a sliding window over sqlId"). `sql_id` is re-derived from `sql` via
/// the same fingerprint used to build `AuditEvent.sql_id`, so this checker
/// windows on the same identity the rest of the system uses without needing
/// the caller to pass it separately.
pub struct ErrorRateSpike {
    window: SqlIdWindow,
    rate_threshold: f64,
}

impl ErrorRateSpike {
    pub fn new(rate_threshold: f64) -> Self {
        Self { window: SqlIdWindow::new(), rate_threshold }
    }
}

impl ScoringChecker for ErrorRateSpike {
    fn id(&self) -> &'static str {
        "SCORE006_ERROR_RATE_SPIKE"
    }

    fn score(&self, sql: &str, result: &ExecutionResult) -> Vec<RiskScore> {
        let sql_id = fingerprint(sql);
        let is_error = result.error_message.is_some();
        let rate = self.window.observe(&sql_id, result.executed_at, is_error);
        if rate > self.rate_threshold {
            vec![RiskScore::new(RiskLevel::High, format!("error rate {:.0}% over the recent window exceeds threshold", rate * 100.0))
                .with_confidence(rate)]
        } else {
            Vec::new()
        }
    }
}
