use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;
use uuid::Uuid;

use sqlguard_ast::RiskLevel;
use sqlguard_audit::AuditEvent;

use crate::checker::ScoringCatalogue;
use crate::model::{AuditReport, CheckerResult, ExecutionResult, RiskScore, ScoringError};

/// Runs the scoring catalogue over one `(AuditEvent, ExecutionResult)` pair
/// and aggregates into an `AuditReport` (spec.md §4.8).
pub struct ScoringEngine {
    catalogue: ScoringCatalogue,
}

impl ScoringEngine {
    pub fn new(catalogue: ScoringCatalogue) -> Self {
        Self { catalogue }
    }

    /// A panicking `ScoringChecker` is a bug in that checker, not a reason to
    /// abort the worker task it runs on (spec.md §4.7's third failure class:
    /// "scoring-engine errors that indicate a bug"). Catching the unwind here
    /// turns it into an ordinary `Err` the caller can retry and eventually
    /// DLQ, the same way a malformed event or a storage failure is handled.
    pub fn evaluate(&self, event: &AuditEvent, result: &ExecutionResult) -> Result<AuditReport, ScoringError> {
        let catalogue = &self.catalogue;
        let sql = &event.sql;
        let raw_results = panic::catch_unwind(AssertUnwindSafe(|| catalogue.run(sql, result)))
            .map_err(|payload| ScoringError::CheckerPanicked(panic_message(&payload)))?;

        let checker_results: Vec<CheckerResult> =
            raw_results.into_iter().map(|(checker_id, scores)| CheckerResult { checker_id, scores }).collect();

        let aggregated_severity = checker_results
            .iter()
            .flat_map(|r| r.scores.iter())
            .map(|s| s.severity)
            .max()
            .unwrap_or(RiskLevel::Safe);

        let aggregated_risk_score = RiskScore::new(aggregated_severity, "aggregated from checker results");

        Ok(AuditReport {
            report_id: deterministic_report_id(&event.sql_id, result.executed_at),
            sql_id: event.sql_id.clone(),
            original_event: event.clone(),
            checker_results,
            aggregated_risk_score,
            created_at: Utc::now(),
        })
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Report ids are deterministic from `(sql_id, timestamp bucket)` rather
/// than random, so re-delivery of the same audit event under at-least-once
/// Kafka consumption (spec.md §4.7) upserts the same row instead of
/// duplicating it. Bucketed to the minute: a retry of the same execution
/// lands in the same bucket, two genuinely distinct executions of the same
/// statement a minute apart do not collide.
fn deterministic_report_id(sql_id: &str, executed_at: chrono::DateTime<Utc>) -> Uuid {
    let bucket = executed_at.timestamp() / 60;
    let name = format!("{sql_id}:{bucket}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ScoringChecker;
    use crate::checkers::default_checkers;
    use crate::config::ScoringConfig;
    use sqlguard_ast::{CommandType, ExecutionLayer};
    use sqlguard_audit::AuditEventBuilder;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringCatalogue::new(default_checkers(&ScoringConfig::default())))
    }

    #[test]
    fn a_clean_fast_execution_is_safe() {
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc).build().unwrap();
        let result = ExecutionResult::new(1, 10, Utc::now()).unwrap();
        let report = engine().evaluate(&event, &result).unwrap();
        assert_eq!(report.aggregated_risk_score.severity, RiskLevel::Safe);
    }

    #[test]
    fn a_slow_query_aggregates_to_high() {
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc).build().unwrap();
        let result = ExecutionResult::new(1, 5000, Utc::now()).unwrap();
        let report = engine().evaluate(&event, &result).unwrap();
        assert_eq!(report.aggregated_risk_score.severity, RiskLevel::High);
    }

    #[test]
    fn repeated_delivery_of_the_same_event_in_the_same_bucket_yields_the_same_report_id() {
        let now = Utc::now();
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc).build().unwrap();
        let result = ExecutionResult::new(1, 10, now).unwrap();
        let r1 = engine().evaluate(&event, &result).unwrap();
        let r2 = engine().evaluate(&event, &result).unwrap();
        assert_eq!(r1.report_id, r2.report_id);
    }

    struct PanickingChecker;
    impl ScoringChecker for PanickingChecker {
        fn id(&self) -> &'static str {
            "PANIC001_TEST_ONLY"
        }
        fn score(&self, _sql: &str, _result: &ExecutionResult) -> Vec<RiskScore> {
            panic!("boom")
        }
    }

    #[test]
    fn a_panicking_checker_yields_a_checker_panicked_error_instead_of_aborting() {
        let engine = ScoringEngine::new(ScoringCatalogue::new(vec![Box::new(PanickingChecker)]));
        let event = AuditEventBuilder::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc).build().unwrap();
        let result = ExecutionResult::new(1, 10, Utc::now()).unwrap();
        let err = engine.evaluate(&event, &result).unwrap_err();
        assert!(matches!(err, ScoringError::CheckerPanicked(_)));
    }
}
