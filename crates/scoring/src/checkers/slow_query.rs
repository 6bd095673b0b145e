use sqlguard_ast::RiskLevel;

use crate::checker::ScoringChecker;
use crate::model::{ExecutionResult, RiskScore};

/// Flags executions that took longer than a configured threshold
/// (spec.md §4.8: "slow-query threshold → HIGH").
pub struct SlowQuery {
    threshold_ms: i64,
}

impl SlowQuery {
    pub fn new(threshold_ms: i64) -> Self {
        Self { threshold_ms }
    }
}

impl ScoringChecker for SlowQuery {
    fn id(&self) -> &'static str {
        "SCORE001_SLOW_QUERY"
    }

    fn score(&self, _sql: &str, result: &ExecutionResult) -> Vec<RiskScore> {
        if result.execution_time_ms > self.threshold_ms {
            vec![RiskScore::new(
                RiskLevel::High,
                format!("execution took {}ms, exceeding the {}ms threshold", result.execution_time_ms, self.threshold_ms),
            )]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn flags_executions_over_the_threshold() {
        let checker = SlowQuery::new(500);
        let result = ExecutionResult::new(1, 900, Utc::now()).unwrap();
        let scores = checker.score("SELECT 1", &result);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].severity, RiskLevel::High);
    }

    #[test]
    fn is_silent_under_the_threshold() {
        let checker = SlowQuery::new(500);
        let result = ExecutionResult::new(1, 100, Utc::now()).unwrap();
        assert!(checker.score("SELECT 1", &result).is_empty());
    }
}
