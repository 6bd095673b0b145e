use sqlguard_ast::RiskLevel;

use crate::checker::ScoringChecker;
use crate::model::{ExecutionResult, RiskScore};

/// Confirms, after the fact, that an UPDATE/DELETE with no `WHERE` clause
/// actually touched a large number of rows (spec.md §4.8: "actual-impact
/// no-WHERE confirmed by rowsAffected > configured threshold → CRITICAL").
/// This is independent of the pre-execution `MissingWhere` checker (C2):
/// that one fires on statement shape alone, this one fires only once the
/// blast radius is observed, catching cases where BLOCK wasn't the active
/// strategy.
pub struct ActualImpactNoWhere {
    rows_affected_threshold: i64,
}

impl ActualImpactNoWhere {
    pub fn new(rows_affected_threshold: i64) -> Self {
        Self { rows_affected_threshold }
    }

    fn lacks_where(sql: &str) -> bool {
        let upper = sql.to_uppercase();
        let is_mutation = upper.trim_start().starts_with("UPDATE") || upper.trim_start().starts_with("DELETE");
        is_mutation && !upper.contains(" WHERE ") && !upper.trim_end().ends_with("WHERE")
    }
}

impl ScoringChecker for ActualImpactNoWhere {
    fn id(&self) -> &'static str {
        "SCORE005_ACTUAL_IMPACT_NO_WHERE"
    }

    fn score(&self, sql: &str, result: &ExecutionResult) -> Vec<RiskScore> {
        if Self::lacks_where(sql) && result.rows_affected > self.rows_affected_threshold {
            vec![RiskScore::new(
                RiskLevel::Critical,
                format!("unconditional statement affected {} rows, exceeding threshold {}", result.rows_affected, self.rows_affected_threshold),
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
    fn large_blast_radius_without_where_is_critical() {
        let checker = ActualImpactNoWhere::new(100);
        let result = ExecutionResult::new(5000, 20, Utc::now()).unwrap();
        let scores = checker.score("UPDATE users SET active = 0", &result);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].severity, RiskLevel::Critical);
    }

    #[test]
    fn small_blast_radius_is_silent() {
        let checker = ActualImpactNoWhere::new(100);
        let result = ExecutionResult::new(3, 20, Utc::now()).unwrap();
        assert!(checker.score("UPDATE users SET active = 0", &result).is_empty());
    }

    #[test]
    fn a_filtered_statement_is_silent_regardless_of_impact() {
        let checker = ActualImpactNoWhere::new(100);
        let result = ExecutionResult::new(5000, 20, Utc::now()).unwrap();
        assert!(checker.score("UPDATE users SET active = 0 WHERE tenant_id = 7", &result).is_empty());
    }
}
