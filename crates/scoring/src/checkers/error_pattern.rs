use once_cell::sync::Lazy;
use regex::RegexSet;

use sqlguard_ast::RiskLevel;

use crate::checker::ScoringChecker;
use crate::model::{ExecutionResult, RiskScore};

static DEADLOCK_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"(?i)deadlock", r"(?i)lock wait timeout", r"(?i)could not obtain lock"]).unwrap()
});

static SYNTAX_ERROR_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"(?i)syntax error", r"(?i)parse error", r"(?i)unexpected token"]).unwrap()
});

/// Matches `errorMessage` against a deadlock/lock-wait pattern set
/// (spec.md §4.8: HIGH).
pub struct DeadlockPattern;

impl ScoringChecker for DeadlockPattern {
    fn id(&self) -> &'static str {
        "SCORE002_DEADLOCK"
    }

    fn score(&self, _sql: &str, result: &ExecutionResult) -> Vec<RiskScore> {
        match &result.error_message {
            Some(msg) if DEADLOCK_PATTERNS.is_match(msg) => {
                vec![RiskScore::new(RiskLevel::High, "error message matches a deadlock/lock-wait pattern")]
            }
            _ => Vec::new(),
        }
    }
}

/// Matches `errorMessage` against a syntax-error pattern set
/// (spec.md §4.8: MEDIUM).
pub struct SyntaxErrorPattern;

impl ScoringChecker for SyntaxErrorPattern {
    fn id(&self) -> &'static str {
        "SCORE003_SYNTAX_ERROR"
    }

    fn score(&self, _sql: &str, result: &ExecutionResult) -> Vec<RiskScore> {
        match &result.error_message {
            Some(msg) if SYNTAX_ERROR_PATTERNS.is_match(msg) => {
                vec![RiskScore::new(RiskLevel::Medium, "error message matches a syntax-error pattern")]
            }
            _ => Vec::new(),
        }
    }
}

/// Any other non-empty `errorMessage` not already classified by a more
/// specific checker (spec.md §4.8: "generic error → LOW"). Must run after
/// `DeadlockPattern`/`SyntaxErrorPattern` in the catalogue ordering so those
/// take priority, though the catalogue runs every checker unconditionally —
/// the aggregator's max-severity rule makes ordering advisory, not load
/// bearing.
pub struct GenericError;

impl ScoringChecker for GenericError {
    fn id(&self) -> &'static str {
        "SCORE004_GENERIC_ERROR"
    }

    fn score(&self, _sql: &str, result: &ExecutionResult) -> Vec<RiskScore> {
        match &result.error_message {
            Some(msg) if !msg.is_empty() && !DEADLOCK_PATTERNS.is_match(msg) && !SYNTAX_ERROR_PATTERNS.is_match(msg) => {
                vec![RiskScore::new(RiskLevel::Low, "execution failed with an unclassified error")]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result_with_error(msg: &str) -> ExecutionResult {
        ExecutionResult::new(0, 10, Utc::now()).unwrap().with_error_message(msg)
    }

    #[test]
    fn deadlock_message_is_flagged_high() {
        let scores = DeadlockPattern.score("UPDATE t SET x=1", &result_with_error("Deadlock found when trying to get lock"));
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].severity, RiskLevel::High);
    }

    #[test]
    fn syntax_error_message_is_flagged_medium() {
        let scores = SyntaxErrorPattern.score("SELECT", &result_with_error("You have a syntax error near 'FROM'"));
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].severity, RiskLevel::Medium);
    }

    #[test]
    fn unclassified_error_is_flagged_low() {
        let scores = GenericError.score("SELECT 1", &result_with_error("connection reset by peer"));
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].severity, RiskLevel::Low);
    }

    #[test]
    fn generic_error_checker_defers_to_deadlock_pattern() {
        let scores = GenericError.score("SELECT 1", &result_with_error("Deadlock found when trying to get lock"));
        assert!(scores.is_empty());
    }

    #[test]
    fn no_error_message_is_silent() {
        let clean = ExecutionResult::new(1, 10, Utc::now()).unwrap();
        assert!(DeadlockPattern.score("SELECT 1", &clean).is_empty());
        assert!(SyntaxErrorPattern.score("SELECT 1", &clean).is_empty());
        assert!(GenericError.score("SELECT 1", &clean).is_empty());
    }
}
