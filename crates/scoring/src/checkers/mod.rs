pub mod error_pattern;
pub mod error_rate;
pub mod impact;
pub mod slow_query;

use crate::checker::ScoringChecker;
use crate::config::ScoringConfig;

pub use error_pattern::{DeadlockPattern, GenericError, SyntaxErrorPattern};
pub use error_rate::ErrorRateSpike;
pub use impact::ActualImpactNoWhere;
pub use slow_query::SlowQuery;

/// The full catalogue wired from configuration, in the order spec.md §4.8
/// lists the examples (slow query, deadlock, syntax error, generic error,
/// actual-impact no-WHERE, error-rate spike).
pub fn default_checkers(config: &ScoringConfig) -> Vec<Box<dyn ScoringChecker>> {
    vec![
        Box::new(SlowQuery::new(config.slow_query_threshold_ms)),
        Box::new(DeadlockPattern),
        Box::new(SyntaxErrorPattern),
        Box::new(GenericError),
        Box::new(ActualImpactNoWhere::new(config.actual_impact_rows_affected_threshold)),
        Box::new(ErrorRateSpike::new(config.error_rate_threshold)),
    ]
}
