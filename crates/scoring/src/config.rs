use serde::{Deserialize, Serialize};

/// Thresholds for the post-execution scoring catalogue (spec.md §4.8).
/// Mirrors `sqlguard_rules::RulesConfig`'s shape: one flat, `serde`-backed
/// struct with `#[serde(default)]` fields so a host can override only the
/// thresholds it cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub slow_query_threshold_ms: i64,
    pub actual_impact_rows_affected_threshold: i64,
    pub error_rate_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 1000,
            actual_impact_rows_affected_threshold: 1000,
            error_rate_threshold: 0.2,
        }
    }
}
