use crate::model::{ExecutionResult, RiskScore};

/// A unit of post-execution scoring logic (spec.md §4.8). Unlike the
/// pre-execution `Checker` trait (sqlguard-rules), a `ScoringChecker`
/// operates on `(sql, ExecutionResult)` rather than a parsed AST + context —
/// post-execution risk is about what actually happened, not what the
/// statement shape implies.
pub trait ScoringChecker: Send + Sync {
    fn id(&self) -> &'static str;

    fn score(&self, sql: &str, result: &ExecutionResult) -> Vec<RiskScore>;
}

/// Owns the scoring checkers in a stable order and runs every one of them
/// over one `(sql, ExecutionResult)` pair (spec.md §4.8), mirroring
/// `sqlguard_rules::RuleCatalogue`'s sequential-dispatch shape.
pub struct ScoringCatalogue {
    checkers: Vec<Box<dyn ScoringChecker>>,
}

impl ScoringCatalogue {
    pub fn new(checkers: Vec<Box<dyn ScoringChecker>>) -> Self {
        Self { checkers }
    }

    pub fn checkers(&self) -> &[Box<dyn ScoringChecker>] {
        &self.checkers
    }

    pub fn run(&self, sql: &str, result: &ExecutionResult) -> Vec<(&'static str, Vec<RiskScore>)> {
        self.checkers.iter().map(|c| (c.id(), c.score(sql, result))).collect()
    }
}
