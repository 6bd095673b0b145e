use std::sync::Arc;

use sqlguard_ast::{ParsedStatement, SqlContext, ViolationInfo};

use crate::config::RulesConfig;

/// A unit of rule logic (spec §4.2). Checkers must be pure with respect to
/// `ctx`: no I/O, no mutation of the AST, deterministic given the same
/// `(stmt, ctx)` pair.
pub trait Checker: Send + Sync {
    /// Stable identifier used in config (`disabled`, `severity_overrides`)
    /// and in metrics labels.
    fn id(&self) -> &'static str;

    fn enabled(&self) -> bool {
        true
    }

    fn check(&self, stmt: &ParsedStatement, ctx: &SqlContext) -> Vec<ViolationInfo>;
}

/// Owns the enabled checkers in a stable, configuration-declared order and
/// runs every one of them over a single parsed statement (spec §4.3 step 3).
///
/// Unlike the sqlparser-based analyzer this is grounded on — which runs its
/// rules in parallel with `rayon` since it processes many independent
/// queries in a batch CLI run — this catalogue dispatches sequentially: it
/// is invoked once per live SQL execution on the hot path, over a single
/// already-parsed statement, so there is no batch of independent work to
/// parallelize and doing so would only add scheduling overhead.
pub struct RuleCatalogue {
    checkers: Vec<Box<dyn Checker>>,
    config: Arc<RulesConfig>,
}

impl RuleCatalogue {
    pub fn new(checkers: Vec<Box<dyn Checker>>, config: Arc<RulesConfig>) -> Self {
        Self { checkers, config }
    }

    pub fn checkers(&self) -> &[Box<dyn Checker>] {
        &self.checkers
    }

    /// Filters out checkers a checker's own `enabled()` override disables,
    /// then filters out checkers `RulesConfig.disabled` names by id, then
    /// remaps each surviving violation's risk level through
    /// `RulesConfig.severity_overrides` (spec.md §4.2/§6).
    pub fn run(&self, stmt: &ParsedStatement, ctx: &SqlContext) -> Vec<(&'static str, Vec<ViolationInfo>)> {
        self.checkers
            .iter()
            .filter(|c| c.enabled() && self.config.is_enabled(c.id()))
            .map(|c| {
                let id = c.id();
                let violations = c
                    .check(stmt, ctx)
                    .into_iter()
                    .map(|v| {
                        let risk_level = self.config.severity_for(id, v.risk_level);
                        ViolationInfo { risk_level, ..v }
                    })
                    .collect();
                (id, violations)
            })
            .collect()
    }
}
