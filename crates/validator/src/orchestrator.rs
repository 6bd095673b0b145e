use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;

use sqlguard_ast::{parse, SqlContext, SqlDialect, ValidationResult};
use sqlguard_audit::fingerprint;
use sqlguard_observability::Metrics;
use sqlguard_rules::RuleCatalogue;

thread_local! {
    static DEDUP_CACHE: RefCell<LruCache<String, (Instant, ValidationResult)>> =
        RefCell::new(LruCache::new(NonZeroUsize::new(1024).unwrap()));
}

/// Implements spec.md §4.3 steps 1-4: parse-once, run the rule catalogue,
/// aggregate into one `ValidationResult`, and serve repeat calls for the
/// same SQL text from a bounded per-thread dedup cache. `ctx` is taken
/// `&mut` only to populate its `parsed` slot via `SqlContext::set_parsed`
/// (which panics on a second call) — validation itself never mutates
/// anything else on the context.
pub struct ValidationOrchestrator {
    catalogue: RuleCatalogue,
    dialect: SqlDialect,
    dedup_ttl: Duration,
    metrics: Arc<Metrics>,
}

impl ValidationOrchestrator {
    pub fn new(catalogue: RuleCatalogue, dialect: SqlDialect, dedup_ttl: Duration, metrics: Arc<Metrics>) -> Self {
        Self { catalogue, dialect, dedup_ttl, metrics }
    }

    pub fn validate(&self, ctx: &mut SqlContext) -> ValidationResult {
        self.metrics.validate_calls_total.inc();

        let fp = fingerprint(ctx.raw_sql());
        if let Some(cached) = self.cache_lookup(&fp) {
            self.metrics.dedup_hits_total.inc();
            return cached;
        }

        if ctx.has_parsed() {
            self.metrics.preparsed_contexts_total.inc();
        } else {
            self.metrics.parse_calls_total.inc();
            match parse(ctx.raw_sql(), self.dialect) {
                Ok(parsed) => ctx.set_parsed(parsed),
                Err(_) => {
                    // Parse failure is a single HIGH violation, never fatal
                    // (spec §7) — the catalogue never runs against a
                    // statement it cannot see into, but the call is not
                    // treated as worse than any other single HIGH finding.
                    let mut result = ValidationResult::new();
                    result.add_violation(sqlguard_ast::ViolationInfo::new(
                        sqlguard_ast::RiskLevel::High,
                        "SQL text could not be parsed",
                    ));
                    self.cache_store(fp, result.clone());
                    return result;
                }
            }
        }

        let parsed = ctx.parsed().expect("just set or already present").clone();
        let mut result = ValidationResult::new();
        for (id, violations) in self.catalogue.run(&parsed, ctx) {
            self.metrics.checker_invocations_total.with_label_values(&[id]).inc();
            for violation in &violations {
                self.metrics
                    .checker_violations_total
                    .with_label_values(&[id, violation.risk_level.as_str()])
                    .inc();
            }
            result.extend(violations);
        }

        self.cache_store(fp, result.clone());
        result
    }

    fn cache_lookup(&self, fp: &str) -> Option<ValidationResult> {
        DEDUP_CACHE.with(|cache| {
            let mut cache = cache.borrow_mut();
            match cache.get(fp) {
                Some((inserted_at, result)) if inserted_at.elapsed() < self.dedup_ttl => Some(result.clone()),
                Some(_) => {
                    cache.pop(fp);
                    None
                }
                None => None,
            }
        })
    }

    fn cache_store(&self, fp: String, result: ValidationResult) {
        DEDUP_CACHE.with(|cache| {
            cache.borrow_mut().put(fp, (Instant::now(), result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{CommandType, ExecutionLayer};
    use sqlguard_rules::{default_checkers, RulesConfig};

    fn orchestrator(ttl: Duration) -> ValidationOrchestrator {
        let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
        ValidationOrchestrator::new(catalogue, SqlDialect::Generic, ttl, Arc::new(Metrics::new()))
    }

    #[test]
    fn parse_once_invariant_holds_across_repeated_validation() {
        let orchestrator = orchestrator(Duration::from_secs(60));
        let mut ctx = SqlContext::new("SELECT * FROM orders WHERE id = 1", CommandType::Select, ExecutionLayer::Mybatis);
        orchestrator.validate(&mut ctx);
        assert!(ctx.has_parsed());
        // Re-running validate on the same ctx must not attempt to re-parse
        // (set_parsed would panic on a second call).
        orchestrator.validate(&mut ctx);
    }

    #[test]
    fn missing_where_delete_is_flagged_critical() {
        let orchestrator = orchestrator(Duration::from_secs(60));
        let mut ctx = SqlContext::new("DELETE FROM orders", CommandType::Delete, ExecutionLayer::Mybatis);
        let result = orchestrator.validate(&mut ctx);
        assert!(!result.passed());
        assert_eq!(result.risk_level(), sqlguard_ast::RiskLevel::Critical);
    }

    #[test]
    fn unparseable_sql_is_a_high_violation_and_does_not_panic() {
        let orchestrator = orchestrator(Duration::from_secs(60));
        let mut ctx = SqlContext::new("", CommandType::Unknown, ExecutionLayer::Unknown);
        let result = orchestrator.validate(&mut ctx);
        assert_eq!(result.risk_level(), sqlguard_ast::RiskLevel::High);
    }

    #[test]
    fn dedup_cache_serves_repeated_identical_sql_from_a_fresh_context() {
        let orchestrator = orchestrator(Duration::from_secs(60));
        let sql = "DELETE FROM orders WHERE id = 1";
        let mut first = SqlContext::new(sql, CommandType::Delete, ExecutionLayer::Mybatis);
        let r1 = orchestrator.validate(&mut first);

        let mut second = SqlContext::new(sql, CommandType::Delete, ExecutionLayer::Mybatis);
        let r2 = orchestrator.validate(&mut second);
        assert_eq!(r1.risk_level(), r2.risk_level());
        assert!(!second.has_parsed(), "a dedup hit must short-circuit before parsing");
    }
}
