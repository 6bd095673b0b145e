use std::cell::RefCell;
use std::sync::Arc;

use sqlguard_ast::{SqlContext, ValidationResult};
use sqlguard_validator::ValidationOrchestrator;

use crate::chain::{set_block_reason, BlockError};
use crate::strategy::ValidationStrategy;
use crate::InnerInterceptor;

thread_local! {
    /// The most recent `ValidationResult` produced on this thread, read and
    /// cleared by `OuterInterceptor::execute` when it builds the
    /// `AuditEvent` for the current invocation.
    static LAST_VALIDATION_RESULT: RefCell<Option<ValidationResult>> = RefCell::new(None);
}

/// Takes (and clears) the last validation result recorded on this thread.
pub fn take_last_validation_result() -> Option<ValidationResult> {
    LAST_VALIDATION_RESULT.with(|cell| cell.borrow_mut().take())
}

/// Priority-10 check interceptor: bridges the chain to the validation
/// orchestrator (§4.3) and turns its outcome into chain behavior per the
/// active `ValidationStrategy` (§7).
pub struct CheckInterceptor {
    orchestrator: Arc<ValidationOrchestrator>,
    strategy: ValidationStrategy,
}

impl CheckInterceptor {
    pub fn new(orchestrator: Arc<ValidationOrchestrator>, strategy: ValidationStrategy) -> Self {
        Self { orchestrator, strategy }
    }

    fn evaluate(&self, ctx: &mut SqlContext) -> bool {
        let result = self.orchestrator.validate(ctx);
        let proceed = match self.strategy {
            ValidationStrategy::Log => true,
            ValidationStrategy::Warn => {
                if !result.passed() {
                    if let Some(v) = result.highest_severity_violation() {
                        tracing::warn!(risk_level = ?v.risk_level, message = %v.message, "SQL validation violation");
                    }
                }
                true
            }
            ValidationStrategy::Block => {
                if result.passed() {
                    true
                } else {
                    let violation = result.highest_severity_violation().expect("failed result always has a violation");
                    set_block_reason(BlockError::from_violation(violation, ctx.statement_id.clone(), ctx.raw_sql()));
                    false
                }
            }
        };
        LAST_VALIDATION_RESULT.with(|cell| *cell.borrow_mut() = Some(result));
        proceed
    }
}

impl InnerInterceptor for CheckInterceptor {
    fn priority(&self) -> u32 {
        10
    }

    fn will_do_query(&self, ctx: &mut SqlContext) -> bool {
        self.evaluate(ctx)
    }

    fn will_do_update(&self, ctx: &mut SqlContext) -> bool {
        self.evaluate(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{CommandType, ExecutionLayer, SqlDialect};
    use sqlguard_observability::Metrics;
    use sqlguard_rules::{default_checkers, RuleCatalogue, RulesConfig};
    use std::time::Duration;

    fn orchestrator() -> Arc<ValidationOrchestrator> {
        let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
        Arc::new(ValidationOrchestrator::new(catalogue, SqlDialect::Generic, Duration::from_secs(60), Arc::new(Metrics::new())))
    }

    #[test]
    fn log_strategy_always_proceeds() {
        let interceptor = CheckInterceptor::new(orchestrator(), ValidationStrategy::Log);
        let mut ctx = SqlContext::new("DELETE FROM orders", CommandType::Delete, ExecutionLayer::Mybatis);
        assert!(interceptor.will_do_update(&mut ctx));
        assert!(take_last_validation_result().is_some());
    }

    #[test]
    fn block_strategy_short_circuits_on_a_critical_violation() {
        let interceptor = CheckInterceptor::new(orchestrator(), ValidationStrategy::Block);
        let mut ctx = SqlContext::new("DELETE FROM orders", CommandType::Delete, ExecutionLayer::Mybatis);
        assert!(!interceptor.will_do_update(&mut ctx));
    }

    #[test]
    fn block_strategy_proceeds_on_a_clean_statement() {
        let interceptor = CheckInterceptor::new(orchestrator(), ValidationStrategy::Block);
        let mut ctx = SqlContext::new("DELETE FROM orders WHERE id = 1", CommandType::Delete, ExecutionLayer::Mybatis);
        assert!(interceptor.will_do_update(&mut ctx));
    }
}
