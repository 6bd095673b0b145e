use std::cell::RefCell;

use sqlguard_ast::{RiskLevel, SqlContext, ViolationInfo};

use crate::inner::InnerInterceptor;

thread_local! {
    /// Set by a check interceptor immediately before it returns `false` from
    /// `will_do_*` under the BLOCK strategy, and consumed by the chain right
    /// after. Always cleared, including on unwind, by `scopeguard` at every
    /// read site — never left set across invocations (spec §4.5 "thread-local
    /// ... must be cleared in a finally block").
    static BLOCK_REASON: RefCell<Option<BlockError>> = RefCell::new(None);
}

/// Sets the pending block reason for the current thread. Called only by
/// `CheckInterceptor`.
pub fn set_block_reason(err: BlockError) {
    BLOCK_REASON.with(|cell| *cell.borrow_mut() = Some(err));
}

fn take_block_reason() -> Option<BlockError> {
    BLOCK_REASON.with(|cell| cell.borrow_mut().take())
}

/// Surfaced to the host when the active strategy is BLOCK and a check
/// interceptor short-circuits the chain (spec §7): highest-severity
/// violation, statement id if known, and a truncated SQL snippet.
#[derive(Debug, Clone, thiserror::Error)]
#[error("blocked: {violation_message} (statement_id={statement_id:?}, sql={sql_snippet:?})")]
pub struct BlockError {
    pub violation_message: String,
    pub risk_level: RiskLevel,
    pub statement_id: Option<String>,
    pub sql_snippet: String,
}

impl BlockError {
    const SNIPPET_LEN: usize = 200;

    pub fn from_violation(violation: &ViolationInfo, statement_id: Option<String>, raw_sql: &str) -> Self {
        let sql_snippet = if raw_sql.len() > Self::SNIPPET_LEN {
            format!("{}...", &raw_sql[..Self::SNIPPET_LEN])
        } else {
            raw_sql.to_string()
        };
        Self {
            violation_message: violation.message.clone(),
            risk_level: violation.risk_level,
            statement_id,
            sql_snippet,
        }
    }
}

/// Operation kind a chain invocation is running for — query path (`SELECT`)
/// vs. update path (`UPDATE`/`DELETE`/`INSERT`), each with its own pair of
/// hooks per spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Update,
}

/// Owns inner interceptors sorted ascending by priority, maintained at
/// registration time (`register` runs an insertion sort) since registration
/// is a cold path and chains are short.
pub struct InterceptorChain {
    interceptors: Vec<Box<dyn InnerInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self { interceptors: Vec::new() }
    }

    pub fn register(&mut self, interceptor: Box<dyn InnerInterceptor>) {
        let priority = interceptor.priority();
        let pos = self.interceptors.partition_point(|i| i.priority() <= priority);
        self.interceptors.insert(pos, interceptor);
    }

    pub fn interceptors(&self) -> &[Box<dyn InnerInterceptor>] {
        &self.interceptors
    }

    pub fn run(&self, operation: Operation, ctx: &mut SqlContext) -> Result<String, BlockError> {
        // Guarantees BLOCK_REASON never leaks into the next invocation on
        // this thread even if an interceptor panics mid-chain (spec §4.5:
        // thread-locals "must be cleared in a finally block").
        let _cleanup = scopeguard::guard((), |_| {
            take_block_reason();
        });
        let mut sql = ctx.raw_sql().to_string();
        for interceptor in &self.interceptors {
            let proceed = match operation {
                Operation::Query => interceptor.will_do_query(ctx),
                Operation::Update => interceptor.will_do_update(ctx),
            };
            if !proceed {
                return Err(take_block_reason().unwrap_or_else(|| BlockError {
                    violation_message: "blocked by interceptor chain".to_string(),
                    risk_level: RiskLevel::Critical,
                    statement_id: ctx.statement_id.clone(),
                    sql_snippet: sql.clone(),
                }));
            }
            sql = match operation {
                Operation::Query => interceptor.before_query(sql, ctx),
                Operation::Update => interceptor.before_update(sql, ctx),
            };
        }
        Ok(sql)
    }
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{CommandType, ExecutionLayer};

    struct Noop(u32);
    impl InnerInterceptor for Noop {
        fn priority(&self) -> u32 {
            self.0
        }
    }

    struct AlwaysBlocks;
    impl InnerInterceptor for AlwaysBlocks {
        fn priority(&self) -> u32 {
            10
        }
        fn will_do_query(&self, _ctx: &mut SqlContext) -> bool {
            false
        }
    }

    #[test]
    fn interceptors_run_in_ascending_priority_order() {
        let mut chain = InterceptorChain::new();
        chain.register(Box::new(Noop(200)));
        chain.register(Box::new(Noop(10)));
        chain.register(Box::new(Noop(100)));
        let priorities: Vec<u32> = chain.interceptors().iter().map(|i| i.priority()).collect();
        assert_eq!(priorities, vec![10, 100, 200]);
    }

    #[test]
    fn a_false_will_do_query_short_circuits_and_produces_a_block_error() {
        let mut chain = InterceptorChain::new();
        chain.register(Box::new(AlwaysBlocks));
        chain.register(Box::new(Noop(200)));
        let mut ctx = SqlContext::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc);
        assert!(chain.run(Operation::Query, &mut ctx).is_err());
    }

    #[test]
    fn with_no_blockers_the_chain_proceeds() {
        let mut chain = InterceptorChain::new();
        chain.register(Box::new(Noop(10)));
        let mut ctx = SqlContext::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc);
        assert_eq!(chain.run(Operation::Query, &mut ctx).unwrap(), "SELECT 1");
    }

    struct Panics;
    impl InnerInterceptor for Panics {
        fn priority(&self) -> u32 {
            10
        }
        fn will_do_query(&self, _ctx: &mut SqlContext) -> bool {
            set_block_reason(BlockError {
                violation_message: "about to panic".to_string(),
                risk_level: RiskLevel::Critical,
                statement_id: None,
                sql_snippet: String::new(),
            });
            panic!("simulated interceptor panic");
        }
    }

    #[test]
    fn block_reason_does_not_leak_across_invocations_when_an_interceptor_panics() {
        let mut chain = InterceptorChain::new();
        chain.register(Box::new(Panics));
        let mut ctx = SqlContext::new("SELECT 1", CommandType::Select, ExecutionLayer::Jdbc);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| chain.run(Operation::Query, &mut ctx)));
        assert!(result.is_err());
        assert!(take_block_reason().is_none());
    }
}
