use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sqlguard_ast::{CommandType, ExecutionLayer, RiskLevel, SqlContext, SqlDialect};
use sqlguard_audit::{AuditEvent, AuditSink};
use sqlguard_interceptor::{
    CheckInterceptor, DriverOutcome, InterceptorChain, OuterInterceptor, SelectLimitFallback, ValidationStrategy,
};
use sqlguard_observability::Metrics;
use sqlguard_rules::{default_checkers, RuleCatalogue, RulesConfig};
use sqlguard_validator::ValidationOrchestrator;

#[derive(Default)]
struct CapturingSink {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditSink for CapturingSink {
    async fn emit(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn orchestrator() -> Arc<ValidationOrchestrator> {
    let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
    Arc::new(ValidationOrchestrator::new(catalogue, SqlDialect::Generic, Duration::from_secs(60), Arc::new(Metrics::new())))
}

fn chain_with(strategy: ValidationStrategy) -> InterceptorChain {
    let mut chain = InterceptorChain::new();
    chain.register(Box::new(CheckInterceptor::new(orchestrator(), strategy)));
    chain.register(Box::new(SelectLimitFallback::new(1000)));
    chain
}

async fn drain(sink: &Arc<CapturingSink>) -> Vec<AuditEvent> {
    tokio::time::sleep(Duration::from_millis(10)).await;
    sink.events.lock().unwrap().clone()
}

/// S1: UPDATE without WHERE under BLOCK never reaches the driver and still
/// produces exactly one AuditEvent carrying the violation.
#[tokio::test]
async fn s1_unconditional_update_is_blocked_before_the_driver_runs() {
    let chain = chain_with(ValidationStrategy::Block);
    let sink: Arc<CapturingSink> = Arc::new(CapturingSink::default());
    let outer = OuterInterceptor::new(chain, sink.clone());

    let mut ctx = SqlContext::new("UPDATE users SET active=0", CommandType::Update, ExecutionLayer::Mybatis);
    let driver_called = Arc::new(Mutex::new(false));
    let flag = driver_called.clone();
    let driver = move |_sql: &str, _params: &HashMap<String, serde_json::Value>| {
        *flag.lock().unwrap() = true;
        Ok(DriverOutcome { rows_affected: 1 })
    };

    let result = outer.execute(&mut ctx, &driver);
    assert!(result.is_err());
    assert!(!*driver_called.lock().unwrap());

    let events = drain(&sink).await;
    assert_eq!(events.len(), 1);
    assert!(events[0].error_message.is_some());
    assert_eq!(events[0].rows_affected, -1, "blocked statement never ran, rows_affected must be the N/A sentinel");
    assert_eq!(events[0].execution_time_ms, 0, "blocked statement never ran, execution_time_ms must be 0");
}

/// S2: tautological WHERE under LOG proceeds to the driver, but the audit
/// event still records the HIGH violation.
#[tokio::test]
async fn s2_tautological_where_under_log_proceeds_and_is_still_audited() {
    let chain = chain_with(ValidationStrategy::Log);
    let sink: Arc<CapturingSink> = Arc::new(CapturingSink::default());
    let outer = OuterInterceptor::new(chain, sink.clone());

    let mut ctx = SqlContext::new("SELECT * FROM users WHERE 1=1", CommandType::Select, ExecutionLayer::Jdbc);
    let driver = |_sql: &str, _params: &HashMap<String, serde_json::Value>| Ok(DriverOutcome { rows_affected: 3 });

    let result = outer.execute(&mut ctx, &driver);
    assert!(result.is_ok());

    let events = drain(&sink).await;
    assert_eq!(events.len(), 1);
    let summary = events[0].pre_validation_result.as_ref().expect("validated");
    assert!(!summary.passed);
    assert!(summary.risk_level >= RiskLevel::High);
}

/// S5: an unbounded SELECT under LOG is flagged, proceeds, and the fallback
/// rewriter appends the configured LIMIT before the driver ever sees the SQL.
#[tokio::test]
async fn s5_unbounded_select_is_flagged_and_rewritten_with_the_fallback_limit() {
    let chain = chain_with(ValidationStrategy::Log);
    let sink: Arc<CapturingSink> = Arc::new(CapturingSink::default());
    let outer = OuterInterceptor::new(chain, sink.clone());

    let mut ctx = SqlContext::new("SELECT * FROM users", CommandType::Select, ExecutionLayer::Jdbc);
    let seen_sql = Arc::new(Mutex::new(String::new()));
    let captured = seen_sql.clone();
    let driver = move |sql: &str, _params: &HashMap<String, serde_json::Value>| {
        *captured.lock().unwrap() = sql.to_string();
        Ok(DriverOutcome { rows_affected: 10 })
    };

    let result = outer.execute(&mut ctx, &driver);
    assert!(result.is_ok());
    assert_eq!(*seen_sql.lock().unwrap(), "SELECT * FROM users LIMIT 1000");

    let events = drain(&sink).await;
    assert_eq!(events.len(), 1);
    assert!(!events[0].pre_validation_result.as_ref().unwrap().passed);
}
