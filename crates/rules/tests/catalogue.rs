use std::sync::Arc;

use sqlguard_ast::{parse, CommandType, ExecutionLayer, RiskLevel, SqlContext, SqlDialect};
use sqlguard_rules::{default_checkers, RuleCatalogue, RulesConfig};

fn worst_risk(results: &[(&'static str, Vec<sqlguard_ast::ViolationInfo>)]) -> RiskLevel {
    results
        .iter()
        .flat_map(|(_, v)| v.iter())
        .map(|v| v.risk_level)
        .max()
        .unwrap_or(RiskLevel::Safe)
}

#[test]
fn unconditional_delete_is_critical() {
    let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
    let sql = "DELETE FROM orders";
    let stmt = parse(sql, SqlDialect::Generic).unwrap();
    let ctx = SqlContext::new(sql, CommandType::Delete, ExecutionLayer::Mybatis);

    let results = catalogue.run(&stmt, &ctx);
    assert_eq!(worst_risk(&results), RiskLevel::Critical);
}

#[test]
fn unbounded_select_over_a_table_without_filter_is_critical() {
    let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
    let sql = "SELECT * FROM customers";
    let stmt = parse(sql, SqlDialect::Generic).unwrap();
    let ctx = SqlContext::new(sql, CommandType::Select, ExecutionLayer::Mybatis);

    let results = catalogue.run(&stmt, &ctx);
    assert_eq!(worst_risk(&results), RiskLevel::Critical);
}

#[test]
fn stacked_statements_are_critical_regardless_of_content() {
    let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
    let sql = "SELECT 1; SELECT 2";
    let stmt = parse(sql, SqlDialect::Generic).unwrap();
    let ctx = SqlContext::new(sql, CommandType::Select, ExecutionLayer::Jdbc);

    let results = catalogue.run(&stmt, &ctx);
    assert_eq!(worst_risk(&results), RiskLevel::Critical);
}

#[test]
fn unique_key_equality_escapes_the_pagination_checks() {
    let mut unique = std::collections::HashMap::new();
    unique.insert("orders".to_string(), vec!["id".to_string()]);
    let config = Arc::new(RulesConfig { unique_key_columns: unique, ..Default::default() });
    let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);

    let sql = "SELECT * FROM orders WHERE id = 42";
    let stmt = parse(sql, SqlDialect::Generic).unwrap();
    let ctx = SqlContext::new(sql, CommandType::Select, ExecutionLayer::Mybatis);

    let results = catalogue.run(&stmt, &ctx);
    let flagged: Vec<_> = results.into_iter().filter(|(_, v)| !v.is_empty()).collect();
    assert!(flagged.is_empty(), "unique-key lookup should bypass pagination checks, got {flagged:?}");
}

#[test]
fn deny_listed_table_is_flagged_even_on_a_well_formed_query() {
    let config = Arc::new(RulesConfig { denied_tables: vec!["payment_cards".into()], ..Default::default() });
    let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);

    let sql = "SELECT card_number FROM payment_cards WHERE id = 1";
    let stmt = parse(sql, SqlDialect::Generic).unwrap();
    let ctx = SqlContext::new(sql, CommandType::Select, ExecutionLayer::Mybatis);

    let results = catalogue.run(&stmt, &ctx);
    assert!(results.iter().any(|(id, v)| *id == "ACCESS003_DENIED_TABLE" && !v.is_empty()));
}
