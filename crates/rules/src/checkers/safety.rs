use std::sync::Arc;

use sqlguard_ast::{ParsedStatement, RiskLevel, SqlContext, StatementKind, ViolationInfo};

use crate::config::RulesConfig;
use crate::support::{collect_equality_columns, contains_tautology, is_sole_predicate_on};
use crate::Checker;

/// UPDATE/DELETE without a WHERE clause — every row in the table is
/// affected. Minimum risk CRITICAL (spec §4.2).
pub struct MissingWhere;

impl Checker for MissingWhere {
    fn id(&self) -> &'static str {
        "SAFETY001_MISSING_WHERE"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let (kind, selection) = match &stmt.kind {
            StatementKind::Update(u) => ("UPDATE", &u.selection),
            StatementKind::Delete(d) => ("DELETE", &d.selection),
            _ => return Vec::new(),
        };
        if selection.is_none() {
            vec![ViolationInfo::new(RiskLevel::Critical, format!("{kind} without WHERE"))
                .with_suggestion("add a WHERE clause that targets the intended rows")]
        } else {
            Vec::new()
        }
    }
}

/// A tautological WHERE clause (`1=1`, `TRUE`) that defeats the point of
/// having one. Minimum risk HIGH.
pub struct DummyCondition;

impl Checker for DummyCondition {
    fn id(&self) -> &'static str {
        "SAFETY002_DUMMY_CONDITION"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        match stmt.selection() {
            Some(expr) if contains_tautology(expr) => {
                vec![ViolationInfo::new(RiskLevel::High, "WHERE clause contains a dummy/tautological condition")
                    .with_suggestion("replace the placeholder condition with a real predicate")]
            }
            _ => Vec::new(),
        }
    }
}

/// A configured blacklisted field (e.g. `status`) present alone in WHERE —
/// the predicate looks selective but matches almost every row in practice.
/// Minimum risk HIGH.
pub struct BlacklistField {
    config: Arc<RulesConfig>,
}

impl BlacklistField {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for BlacklistField {
    fn id(&self) -> &'static str {
        "SAFETY003_BLACKLIST_FIELD"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let Some(expr) = stmt.selection() else { return Vec::new() };
        for field in &self.config.blacklist_fields {
            if is_sole_predicate_on(expr, field) {
                return vec![ViolationInfo::new(
                    RiskLevel::High,
                    format!("WHERE clause filters only on blacklisted field '{field}'"),
                )
                .with_suggestion("add a more selective predicate alongside this field")];
            }
        }
        Vec::new()
    }
}

/// A table has configured required (whitelist) fields that must appear in
/// WHERE, and none of them do. Minimum risk HIGH.
pub struct WhitelistField {
    config: Arc<RulesConfig>,
}

impl WhitelistField {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for WhitelistField {
    fn id(&self) -> &'static str {
        "SAFETY004_WHITELIST_FIELD"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let mut violations = Vec::new();
        let mut present = Vec::new();
        if let Some(expr) = stmt.selection() {
            collect_equality_columns(expr, &mut present);
        }
        for table in stmt.tables() {
            let Some(required) = self.config.whitelist_fields.get(&table.name) else { continue };
            if required.is_empty() {
                continue;
            }
            let has_required = required.iter().any(|r| present.iter().any(|p| p.eq_ignore_ascii_case(r)));
            if !has_required {
                violations.push(
                    ViolationInfo::new(
                        RiskLevel::High,
                        format!("table '{}' requires one of {:?} in WHERE", table.name, required),
                    )
                    .with_suggestion("filter on one of the required fields for this table"),
                );
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{parse, CommandType, ExecutionLayer, SqlDialect};

    fn ctx() -> SqlContext {
        SqlContext::new("x", CommandType::Update, ExecutionLayer::Unknown)
    }

    #[test]
    fn missing_where_on_update_is_critical() {
        let stmt = parse("UPDATE users SET active=0", SqlDialect::Generic).unwrap();
        let v = MissingWhere.check(&stmt, &ctx());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].risk_level, RiskLevel::Critical);
    }

    #[test]
    fn missing_where_on_delete_is_critical() {
        let stmt = parse("DELETE FROM users", SqlDialect::Generic).unwrap();
        let v = MissingWhere.check(&stmt, &ctx());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].risk_level, RiskLevel::Critical);
    }

    #[test]
    fn update_with_where_passes() {
        let stmt = parse("UPDATE users SET active=0 WHERE id=1", SqlDialect::Generic).unwrap();
        assert!(MissingWhere.check(&stmt, &ctx()).is_empty());
    }

    #[test]
    fn dummy_condition_detected() {
        let stmt = parse("SELECT * FROM users WHERE 1=1", SqlDialect::Generic).unwrap();
        let v = DummyCondition.check(&stmt, &ctx());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn blacklist_field_alone_flagged() {
        let config = Arc::new(RulesConfig { blacklist_fields: vec!["status".into()], ..Default::default() });
        let stmt = parse("DELETE FROM users WHERE status = 'inactive'", SqlDialect::Generic).unwrap();
        let v = BlacklistField::new(config).check(&stmt, &ctx());
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn blacklist_field_combined_with_other_predicate_is_fine() {
        let config = Arc::new(RulesConfig { blacklist_fields: vec!["status".into()], ..Default::default() });
        let stmt = parse("DELETE FROM users WHERE status = 'inactive' AND id = 1", SqlDialect::Generic).unwrap();
        assert!(BlacklistField::new(config).check(&stmt, &ctx()).is_empty());
    }

    #[test]
    fn whitelist_field_missing_is_flagged() {
        let mut whitelist = std::collections::HashMap::new();
        whitelist.insert("orders".to_string(), vec!["tenant_id".to_string()]);
        let config = Arc::new(RulesConfig { whitelist_fields: whitelist, ..Default::default() });
        let stmt = parse("DELETE FROM orders WHERE id = 1", SqlDialect::Generic).unwrap();
        let v = WhitelistField::new(config).check(&stmt, &ctx());
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn whitelist_field_present_passes() {
        let mut whitelist = std::collections::HashMap::new();
        whitelist.insert("orders".to_string(), vec!["tenant_id".to_string()]);
        let config = Arc::new(RulesConfig { whitelist_fields: whitelist, ..Default::default() });
        let stmt = parse("DELETE FROM orders WHERE tenant_id = 9", SqlDialect::Generic).unwrap();
        assert!(WhitelistField::new(config).check(&stmt, &ctx()).is_empty());
    }
}
