use std::sync::Arc;

use sqlguard_ast::{CommandType, ParsedStatement, RiskLevel, SqlContext, StatementKind, ViolationInfo};

use crate::config::RulesConfig;
use crate::Checker;

const METADATA_PREFIXES: &[&str] = &["information_schema.", "pg_catalog.", "sys.", "mysql."];

/// A query reading a system catalog/metadata table — normal for
/// introspection tooling, unusual for application traffic and a common
/// reconnaissance step ahead of an injection attack. Minimum risk HIGH.
pub struct MetadataStatement;

impl Checker for MetadataStatement {
    fn id(&self) -> &'static str {
        "ACCESS001_METADATA_STATEMENT"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let hit = stmt.tables().iter().any(|t| {
            let lower = t.name.to_lowercase();
            METADATA_PREFIXES.iter().any(|p| lower.starts_with(p))
        });
        if hit {
            vec![ViolationInfo::new(RiskLevel::High, "query reads a system catalog/metadata table")
                .with_suggestion("confirm this introspection query is expected from application traffic")]
        } else {
            Vec::new()
        }
    }
}

/// `SET` statements change session state (isolation level, search_path,
/// autocommit) for every subsequent statement on the connection. Minimum
/// risk MEDIUM.
pub struct SetStatement;

impl Checker for SetStatement {
    fn id(&self) -> &'static str {
        "ACCESS002_SET_STATEMENT"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        if let StatementKind::Other(name) = &stmt.kind {
            if name == "SET" {
                return vec![ViolationInfo::new(RiskLevel::Medium, "statement changes session-level state")
                    .with_suggestion("set session parameters at connection setup, not per-query")];
            }
        }
        Vec::new()
    }
}

/// A configured denied table — not allowed to appear in application SQL at
/// all, regardless of command type. Minimum risk CRITICAL.
pub struct DeniedTable {
    config: Arc<RulesConfig>,
}

impl DeniedTable {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for DeniedTable {
    fn id(&self) -> &'static str {
        "ACCESS003_DENIED_TABLE"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let mut violations = Vec::new();
        for table in stmt.tables() {
            if self.config.denied_tables.iter().any(|d| d.eq_ignore_ascii_case(&table.name)) {
                violations.push(
                    ViolationInfo::new(RiskLevel::Critical, format!("table '{}' is denied for application access", table.name))
                        .with_suggestion("remove this table from application-level SQL"),
                );
            }
        }
        violations
    }
}

/// A configured read-only table being targeted by a write (UPDATE/DELETE/
/// INSERT). Minimum risk HIGH.
pub struct ReadOnlyTable {
    config: Arc<RulesConfig>,
}

impl ReadOnlyTable {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for ReadOnlyTable {
    fn id(&self) -> &'static str {
        "ACCESS004_READ_ONLY_TABLE"
    }

    fn check(&self, stmt: &ParsedStatement, ctx: &SqlContext) -> Vec<ViolationInfo> {
        let is_write = matches!(ctx.command_type, CommandType::Update | CommandType::Delete | CommandType::Insert);
        if !is_write {
            return Vec::new();
        }
        let mut violations = Vec::new();
        for table in stmt.tables() {
            if self.config.read_only_tables.iter().any(|r| r.eq_ignore_ascii_case(&table.name)) {
                violations.push(
                    ViolationInfo::new(RiskLevel::High, format!("table '{}' is configured read-only", table.name))
                        .with_suggestion("writes to this table must go through its owning service"),
                );
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{parse, ExecutionLayer, SqlDialect};

    fn ctx(command_type: CommandType) -> SqlContext {
        SqlContext::new("x", command_type, ExecutionLayer::Jdbc)
    }

    #[test]
    fn information_schema_read_flagged() {
        let stmt = parse("SELECT * FROM information_schema.tables", SqlDialect::Generic).unwrap();
        let v = MetadataStatement.check(&stmt, &ctx(CommandType::Select));
        assert_eq!(v[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn ordinary_table_not_flagged() {
        let stmt = parse("SELECT * FROM orders", SqlDialect::Generic).unwrap();
        assert!(MetadataStatement.check(&stmt, &ctx(CommandType::Select)).is_empty());
    }

    #[test]
    fn set_statement_flagged() {
        let stmt = parse("SET SESSION TRANSACTION ISOLATION LEVEL SERIALIZABLE", SqlDialect::Generic).unwrap();
        let v = SetStatement.check(&stmt, &ctx(CommandType::Unknown));
        assert_eq!(v[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn denied_table_flagged() {
        let config = Arc::new(RulesConfig { denied_tables: vec!["secrets".into()], ..Default::default() });
        let stmt = parse("SELECT * FROM secrets", SqlDialect::Generic).unwrap();
        let v = DeniedTable::new(config).check(&stmt, &ctx(CommandType::Select));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn read_only_table_write_flagged() {
        let config = Arc::new(RulesConfig { read_only_tables: vec!["audit_log".into()], ..Default::default() });
        let stmt = parse("DELETE FROM audit_log WHERE id = 1", SqlDialect::Generic).unwrap();
        let v = ReadOnlyTable::new(config).check(&stmt, &ctx(CommandType::Delete));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn read_only_table_read_not_flagged() {
        let config = Arc::new(RulesConfig { read_only_tables: vec!["audit_log".into()], ..Default::default() });
        let stmt = parse("SELECT * FROM audit_log", SqlDialect::Generic).unwrap();
        assert!(ReadOnlyTable::new(config).check(&stmt, &ctx(CommandType::Select)).is_empty());
    }
}
