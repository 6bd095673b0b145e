use std::sync::Arc;

use sqlguard_ast::{ParsedStatement, RiskLevel, SqlContext, StatementKind, ViolationInfo};

use crate::config::RulesConfig;
use crate::Checker;

const DDL_KEYWORDS: &[&str] = &["CREATE", "ALTER", "DROP", "TRUNCATE", "RENAME"];

/// A DDL statement (`CREATE`/`ALTER`/`DROP`/`TRUNCATE`/`RENAME`) reaching the
/// interceptor — schema changes almost never belong on the DML hot path this
/// layer guards. Minimum risk CRITICAL.
pub struct DdlOperation;

impl Checker for DdlOperation {
    fn id(&self) -> &'static str {
        "DANGER001_DDL_OPERATION"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        if let StatementKind::Other(name) = &stmt.kind {
            if DDL_KEYWORDS.contains(&name.as_str()) {
                return vec![ViolationInfo::new(RiskLevel::Critical, format!("{name} is a DDL operation"))
                    .with_suggestion("run schema changes through a migration tool, not application SQL")];
            }
        }
        Vec::new()
    }
}

/// Use of a configured dangerous function (`SLEEP`, `BENCHMARK`,
/// `LOAD_FILE`, `xp_cmdshell`, ...) — time-based blind injection probes and
/// server-side file/command access. Minimum risk CRITICAL.
pub struct DangerousFunction {
    config: Arc<RulesConfig>,
}

impl DangerousFunction {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for DangerousFunction {
    fn id(&self) -> &'static str {
        "DANGER002_DANGEROUS_FUNCTION"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let upper = stmt.raw_sql.to_uppercase();
        for func in &self.config.dangerous_functions {
            if upper.contains(&format!("{}(", func.to_uppercase())) || upper.contains(&func.to_uppercase()) {
                return vec![ViolationInfo::new(RiskLevel::Critical, format!("statement references dangerous function '{func}'"))
                    .with_suggestion("remove this function call or move it behind an authorized admin path")];
            }
        }
        Vec::new()
    }
}

/// A stored procedure/function invocation (`CALL ...`) — opaque to static
/// analysis, so it is flagged rather than silently passed. Minimum risk
/// HIGH.
pub struct CallStatement;

impl Checker for CallStatement {
    fn id(&self) -> &'static str {
        "DANGER003_CALL_STATEMENT"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        match &stmt.called_procedure {
            Some(proc) => vec![ViolationInfo::new(RiskLevel::High, format!("calls stored procedure '{proc}'"))
                .with_suggestion("review the procedure body separately; static analysis cannot see inside it")],
            None => Vec::new(),
        }
    }
}
