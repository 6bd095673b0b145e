use sqlguard_ast::{ParsedStatement, RiskLevel, SqlContext, StatementKind, ViolationInfo};

use crate::Checker;

/// More than one statement separated by `;` in a single execution — a
/// classic stacked-query injection shape. Minimum risk CRITICAL.
pub struct MultiStatement;

impl Checker for MultiStatement {
    fn id(&self) -> &'static str {
        "INJ001_MULTI_STATEMENT"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        if stmt.multi_statement {
            vec![ViolationInfo::new(RiskLevel::Critical, "multiple statements in a single execution")
                .with_suggestion("execute one statement per call; never build multi-statement SQL from user input")]
        } else {
            Vec::new()
        }
    }
}

/// `UNION`/`INTERSECT`/`EXCEPT` combining a second, unrelated query onto the
/// intended one — the standard technique for exfiltrating data through an
/// injectable SELECT. Minimum risk HIGH.
pub struct SetOperation;

impl Checker for SetOperation {
    fn id(&self) -> &'static str {
        "INJ002_SET_OPERATION"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        if let StatementKind::Select(s) = &stmt.kind {
            if s.is_set_operation {
                return vec![ViolationInfo::new(RiskLevel::High, "query combines results via UNION/INTERSECT/EXCEPT")
                    .with_suggestion("verify this set operation is not attacker-controlled")];
            }
        }
        Vec::new()
    }
}

/// A `--` or `/* */` comment inside the statement text — often used to
/// truncate the query the application intended to run. Minimum risk HIGH.
pub struct SqlComment;

impl Checker for SqlComment {
    fn id(&self) -> &'static str {
        "INJ003_SQL_COMMENT"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        if stmt.comment_tokens.is_empty() {
            return Vec::new();
        }
        vec![ViolationInfo::new(
            RiskLevel::High,
            format!("statement contains {} inline comment token(s)", stmt.comment_tokens.len()),
        )
        .with_suggestion("strip comments from dynamically built SQL before execution")]
    }
}

/// `SELECT ... INTO OUTFILE`/`INTO DUMPFILE` — writes query results to the
/// filesystem of the database server. Minimum risk CRITICAL.
pub struct IntoOutfile;

impl Checker for IntoOutfile {
    fn id(&self) -> &'static str {
        "INJ004_INTO_OUTFILE"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let upper = stmt.raw_sql.to_uppercase();
        if upper.contains("INTO OUTFILE") || upper.contains("INTO DUMPFILE") {
            vec![ViolationInfo::new(RiskLevel::Critical, "query writes results to a server-side file")
                .with_suggestion("remove INTO OUTFILE/DUMPFILE; export data through the application layer")]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{parse, CommandType, ExecutionLayer, SqlDialect};

    fn ctx() -> SqlContext {
        SqlContext::new("x", CommandType::Select, ExecutionLayer::Jdbc)
    }

    #[test]
    fn multi_statement_flagged() {
        let stmt = parse("SELECT 1; DROP TABLE users", SqlDialect::Generic).unwrap();
        let v = MultiStatement.check(&stmt, &ctx());
        assert_eq!(v[0].risk_level, RiskLevel::Critical);
    }

    #[test]
    fn single_statement_passes() {
        let stmt = parse("SELECT 1", SqlDialect::Generic).unwrap();
        assert!(MultiStatement.check(&stmt, &ctx()).is_empty());
    }

    #[test]
    fn union_flagged() {
        let stmt = parse("SELECT id FROM users UNION SELECT password FROM admins", SqlDialect::Generic).unwrap();
        let v = SetOperation.check(&stmt, &ctx());
        assert_eq!(v[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn comment_token_flagged() {
        let stmt = parse("SELECT * FROM users -- WHERE id = 1", SqlDialect::Generic).unwrap();
        let v = SqlComment.check(&stmt, &ctx());
        assert_eq!(v[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn into_outfile_flagged() {
        let stmt = parse("SELECT * FROM users INTO OUTFILE '/tmp/x.csv'", SqlDialect::MySql).unwrap();
        let v = IntoOutfile.check(&stmt, &ctx());
        assert_eq!(v[0].risk_level, RiskLevel::Critical);
    }
}
