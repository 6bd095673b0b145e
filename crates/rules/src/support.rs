use sqlguard_ast::Expr;
use sqlparser::ast::{BinaryOperator, Value};

/// Finds a tautological comparison (`1=1`, `'a'='a'`, a bare `TRUE`)
/// anywhere in the expression tree. Dummy conditions are almost always
/// appended with `AND`/`OR`, so this walks the whole tree rather than
/// requiring the entire WHERE clause to be the tautology.
pub fn contains_tautology(expr: &Expr) -> bool {
    match expr {
        Expr::Value(Value::Boolean(true)) => true,
        Expr::BinaryOp { left, op: BinaryOperator::Eq, right } => {
            literal_text(left).map(|l| Some(l) == literal_text(right)).unwrap_or(false)
        }
        Expr::BinaryOp { left, op: BinaryOperator::And | BinaryOperator::Or, right } => {
            contains_tautology(left) || contains_tautology(right)
        }
        Expr::Nested(inner) => contains_tautology(inner),
        _ => false,
    }
}

fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::Number(n, _)) => Some(n.clone()),
        Expr::Value(Value::SingleQuotedString(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Every column name that appears as either side of an equality comparison
/// anywhere in the expression tree, regardless of AND/OR combinator —
/// whitelist/blacklist field checks care whether a column was referenced at
/// all, not how it was combined with other predicates.
pub fn collect_equality_columns(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::BinaryOp { left, op: BinaryOperator::Eq, right } => {
            if let Some(c) = column_name(left) {
                out.push(c);
            }
            if let Some(c) = column_name(right) {
                out.push(c);
            }
        }
        Expr::BinaryOp { left, op: BinaryOperator::And | BinaryOperator::Or, right } => {
            collect_equality_columns(left, out);
            collect_equality_columns(right, out);
        }
        Expr::Nested(inner) => collect_equality_columns(inner, out),
        Expr::InList { expr: inner, .. } => {
            if let Some(c) = column_name(inner) {
                out.push(c);
            }
        }
        _ => {}
    }
}

/// True if the whole expression is a single equality/IN/LIKE comparison on
/// `column` with nothing else ANDed/ORed alongside it — "present alone in
/// WHERE" (spec §4.2 BlacklistField).
pub fn is_sole_predicate_on(expr: &Expr, column: &str) -> bool {
    match expr {
        Expr::BinaryOp { left, op: BinaryOperator::Eq | BinaryOperator::Like, right } => {
            column_name(left).as_deref() == Some(column) || column_name(right).as_deref() == Some(column)
        }
        Expr::InList { expr: inner, .. } => column_name(inner).as_deref() == Some(column),
        Expr::Nested(inner) => is_sole_predicate_on(inner, column),
        _ => false,
    }
}

fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|p| p.value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{parse, SqlDialect, StatementKind};

    fn selection(sql: &str) -> Expr {
        let parsed = parse(sql, SqlDialect::Generic).unwrap();
        match parsed.kind {
            StatementKind::Select(s) => s.selection.unwrap(),
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn detects_classic_1_eq_1() {
        assert!(contains_tautology(&selection("SELECT * FROM t WHERE 1=1")));
    }

    #[test]
    fn detects_bare_true() {
        assert!(contains_tautology(&selection("SELECT * FROM t WHERE TRUE")));
    }

    #[test]
    fn does_not_flag_real_predicate() {
        assert!(!contains_tautology(&selection("SELECT * FROM t WHERE id = 5")));
    }

    #[test]
    fn sole_predicate_detection() {
        assert!(is_sole_predicate_on(&selection("SELECT * FROM t WHERE status = 'active'"), "status"));
        assert!(!is_sole_predicate_on(
            &selection("SELECT * FROM t WHERE status = 'active' AND id = 1"),
            "status"
        ));
    }
}
