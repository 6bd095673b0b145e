use sqlguard_ast::Expr;
use sqlparser::ast::BinaryOperator;

/// True if `expr` is an AND-only conjunction of equality comparisons, each
/// comparing one of `unique_columns` against a literal/bound value. A single
/// OR anywhere in the tree, or any comparison that is not a plain equality
/// on an allowed column, disqualifies the whole expression (spec §4.2:
/// "equality on a configured unique key column (AND-joined only)").
pub fn is_unique_key_equality(expr: &Expr, unique_columns: &[String]) -> bool {
    match expr {
        Expr::BinaryOp { left, op: BinaryOperator::And, right } => {
            is_unique_key_equality(left, unique_columns) && is_unique_key_equality(right, unique_columns)
        }
        Expr::BinaryOp { left, op: BinaryOperator::Eq, right } => {
            column_name(left).map(|c| matches_column(&c, unique_columns)).unwrap_or(false)
                || column_name(right).map(|c| matches_column(&c, unique_columns)).unwrap_or(false)
        }
        Expr::Nested(inner) => is_unique_key_equality(inner, unique_columns),
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

fn matches_column(name: &str, unique_columns: &[String]) -> bool {
    unique_columns.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// True if `table` matches an exact entry, a `prefix_*` glob, or a regex-like
/// mapper-id pattern in `patterns` (spec §4.2 escape hatches / §6
/// `tableWhitelist` / `mapperIdWhitelistPatterns`).
pub fn is_whitelisted(table: &str, statement_id: Option<&str>, table_patterns: &[String], mapper_id_patterns: &[String]) -> bool {
    for pattern in table_patterns {
        if matches_glob(table, pattern) {
            return true;
        }
    }
    if let Some(id) = statement_id {
        for pattern in mapper_id_patterns {
            if matches_glob(id, pattern) {
                return true;
            }
        }
    }
    false
}

fn matches_glob(value: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value.eq_ignore_ascii_case(pattern),
    }
}
