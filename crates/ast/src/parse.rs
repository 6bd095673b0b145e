use sqlparser::ast::{
    Expr, FromTable, ObjectName, OrderByExpr, Select, SelectItem, SetExpr, Statement, TableFactor,
    TableWithJoins, Value,
};
use sqlparser::parser::{Parser, ParserError};
use thiserror::Error;

use crate::dialect::SqlDialect;
use crate::model::{
    DeleteStatement, InsertStatement, PaginationClause, PaginationKind, SelectStatement,
    StatementKind, TableRef, UpdateStatement,
};
use crate::ParsedStatement;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty SQL text")]
    Empty,
    #[error("unparseable SQL: {0}")]
    Syntax(#[from] ParserError),
}

/// The single parse entry point for the whole workspace (spec §4.1a / §4.3's
/// parse-once invariant). Parses `sql` under `dialect`, returning a typed
/// view of the first statement. If `sql` contains more than one statement,
/// `multi_statement` is set and the remaining statements are discarded —
/// callers that need every statement should split `sql` themselves first.
pub fn parse(sql: &str, dialect: SqlDialect) -> Result<ParsedStatement, ParseError> {
    if sql.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let dialect_impl = dialect.as_dialect();
    let statements = Parser::parse_sql(dialect_impl.as_ref(), sql)?;
    let multi_statement = statements.len() > 1;
    let first = statements.first().ok_or(ParseError::Empty)?;
    let kind = classify(first);
    let called_procedure = match first {
        Statement::Call(func) => Some(func.name.to_string()),
        _ => None,
    };
    Ok(ParsedStatement {
        raw_sql: sql.to_string(),
        comment_tokens: extract_comment_tokens(sql),
        multi_statement,
        called_procedure,
        kind,
    })
}

fn extract_comment_tokens(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'-' && i + 1 < bytes.len() && bytes[i + 1] == b'-' {
            let end = sql[i..].find('\n').map(|o| i + o).unwrap_or(sql.len());
            tokens.push(sql[i..end].to_string());
            i = end;
        } else if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            let end = sql[i..].find("*/").map(|o| i + o + 2).unwrap_or(sql.len());
            tokens.push(sql[i..end].to_string());
            i = end;
        } else {
            i += 1;
        }
    }
    tokens
}

fn table_ref_from_object_name(name: &ObjectName, alias: Option<String>) -> TableRef {
    TableRef {
        name: name.to_string(),
        alias,
    }
}

fn tables_from_twj(twj: &[TableWithJoins]) -> Vec<TableRef> {
    let mut out = Vec::new();
    for t in twj {
        out.extend(table_factor_refs(&t.relation));
        for j in &t.joins {
            out.extend(table_factor_refs(&j.relation));
        }
    }
    out
}

fn table_factor_refs(factor: &TableFactor) -> Vec<TableRef> {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            vec![table_ref_from_object_name(name, alias.as_ref().map(|a| a.name.to_string()))]
        }
        TableFactor::Derived { alias, .. } => alias
            .as_ref()
            .map(|a| TableRef { name: a.name.to_string(), alias: None })
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn order_by_text(order_by: &[OrderByExpr]) -> Vec<String> {
    order_by.iter().map(|o| o.expr.to_string()).collect()
}

fn pagination_from_query(
    limit: &Option<Expr>,
    offset_expr: &Option<sqlparser::ast::Offset>,
    fetch: &Option<sqlparser::ast::Fetch>,
) -> Option<PaginationClause> {
    if let Some(limit_expr) = limit {
        return Some(PaginationClause {
            kind: PaginationKind::Limit,
            limit: expr_as_i64(limit_expr),
            offset: offset_expr.as_ref().and_then(|o| expr_as_i64(&o.value)),
        });
    }
    if let Some(f) = fetch {
        return Some(PaginationClause {
            kind: PaginationKind::FetchFirst,
            limit: f.quantity.as_ref().and_then(expr_as_i64),
            offset: offset_expr.as_ref().and_then(|o| expr_as_i64(&o.value)),
        });
    }
    None
}

fn expr_as_i64(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Value(Value::Number(n, _)) => n.parse().ok(),
        Expr::UnaryOp { expr, .. } => expr_as_i64(expr),
        _ => None,
    }
}

fn projection_text(items: &[SelectItem]) -> Vec<String> {
    items.iter().map(|i| i.to_string()).collect()
}

fn select_from_select(sel: &Select, is_set_operation: bool) -> SelectStatement {
    SelectStatement {
        tables: tables_from_twj(&sel.from),
        projection: projection_text(&sel.projection),
        selection: sel.selection.clone(),
        order_by: Vec::new(),
        pagination: None,
        is_set_operation,
        distinct: sel.distinct.is_some(),
    }
}

fn classify(stmt: &Statement) -> StatementKind {
    match stmt {
        Statement::Query(query) => {
            let (mut select, top_level_set_op) = match query.body.as_ref() {
                SetExpr::Select(sel) => (select_from_select(sel, false), false),
                SetExpr::SetOperation { left, .. } => {
                    let leftmost = leftmost_select(left);
                    (
                        leftmost
                            .map(|s| select_from_select(s, true))
                            .unwrap_or_else(|| SelectStatement {
                                tables: Vec::new(),
                                projection: Vec::new(),
                                selection: None,
                                order_by: Vec::new(),
                                pagination: None,
                                is_set_operation: true,
                                distinct: false,
                            }),
                        true,
                    )
                }
                _ => (
                    SelectStatement {
                        tables: Vec::new(),
                        projection: Vec::new(),
                        selection: None,
                        order_by: Vec::new(),
                        pagination: None,
                        is_set_operation: false,
                        distinct: false,
                    },
                    false,
                ),
            };
            select.is_set_operation = select.is_set_operation || top_level_set_op;
            select.order_by = order_by_text(&query.order_by);
            select.pagination = pagination_from_query(&query.limit, &query.offset, &query.fetch);
            StatementKind::Select(select)
        }
        Statement::Update { table, assignments, selection, .. } => StatementKind::Update(UpdateStatement {
            tables: tables_from_twj(std::slice::from_ref(table)),
            assignments: assignments.iter().map(|a| a.to_string()).collect(),
            selection: selection.clone(),
        }),
        Statement::Delete { tables, from, selection, .. } => {
            let from_tables = match from {
                FromTable::WithFromKeyword(twj) | FromTable::WithoutKeyword(twj) => tables_from_twj(twj),
            };
            let named_tables: Vec<TableRef> = tables
                .iter()
                .map(|n| table_ref_from_object_name(n, None))
                .collect();
            let resolved = if named_tables.is_empty() { from_tables } else { named_tables };
            StatementKind::Delete(DeleteStatement {
                tables: resolved,
                selection: selection.clone(),
            })
        }
        Statement::Insert { table_name, columns, .. } => StatementKind::Insert(InsertStatement {
            table: table_ref_from_object_name(table_name, None),
            columns: columns.iter().map(|c| c.value.clone()).collect(),
        }),
        other => StatementKind::Other(statement_kind_name(other)),
    }
}

fn leftmost_select(expr: &SetExpr) -> Option<&Select> {
    match expr {
        SetExpr::Select(sel) => Some(sel.as_ref()),
        SetExpr::SetOperation { left, .. } => leftmost_select(left),
        _ => None,
    }
}

fn statement_kind_name(stmt: &Statement) -> String {
    // sqlparser statements implement Display; take the first word as a
    // coarse kind label ("CREATE", "ALTER", "SET", "CALL", ...).
    stmt.to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}
