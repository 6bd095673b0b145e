use sqlparser::ast::Expr;

/// One table reference as it appeared in the statement (`FROM`, `UPDATE ...`,
/// `DELETE FROM ...`, `INSERT INTO ...`, or a join arm).
#[derive(Debug, Clone)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationKind {
    Limit,
    Top,
    FetchFirst,
    Rownum,
}

#[derive(Debug, Clone)]
pub struct PaginationClause {
    pub kind: PaginationKind,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub tables: Vec<TableRef>,
    /// Textual projection list (`SELECT <this>`), kept as rendered source
    /// text rather than re-parsed — checkers that care about `SELECT *`
    /// just look for the literal `"*"` entry.
    pub projection: Vec<String>,
    pub selection: Option<Expr>,
    pub order_by: Vec<String>,
    pub pagination: Option<PaginationClause>,
    pub is_set_operation: bool,
    pub distinct: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub tables: Vec<TableRef>,
    pub assignments: Vec<String>,
    pub selection: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct DeleteStatement {
    pub tables: Vec<TableRef>,
    pub selection: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: TableRef,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Insert(InsertStatement),
    Other(String),
}

/// Typed, parse-once view of a single SQL statement. Shared fields live here
/// regardless of `kind`; variant-specific data lives in `kind`.
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub raw_sql: String,
    pub comment_tokens: Vec<String>,
    pub multi_statement: bool,
    pub called_procedure: Option<String>,
    pub kind: StatementKind,
}

impl ParsedStatement {
    pub fn is_select(&self) -> bool {
        matches!(self.kind, StatementKind::Select(_))
    }

    pub fn tables(&self) -> &[TableRef] {
        match &self.kind {
            StatementKind::Select(s) => &s.tables,
            StatementKind::Update(u) => &u.tables,
            StatementKind::Delete(d) => &d.tables,
            StatementKind::Insert(i) => std::slice::from_ref(&i.table),
            StatementKind::Other(_) => &[],
        }
    }

    pub fn selection(&self) -> Option<&Expr> {
        match &self.kind {
            StatementKind::Select(s) => s.selection.as_ref(),
            StatementKind::Update(u) => u.selection.as_ref(),
            StatementKind::Delete(d) => d.selection.as_ref(),
            StatementKind::Insert(_) | StatementKind::Other(_) => None,
        }
    }
}
