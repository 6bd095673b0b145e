//! Typed view of a parsed SQL statement (component C1) and the shared
//! data-model value types (`SqlContext`, `ValidationResult`, `RiskLevel`)
//! every other component in the workspace depends on.

pub mod context;
pub mod dialect;
pub mod model;
pub mod parse;
pub mod risk;

pub use context::{CommandType, ExecutionLayer, PaginationHint, PaginationType, SqlContext};
pub use dialect::SqlDialect;
pub use model::{
    DeleteStatement, InsertStatement, PaginationClause, PaginationKind, ParsedStatement,
    SelectStatement, StatementKind, TableRef, UpdateStatement,
};
pub use parse::{parse, ParseError};
pub use risk::{RiskLevel, ValidationResult, ViolationInfo};

pub use sqlparser::ast::Expr;
