use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ParsedStatement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandType {
    Select,
    Update,
    Delete,
    Insert,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionLayer {
    Mybatis,
    Jdbc,
    Jpa,
    SpringData,
    Unknown,
}

/// Pagination classification produced by the C4 detector; also carried on
/// `SqlContext` so later stages (interceptor, audit) can read it without
/// recomputing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaginationType {
    #[default]
    None,
    Physical,
    Logical,
}

/// Opaque, host-declared pagination parameter (spec §4.4 `hasPageParam`
/// signal): a runtime argument whose shape matches a pagination-bounds
/// object (e.g. a `(offset, limit)` pair), without needing to know its
/// concrete host-framework type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationHint {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Immutable-once-set carrier around one execution attempt (spec §3).
/// `raw_sql` is fixed at construction; `parsed` may be set exactly once via
/// `set_parsed` — a second call is a programmer error (the orchestrator is
/// the only caller and calls it at most once per `validate`), not a runtime
/// condition a checker can trigger, so it panics rather than returning a
/// `Result`.
#[derive(Debug, Clone)]
pub struct SqlContext {
    raw_sql: String,
    parsed: Option<ParsedStatement>,
    pub command_type: CommandType,
    pub execution_layer: ExecutionLayer,
    pub statement_id: Option<String>,
    pub params: HashMap<String, Value>,
    pub datasource: Option<String>,
    pub pagination_hint: Option<PaginationHint>,
    pub pagination_type: PaginationType,
    /// Plugin identifiers the host has registered (spec §4.4 `hasPlugin`
    /// soft signal; see §9 re-architecture note on reflection).
    pub declared_plugins: Vec<String>,
}

impl SqlContext {
    pub fn new(raw_sql: impl Into<String>, command_type: CommandType, execution_layer: ExecutionLayer) -> Self {
        Self {
            raw_sql: raw_sql.into(),
            parsed: None,
            command_type,
            execution_layer,
            statement_id: None,
            params: HashMap::new(),
            datasource: None,
            pagination_hint: None,
            pagination_type: PaginationType::None,
            declared_plugins: Vec::new(),
        }
    }

    pub fn raw_sql(&self) -> &str {
        &self.raw_sql
    }

    pub fn parsed(&self) -> Option<&ParsedStatement> {
        self.parsed.as_ref()
    }

    pub fn has_parsed(&self) -> bool {
        self.parsed.is_some()
    }

    /// Sets the parsed statement. Panics if it was already set — the
    /// "`statement` is never rewritten" invariant (spec §3) is not something
    /// a caller can recover from, it is a bug in the calling orchestrator.
    pub fn set_parsed(&mut self, parsed: ParsedStatement) {
        assert!(self.parsed.is_none(), "SqlContext.parsed must only be set once");
        self.parsed = Some(parsed);
    }

    pub fn with_statement_id(mut self, id: impl Into<String>) -> Self {
        self.statement_id = Some(id.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_declared_plugins(mut self, plugins: Vec<String>) -> Self {
        self.declared_plugins = plugins;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "must only be set once")]
    fn set_parsed_twice_panics() {
        let mut ctx = SqlContext::new("SELECT 1", CommandType::Select, ExecutionLayer::Unknown);
        let parsed = crate::parse::parse("SELECT 1", crate::SqlDialect::Generic).unwrap();
        ctx.set_parsed(parsed.clone());
        ctx.set_parsed(parsed);
    }

    #[test]
    fn raw_sql_is_immutable_after_construction() {
        let ctx = SqlContext::new("SELECT 1", CommandType::Select, ExecutionLayer::Unknown);
        assert_eq!(ctx.raw_sql(), "SELECT 1");
    }
}
