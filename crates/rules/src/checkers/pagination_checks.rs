use std::sync::Arc;

use sqlguard_ast::{ParsedStatement, RiskLevel, SqlContext, StatementKind, ViolationInfo};

use crate::config::RulesConfig;
use crate::escape_hatch::{is_unique_key_equality, is_whitelisted};
use crate::pagination::{classify_pagination, PaginationPluginSignature};
use crate::support::{contains_tautology, is_sole_predicate_on};
use crate::Checker;

fn is_escaped(stmt: &ParsedStatement, ctx: &SqlContext, config: &RulesConfig) -> bool {
    for table in stmt.tables() {
        if is_whitelisted(&table.name, ctx.statement_id.as_deref(), &config.table_whitelist, &config.mapper_id_whitelist_patterns) {
            return true;
        }
        if let Some(cols) = config.unique_key_columns.get(&table.name) {
            if let Some(expr) = stmt.selection() {
                if is_unique_key_equality(expr, cols) {
                    return true;
                }
            }
        }
    }
    false
}

fn is_blacklist_only_where(expr: &sqlguard_ast::Expr, blacklist_fields: &[String]) -> bool {
    blacklist_fields.iter().any(|f| is_sole_predicate_on(expr, f))
}

/// SELECT without LIMIT/TOP/FETCH/ROWNUM. Stratified by WHERE quality: no
/// WHERE, or a WHERE matching only a blacklisted field, escalates to
/// CRITICAL (effectively unbounded and unselective); an otherwise normal
/// WHERE only escalates to MEDIUM when `enforceForAllQueries` is set.
pub struct NoPagination {
    config: Arc<RulesConfig>,
}

impl NoPagination {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for NoPagination {
    fn id(&self) -> &'static str {
        "PAGE001_NO_PAGINATION"
    }

    fn check(&self, stmt: &ParsedStatement, ctx: &SqlContext) -> Vec<ViolationInfo> {
        let StatementKind::Select(s) = &stmt.kind else { return Vec::new() };
        if s.pagination.is_some() {
            return Vec::new();
        }
        if is_escaped(stmt, ctx, &self.config) {
            return Vec::new();
        }
        let no_where_or_blacklist_only = match &s.selection {
            None => true,
            Some(expr) => is_blacklist_only_where(expr, &self.config.blacklist_fields) || contains_tautology(expr),
        };
        if no_where_or_blacklist_only {
            return vec![ViolationInfo::new(RiskLevel::Critical, "SELECT without pagination and without a selective WHERE clause")
                .with_suggestion("add LIMIT/TOP/FETCH and a selective WHERE clause")];
        }
        if self.config.enforce_for_all_queries {
            return vec![ViolationInfo::new(RiskLevel::Medium, "SELECT without pagination")
                .with_suggestion("add LIMIT/TOP/FETCH to bound the result set")];
        }
        Vec::new()
    }
}

/// LIMIT present but no WHERE clause at all — still scans/sorts the whole
/// table before truncating. Minimum risk CRITICAL.
pub struct NoConditionPagination;

impl Checker for NoConditionPagination {
    fn id(&self) -> &'static str {
        "PAGE002_NO_CONDITION_PAGINATION"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let StatementKind::Select(s) = &stmt.kind else { return Vec::new() };
        if s.pagination.is_some() && s.selection.is_none() {
            return vec![ViolationInfo::new(RiskLevel::Critical, "LIMIT without a WHERE clause")
                .with_suggestion("add a WHERE clause to avoid scanning the full table before limiting")];
        }
        Vec::new()
    }
}

/// Runtime pagination parameter present without a physical LIMIT and
/// without a registered pagination plugin — the host will materialize the
/// full result set in memory before paginating it. Minimum risk CRITICAL
/// (can OOM a service, spec §4.4).
pub struct LogicalPagination {
    config: Arc<RulesConfig>,
}

impl LogicalPagination {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for LogicalPagination {
    fn id(&self) -> &'static str {
        "PAGE003_LOGICAL_PAGINATION"
    }

    fn check(&self, stmt: &ParsedStatement, ctx: &SqlContext) -> Vec<ViolationInfo> {
        let signatures: Vec<PaginationPluginSignature> = self
            .config
            .pagination_plugin_signatures
            .iter()
            .map(|s| PaginationPluginSignature(s.clone()))
            .collect();
        if classify_pagination(stmt, ctx, &signatures) == sqlguard_ast::PaginationType::Logical {
            return vec![ViolationInfo::new(RiskLevel::Critical, "pagination performed in memory (logical pagination)")
                .with_suggestion("enable a physical pagination plugin or add an explicit LIMIT")];
        }
        Vec::new()
    }
}

/// OFFSET above the configured threshold — the database still has to walk
/// and discard every skipped row. Minimum risk MEDIUM.
pub struct DeepPagination {
    config: Arc<RulesConfig>,
}

impl DeepPagination {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for DeepPagination {
    fn id(&self) -> &'static str {
        "PAGE004_DEEP_PAGINATION"
    }

    fn check(&self, stmt: &ParsedStatement, ctx: &SqlContext) -> Vec<ViolationInfo> {
        let StatementKind::Select(s) = &stmt.kind else { return Vec::new() };
        let Some(pagination) = &s.pagination else { return Vec::new() };
        let Some(offset) = pagination.offset else { return Vec::new() };
        if is_escaped(stmt, ctx, &self.config) {
            return Vec::new();
        }
        if offset > self.config.deep_pagination_offset_threshold {
            return vec![ViolationInfo::new(
                RiskLevel::Medium,
                format!("OFFSET {offset} exceeds the configured deep-pagination threshold"),
            )
            .with_suggestion("use keyset/cursor pagination instead of a large OFFSET")];
        }
        Vec::new()
    }
}

/// LIMIT above the configured threshold. Minimum risk MEDIUM.
pub struct LargePageSize {
    config: Arc<RulesConfig>,
}

impl LargePageSize {
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }
}

impl Checker for LargePageSize {
    fn id(&self) -> &'static str {
        "PAGE005_LARGE_PAGE_SIZE"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let StatementKind::Select(s) = &stmt.kind else { return Vec::new() };
        let Some(pagination) = &s.pagination else { return Vec::new() };
        let Some(limit) = pagination.limit else { return Vec::new() };
        if limit > self.config.large_page_size_limit {
            return vec![ViolationInfo::new(
                RiskLevel::Medium,
                format!("LIMIT {limit} exceeds the configured page-size limit"),
            )
            .with_suggestion("reduce the page size or introduce server-side streaming")];
        }
        Vec::new()
    }
}

/// A paginated SELECT without an ORDER BY has no stable row ordering across
/// pages. Minimum risk LOW.
pub struct MissingOrderBy;

impl Checker for MissingOrderBy {
    fn id(&self) -> &'static str {
        "PAGE006_MISSING_ORDER_BY"
    }

    fn check(&self, stmt: &ParsedStatement, _ctx: &SqlContext) -> Vec<ViolationInfo> {
        let StatementKind::Select(s) = &stmt.kind else { return Vec::new() };
        if s.pagination.is_some() && s.order_by.is_empty() {
            return vec![ViolationInfo::new(RiskLevel::Low, "paginated SELECT has no ORDER BY")
                .with_suggestion("add an ORDER BY so page boundaries are stable")];
        }
        Vec::new()
    }
}
