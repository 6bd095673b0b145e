use once_cell::sync::Lazy;
use regex::Regex;

use sqlguard_ast::{ParsedStatement, PaginationType, SqlContext, StatementKind};

/// Word-boundary fallback scan for `LIMIT`, `TOP`, `FETCH FIRST/NEXT ...
/// ROWS`, and `ROWNUM`/`ROW_NUMBER` — used when the AST does not expose a
/// structured pagination clause (nested subqueries, legacy ROWNUM idioms,
/// dialect constructs the parser does not model as `Query::limit`). Spec
/// §4.4 documents this as intentionally over-matching: a false positive
/// here only ever pushes the classification toward PHYSICAL, which is the
/// safe direction.
static PAGINATION_TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(LIMIT\s+\d+|TOP\s+\d+|FETCH\s+(FIRST|NEXT)\b|ROWNUM|ROW_NUMBER\s*\()").unwrap()
});

/// A signature the host registers for a pagination plugin it has wired in
/// (spec §9: soft, string-based signal — never a concrete type check).
#[derive(Debug, Clone)]
pub struct PaginationPluginSignature(pub String);

fn has_limit(stmt: &ParsedStatement) -> bool {
    if let StatementKind::Select(s) = &stmt.kind {
        if s.pagination.is_some() {
            return true;
        }
    }
    PAGINATION_TEXT_PATTERN.is_match(&stmt.raw_sql)
}

fn has_page_param(ctx: &SqlContext) -> bool {
    match &ctx.pagination_hint {
        Some(hint) => hint.limit.is_some() || hint.offset.is_some(),
        None => false,
    }
}

fn has_plugin(ctx: &SqlContext, known_signatures: &[PaginationPluginSignature]) -> bool {
    ctx.declared_plugins.iter().any(|declared| {
        known_signatures
            .iter()
            .any(|sig| declared.to_lowercase().contains(&sig.0.to_lowercase()))
    })
}

/// Classifies a query's pagination as NONE / PHYSICAL / LOGICAL per the
/// eight-row decision table in spec §4.4. Conservative toward PHYSICAL: a
/// false-positive PHYSICAL classification of a true LOGICAL case is
/// preferable to the reverse, which can OOM a service under unbounded
/// in-memory pagination.
pub fn classify_pagination(
    stmt: &ParsedStatement,
    ctx: &SqlContext,
    known_signatures: &[PaginationPluginSignature],
) -> PaginationType {
    let limit = has_limit(stmt);
    let page_param = has_page_param(ctx);
    let plugin = has_plugin(ctx, known_signatures);

    if limit {
        return PaginationType::Physical;
    }
    if page_param {
        if plugin {
            return PaginationType::Physical;
        }
        return PaginationType::Logical;
    }
    PaginationType::None
}
