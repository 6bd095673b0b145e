use sqlguard_ast::{SqlContext, StatementKind};

use crate::InnerInterceptor;

/// Priority-100 fallback rewriter: if a SELECT reaches this stage without
/// any LIMIT/TOP/FETCH clause and no earlier interceptor has already
/// decided otherwise, appends `LIMIT <cap>` to the outgoing SQL (spec
/// §4.5). Runs strictly after `CheckInterceptor` so a BLOCK decision never
/// reaches this rewrite step.
pub struct SelectLimitFallback {
    cap: i64,
}

impl SelectLimitFallback {
    pub fn new(cap: i64) -> Self {
        Self { cap }
    }
}

impl InnerInterceptor for SelectLimitFallback {
    fn priority(&self) -> u32 {
        100
    }

    fn before_query(&self, sql: String, ctx: &mut SqlContext) -> String {
        let needs_limit = matches!(ctx.parsed().map(|p| &p.kind), Some(StatementKind::Select(s)) if s.pagination.is_none());
        if needs_limit {
            format!("{} LIMIT {}", sql.trim_end().trim_end_matches(';'), self.cap)
        } else {
            sql
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlguard_ast::{parse, CommandType, ExecutionLayer, SqlDialect};

    #[test]
    fn appends_limit_to_an_unbounded_select() {
        let fallback = SelectLimitFallback::new(500);
        let mut ctx = SqlContext::new("SELECT * FROM orders", CommandType::Select, ExecutionLayer::Jdbc);
        ctx.set_parsed(parse("SELECT * FROM orders", SqlDialect::Generic).unwrap());
        let rewritten = fallback.before_query("SELECT * FROM orders".to_string(), &mut ctx);
        assert_eq!(rewritten, "SELECT * FROM orders LIMIT 500");
    }

    #[test]
    fn leaves_an_already_paginated_select_untouched() {
        let fallback = SelectLimitFallback::new(500);
        let sql = "SELECT * FROM orders LIMIT 20";
        let mut ctx = SqlContext::new(sql, CommandType::Select, ExecutionLayer::Jdbc);
        ctx.set_parsed(parse(sql, SqlDialect::Generic).unwrap());
        let rewritten = fallback.before_query(sql.to_string(), &mut ctx);
        assert_eq!(rewritten, sql);
    }
}
