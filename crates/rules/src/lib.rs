pub mod checker;
pub mod checkers;
pub mod config;
pub mod escape_hatch;
pub mod pagination;
pub mod support;

pub use checker::{Checker, RuleCatalogue};
pub use checkers::default_checkers;
pub use config::RulesConfig;
pub use pagination::{classify_pagination, PaginationPluginSignature};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlguard_ast::{parse, CommandType, ExecutionLayer, SqlContext, SqlDialect};

    use super::*;

    /// Runs the full default catalogue end to end on a handful of the
    /// canonical bad-query shapes, confirming the catalogue wiring (not just
    /// the individual checkers) produces the expected minimum severities.
    #[test]
    fn catalogue_flags_delete_without_where_as_critical() {
        let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
        let stmt = parse("DELETE FROM orders", SqlDialect::Generic).unwrap();
        let ctx = SqlContext::new("DELETE FROM orders", CommandType::Delete, ExecutionLayer::Mybatis);

        let results = catalogue.run(&stmt, &ctx);
        let flagged: Vec<_> = results.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        assert!(flagged.iter().any(|(id, _)| *id == "SAFETY001_MISSING_WHERE"));
    }

    #[test]
    fn catalogue_is_silent_on_a_well_formed_query() {
        let config = Arc::new(RulesConfig::default());
        let catalogue = RuleCatalogue::new(default_checkers(config.clone()), config);
        let stmt = parse("SELECT id, name FROM orders WHERE tenant_id = 7 ORDER BY id LIMIT 20", SqlDialect::Generic).unwrap();
        let ctx = SqlContext::new("SELECT id, name FROM orders WHERE tenant_id = 7 ORDER BY id LIMIT 20", CommandType::Select, ExecutionLayer::Mybatis);

        let results = catalogue.run(&stmt, &ctx);
        let flagged: Vec<_> = results.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        assert!(flagged.is_empty(), "unexpected violations: {flagged:?}");
    }
}
