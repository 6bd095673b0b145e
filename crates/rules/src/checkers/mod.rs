pub mod access;
pub mod dangerous;
pub mod injection;
pub mod pagination_checks;
pub mod safety;

use crate::config::RulesConfig;
use crate::Checker;
use std::sync::Arc;

/// Builds the full ~20-checker catalogue in the fixed, documented order
/// spec §4.2 groups them in (safety, pagination, injection surface,
/// dangerous ops, access control). Order is part of the contract spec §4.3
/// step 3 relies on ("stable, configuration-declared order").
pub fn default_checkers(config: Arc<RulesConfig>) -> Vec<Box<dyn Checker>> {
    vec![
        // Safety
        Box::new(safety::MissingWhere),
        Box::new(safety::DummyCondition),
        Box::new(safety::BlacklistField::new(config.clone())),
        Box::new(safety::WhitelistField::new(config.clone())),
        // Pagination
        Box::new(pagination_checks::NoPagination::new(config.clone())),
        Box::new(pagination_checks::NoConditionPagination),
        Box::new(pagination_checks::LogicalPagination::new(config.clone())),
        Box::new(pagination_checks::DeepPagination::new(config.clone())),
        Box::new(pagination_checks::LargePageSize::new(config.clone())),
        Box::new(pagination_checks::MissingOrderBy),
        // Injection surface
        Box::new(injection::MultiStatement),
        Box::new(injection::SetOperation),
        Box::new(injection::SqlComment),
        Box::new(injection::IntoOutfile),
        // Dangerous ops
        Box::new(dangerous::DdlOperation),
        Box::new(dangerous::DangerousFunction::new(config.clone())),
        Box::new(dangerous::CallStatement),
        // Access control
        Box::new(access::MetadataStatement),
        Box::new(access::SetStatement),
        Box::new(access::DeniedTable::new(config.clone())),
        Box::new(access::ReadOnlyTable::new(config)),
    ]
}
