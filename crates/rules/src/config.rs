use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sqlguard_ast::RiskLevel;

/// Top-level rule configuration (spec §6 "Validator" configuration
/// surface). Mirrors the `disabled: Vec<String>` / per-rule severity
/// override shape used by the sqlparser-based analyzer this catalogue is
/// grounded on, generalized with the checker-specific thresholds spec.md
/// §6 names explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub disabled: Vec<String>,
    pub severity_overrides: HashMap<String, RiskLevel>,
    pub enforce_for_all_queries: bool,
    pub deep_pagination_offset_threshold: i64,
    pub large_page_size_limit: i64,
    pub blacklist_fields: Vec<String>,
    pub whitelist_fields: HashMap<String, Vec<String>>,
    pub denied_tables: Vec<String>,
    pub read_only_tables: Vec<String>,
    pub dangerous_functions: Vec<String>,
    pub unique_key_columns: HashMap<String, Vec<String>>,
    pub table_whitelist: Vec<String>,
    pub mapper_id_whitelist_patterns: Vec<String>,
    /// Signatures of pagination plugins the host has registered (spec.md
    /// §4.4/§9: a soft, string-based signal matched against
    /// `SqlContext::declared_plugins`, never a concrete type check).
    pub pagination_plugin_signatures: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            severity_overrides: HashMap::new(),
            enforce_for_all_queries: false,
            deep_pagination_offset_threshold: 10_000,
            large_page_size_limit: 1_000,
            blacklist_fields: Vec::new(),
            whitelist_fields: HashMap::new(),
            denied_tables: Vec::new(),
            read_only_tables: Vec::new(),
            dangerous_functions: vec![
                "sleep".into(),
                "benchmark".into(),
                "load_file".into(),
                "xp_cmdshell".into(),
            ],
            unique_key_columns: HashMap::new(),
            table_whitelist: Vec::new(),
            mapper_id_whitelist_patterns: Vec::new(),
            pagination_plugin_signatures: Vec::new(),
        }
    }
}

impl RulesConfig {
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        !self.disabled.iter().any(|d| d == rule_id)
    }

    pub fn severity_for(&self, rule_id: &str, default: RiskLevel) -> RiskLevel {
        self.severity_overrides.get(rule_id).copied().unwrap_or(default)
    }
}
