use serde::{Deserialize, Serialize};

/// Drives `CheckInterceptor`'s behavior once a `ValidationResult` is in hand
/// (spec §7). Stacks from least to most disruptive to the host call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStrategy {
    /// Violation recorded only; execution proceeds unmodified.
    #[default]
    Log,
    /// Violation logged at warn level; execution still proceeds.
    Warn,
    /// Execution aborted; the host receives a synchronous failure.
    Block,
}
