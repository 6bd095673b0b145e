use serde::{Deserialize, Serialize};

/// Totally ordered severity. Declaration order doubles as the ordering
/// (`derive(PartialOrd, Ord)` on a C-like enum compares by discriminant), so
/// `RiskLevel::Safe < RiskLevel::Critical` holds without a hand-written
/// `Ord` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Safe
    }
}

impl RiskLevel {
    /// Lowercase label value used in metrics (`checker_violations_total`'s
    /// `risk_level` label) and config lookups.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// (riskLevel, message, suggestion?) triple. Equality considers `risk_level`
/// and `message` only, per spec §3 — `suggestion` is advisory text and two
/// violations differing only in suggestion wording are the same violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationInfo {
    pub risk_level: RiskLevel,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ViolationInfo {
    pub fn new(risk_level: RiskLevel, message: impl Into<String>) -> Self {
        Self { risk_level, message: message.into(), suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl PartialEq for ViolationInfo {
    fn eq(&self, other: &Self) -> bool {
        self.risk_level == other.risk_level && self.message == other.message
    }
}
impl Eq for ViolationInfo {}

/// Aggregated outcome of pre-execution checking for one SQL statement.
/// Monotonic: `add_violation` never lowers `risk_level`, never flips
/// `passed` from `false` back to `true` (spec §3, testable property 2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    violations: Vec<ViolationInfo>,
    risk_level: RiskLevel,
    passed: bool,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { violations: Vec::new(), risk_level: RiskLevel::Safe, passed: true }
    }

    pub fn add_violation(&mut self, violation: ViolationInfo) {
        if violation.risk_level > self.risk_level {
            self.risk_level = violation.risk_level;
        }
        self.passed = false;
        self.violations.push(violation);
    }

    pub fn extend(&mut self, violations: impl IntoIterator<Item = ViolationInfo>) {
        for v in violations {
            self.add_violation(v);
        }
    }

    pub fn violations(&self) -> &[ViolationInfo] {
        &self.violations
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn highest_severity_violation(&self) -> Option<&ViolationInfo> {
        self.violations.iter().max_by_key(|v| v.risk_level)
    }
}
