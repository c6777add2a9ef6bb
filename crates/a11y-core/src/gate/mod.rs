//! CI quality gate
//!
//! Compares the aggregate summary with per-severity ceilings and reports a
//! pass/fail verdict. The gate never exits the process itself.

pub mod evaluator;

pub use evaluator::{evaluate, parse_thresholds, QualityGate};

use crate::Severity;
use serde::{Deserialize, Serialize};

/// Which summary section a threshold applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Violations,
    Incomplete,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Violations => write!(f, "violations"),
            Category::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// One severity whose count went over its ceiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub category: Category,
    pub severity: Severity,
    pub count: u64,
    pub threshold: u64,
}

impl ThresholdBreach {
    pub fn excess(&self) -> u64 {
        self.count.saturating_sub(self.threshold)
    }

    pub fn message(&self) -> String {
        format!(
            "{} {}: {} found, threshold is {} (exceeded by {})",
            self.severity,
            self.category,
            self.count,
            self.threshold,
            self.excess()
        )
    }
}

/// Gate outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Fatal for the caller. False when breaches were demoted to warnings.
    pub failed: bool,
    pub breaches: Vec<ThresholdBreach>,
    pub diagnostics: Vec<String>,
    pub explanation: String,
}

impl GateVerdict {
    pub fn is_breached(&self) -> bool {
        !self.breaches.is_empty()
    }

    /// Breached but not fatal
    pub fn is_warning(&self) -> bool {
        self.is_breached() && !self.failed
    }
}
