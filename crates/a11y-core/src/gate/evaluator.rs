//! Threshold evaluation

use super::{Category, GateVerdict, ThresholdBreach};
use crate::config::ReportConfig;
use crate::summary::{ImpactSummary, SeverityCounts};
use crate::{CoreError, CoreResult, Severity};
use tracing::warn;

/// Configured gate thresholds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityGate {
    pub violation_thresholds: Option<Vec<u64>>,
    pub incomplete_thresholds: Option<Vec<u64>>,
    pub allow_failure: bool,
}

impl QualityGate {
    /// Parse thresholds from configuration. A non-numeric entry is an error
    /// naming the key; it is never treated as zero.
    pub fn from_config(config: &ReportConfig) -> CoreResult<Self> {
        Ok(Self {
            violation_thresholds: parse_thresholds(
                "violation_thresholds",
                config.violation_thresholds.as_deref(),
            )?,
            incomplete_thresholds: parse_thresholds(
                "incomplete_thresholds",
                config.incomplete_thresholds.as_deref(),
            )?,
            allow_failure: config.allow_failure,
        })
    }

    pub fn evaluate(&self, summary: &ImpactSummary) -> GateVerdict {
        evaluate(
            summary,
            self.violation_thresholds.as_deref(),
            self.incomplete_thresholds.as_deref(),
            self.allow_failure,
        )
    }
}

/// Parse a comma separated list of ceilings, e.g. `"0,0,5"`.
///
/// `None` or a blank string means the list is unset.
pub fn parse_thresholds(key: &str, raw: Option<&str>) -> CoreResult<Option<Vec<u64>>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    let values = raw
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<u64>().map_err(|_| {
                CoreError::Config(format!(
                    "{}: threshold '{}' is not a non-negative integer (in '{}')",
                    key, part, raw
                ))
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    if values.len() > Severity::ALL.len() {
        warn!(
            "{} has {} entries; only the first {} are used",
            key,
            values.len(),
            Severity::ALL.len()
        );
    }

    Ok(Some(values))
}

/// Evaluate `summary` against positional per-severity ceilings.
///
/// Positions map to Critical, Serious, Moderate, Minor. A missing position
/// leaves that severity unchecked.
pub fn evaluate(
    summary: &ImpactSummary,
    violation_thresholds: Option<&[u64]>,
    incomplete_thresholds: Option<&[u64]>,
    allow_failure: bool,
) -> GateVerdict {
    let violation_thresholds = violation_thresholds.unwrap_or_default();
    let incomplete_thresholds = incomplete_thresholds.unwrap_or_default();

    if violation_thresholds.is_empty() && incomplete_thresholds.is_empty() {
        return GateVerdict {
            explanation: "No thresholds configured; quality gate skipped.".to_string(),
            ..Default::default()
        };
    }

    let mut breaches = check(Category::Violations, &summary.violations, violation_thresholds);
    breaches.extend(check(Category::Incomplete, &summary.incomplete, incomplete_thresholds));

    let diagnostics: Vec<String> = breaches.iter().map(ThresholdBreach::message).collect();
    let checks = violation_thresholds.len().min(4) + incomplete_thresholds.len().min(4);

    let (failed, explanation) = if breaches.is_empty() {
        (
            false,
            format!("Quality gate passed. All {} threshold checks satisfied.", checks),
        )
    } else if allow_failure {
        for line in &diagnostics {
            warn!("{}", line);
        }
        (
            false,
            format!(
                "Quality gate breached ({} of {} checks) but failures are allowed.",
                breaches.len(),
                checks
            ),
        )
    } else {
        (
            true,
            format!(
                "Quality gate FAILED. {} of {} threshold checks exceeded.",
                breaches.len(),
                checks
            ),
        )
    };

    GateVerdict {
        failed,
        breaches,
        diagnostics,
        explanation,
    }
}

fn check(category: Category, counts: &SeverityCounts, thresholds: &[u64]) -> Vec<ThresholdBreach> {
    Severity::ALL
        .iter()
        .zip(thresholds)
        .filter_map(|(&severity, &threshold)| {
            let count = counts[severity];
            (count > threshold).then(|| ThresholdBreach {
                category,
                severity,
                count,
                threshold,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with(critical_violations: u64, minor_incomplete: u64) -> ImpactSummary {
        let mut summary = ImpactSummary::default();
        summary.violations.add(Severity::Critical, critical_violations);
        summary.incomplete.add(Severity::Minor, minor_incomplete);
        summary
    }

    #[test]
    fn test_no_thresholds_is_noop() {
        let verdict = evaluate(&summary_with(50, 50), None, None, false);
        assert!(!verdict.failed);
        assert!(verdict.diagnostics.is_empty());

        let verdict = evaluate(&summary_with(50, 50), Some(&[]), Some(&[]), false);
        assert!(!verdict.failed);
    }

    #[test]
    fn test_zero_thresholds_are_enforced() {
        let verdict = evaluate(&summary_with(1, 0), Some(&[0, 0, 0, 0]), None, false);
        assert!(verdict.failed);
        assert_eq!(verdict.breaches.len(), 1);
        assert_eq!(verdict.breaches[0].severity, Severity::Critical);
    }

    #[test]
    fn test_breach_with_allow_failure_is_demoted() {
        let summary = summary_with(1, 0);

        let allowed = evaluate(&summary, Some(&[0]), None, true);
        assert!(!allowed.failed);
        assert!(allowed.is_warning());
        assert!(allowed.diagnostics[0].contains("1 found"));
        assert!(allowed.diagnostics[0].contains("threshold is 0"));

        let fatal = evaluate(&summary, Some(&[0]), None, false);
        assert!(fatal.failed);
        assert_eq!(fatal.diagnostics, allowed.diagnostics);
    }

    #[test]
    fn test_short_list_leaves_rest_unchecked() {
        // Minor incomplete has no positional entry.
        let verdict = evaluate(&summary_with(0, 99), None, Some(&[0, 0]), false);
        assert!(!verdict.failed);
    }

    #[test]
    fn test_equal_to_threshold_passes() {
        let verdict = evaluate(&summary_with(3, 4), Some(&[3]), Some(&[9, 9, 9, 4]), false);
        assert!(!verdict.failed);
        assert!(verdict.explanation.contains("5 threshold checks"));
    }

    #[test]
    fn test_diagnostics_per_category() {
        let verdict = evaluate(&summary_with(2, 5), Some(&[1]), Some(&[0, 0, 0, 1]), false);
        assert_eq!(verdict.breaches.len(), 2);
        assert_eq!(verdict.breaches[1].category, Category::Incomplete);
        assert_eq!(verdict.breaches[1].excess(), 4);
        assert!(verdict.diagnostics[1].starts_with("Minor incomplete"));
    }

    #[test]
    fn test_parse_thresholds() {
        assert_eq!(parse_thresholds("k", None).unwrap(), None);
        assert_eq!(parse_thresholds("k", Some("  ")).unwrap(), None);
        assert_eq!(parse_thresholds("k", Some("0, 2,5")).unwrap(), Some(vec![0, 2, 5]));
    }

    #[test]
    fn test_parse_thresholds_rejects_garbage() {
        for raw in ["a", "1,,2", "-1", "1.5"] {
            match parse_thresholds("violation_thresholds", Some(raw)) {
                Err(CoreError::Config(msg)) => assert!(msg.starts_with("violation_thresholds")),
                other => panic!("expected config error for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_gate_from_config() {
        let config = ReportConfig {
            violation_thresholds: Some("0".to_string()),
            allow_failure: true,
            ..Default::default()
        };
        let gate = QualityGate::from_config(&config).unwrap();
        assert_eq!(gate.violation_thresholds, Some(vec![0]));
        assert_eq!(gate.incomplete_thresholds, None);
        assert!(!gate.evaluate(&summary_with(3, 0)).failed);
    }
}
