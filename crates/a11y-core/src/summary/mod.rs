//! Aggregate impact summary
//!
//! Node-level severity counts across all surviving records. This is what the
//! dashboard shows and what the quality gate checks.

pub mod pages;

pub use pages::{page_index, IssueTotals, PageSummary};

use crate::record::{Issue, ScanRecord};
use crate::Severity;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Per-severity node counts, indexed by [`Severity`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SeverityCountsRepr", into = "SeverityCountsRepr")]
pub struct SeverityCounts([u64; 4]);

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SeverityCountsRepr {
    #[serde(default)]
    critical: u64,
    #[serde(default)]
    serious: u64,
    #[serde(default)]
    moderate: u64,
    #[serde(default)]
    minor: u64,
}

impl From<SeverityCountsRepr> for SeverityCounts {
    fn from(r: SeverityCountsRepr) -> Self {
        Self([r.critical, r.serious, r.moderate, r.minor])
    }
}

impl From<SeverityCounts> for SeverityCountsRepr {
    fn from(c: SeverityCounts) -> Self {
        let [critical, serious, moderate, minor] = c.0;
        Self {
            critical,
            serious,
            moderate,
            minor,
        }
    }
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u64 {
        self.0[severity.index()]
    }

    pub fn add(&mut self, severity: Severity, n: u64) {
        self.0[severity.index()] += n;
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Count every node of `issues` by its own impact
    fn tally(&mut self, issues: &[Issue]) {
        for node in issues.iter().flat_map(|issue| issue.nodes.iter()) {
            if let Some(severity) = node.severity() {
                self.add(severity, 1);
            }
        }
    }
}

impl Index<Severity> for SeverityCounts {
    type Output = u64;

    fn index(&self, severity: Severity) -> &u64 {
        &self.0[severity.index()]
    }
}

/// Summary written once per run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImpactSummary {
    pub violations: SeverityCounts,
    pub incomplete: SeverityCounts,
    pub passed: u64,
    pub inapplicable: u64,
}

/// Reduce records to node-level counts. Nodes whose impact is missing or not
/// one of the four known severities are not counted anywhere.
pub fn summarize(records: &[ScanRecord]) -> ImpactSummary {
    let mut summary = ImpactSummary::default();

    for record in records {
        summary.violations.tally(&record.violations);
        summary.incomplete.tally(&record.incomplete);
        summary.passed += node_count(&record.passes);
        summary.inapplicable += node_count(&record.inapplicable);
    }

    summary
}

fn node_count(issues: &[Issue]) -> u64 {
    issues.iter().map(|issue| issue.nodes.len() as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IssueNode;

    fn node(impact: Option<&str>) -> IssueNode {
        IssueNode {
            impact: impact.map(str::to_string),
            ..Default::default()
        }
    }

    fn issue(nodes: Vec<IssueNode>) -> Issue {
        Issue {
            id: "rule".to_string(),
            nodes,
            ..Default::default()
        }
    }

    #[test]
    fn test_counts_nodes_not_issues() {
        let record = ScanRecord {
            violations: vec![issue(vec![
                node(Some("critical")),
                node(Some("serious")),
                node(Some("critical")),
            ])],
            ..Default::default()
        };

        let summary = summarize(&[record]);
        assert_eq!(summary.violations[Severity::Critical], 2);
        assert_eq!(summary.violations[Severity::Serious], 1);
        assert_eq!(summary.violations.total(), 3);
    }

    #[test]
    fn test_unknown_impacts_are_dropped() {
        let record = ScanRecord {
            incomplete: vec![issue(vec![
                node(None),
                node(Some("Critical")),
                node(Some("none")),
                node(Some("minor")),
            ])],
            ..Default::default()
        };

        let summary = summarize(&[record]);
        assert_eq!(summary.incomplete.total(), 1);
        assert_eq!(summary.incomplete[Severity::Minor], 1);
    }

    #[test]
    fn test_passes_and_inapplicable_are_plain_node_counts() {
        let record = ScanRecord {
            passes: vec![issue(vec![node(None), node(Some("minor"))]), issue(vec![node(None)])],
            inapplicable: vec![issue(vec![]), issue(vec![node(None)])],
            ..Default::default()
        };

        let summary = summarize(&[record.clone(), record]);
        assert_eq!(summary.passed, 6);
        assert_eq!(summary.inapplicable, 2);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(summarize(&[]), ImpactSummary::default());
    }

    #[test]
    fn test_json_shape() {
        let mut summary = ImpactSummary::default();
        summary.violations.add(Severity::Critical, 4);
        summary.passed = 7;

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["Violations"]["Critical"], 4);
        assert_eq!(value["Incomplete"]["Minor"], 0);
        assert_eq!(value["Passed"], 7);

        let back: ImpactSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back, summary);
    }
}
