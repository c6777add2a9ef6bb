//! Plain text console report

use crate::gate::GateVerdict;
use crate::summary::SeverityCounts;
use crate::{RunOutput, Severity};

pub fn generate(output: &RunOutput, verdict: Option<&GateVerdict>) -> String {
    let mut out = String::new();
    let rule = "=".repeat(50);

    out.push_str(&format!("Accessibility Summary\n{}\n", rule));
    out.push_str(&format!(
        "Pages: {} ({} removed by '{}' merge)\n",
        output.pages.len(),
        output.dedup.deleted.len(),
        output.dedup.strategy
    ));
    out.push_str(&format!(
        "Issues: {} total, {} violations, {} incomplete, {} passes\n",
        output.totals.total(),
        output.totals.violations,
        output.totals.incomplete,
        output.totals.passes
    ));

    out.push_str(&format!("\n{:<12}{:>12}{:>12}\n", "Severity", "Violations", "Incomplete"));
    for severity in Severity::ALL {
        out.push_str(&format!(
            "{:<12}{:>12}{:>12}\n",
            severity.to_string(),
            output.summary.violations[severity],
            output.summary.incomplete[severity]
        ));
    }
    push_total_row(&mut out, &output.summary.violations, &output.summary.incomplete);
    out.push_str(&format!(
        "Passed nodes: {}  Inapplicable nodes: {}\n",
        output.summary.passed, output.summary.inapplicable
    ));

    if let Some(verdict) = verdict {
        out.push_str(&format!("\nQuality Gate\n{}\n", rule));
        for line in &verdict.diagnostics {
            out.push_str(&format!("  - {}\n", line));
        }
        out.push_str(&format!("{}\n", verdict.explanation));
    }

    out
}

fn push_total_row(out: &mut String, violations: &SeverityCounts, incomplete: &SeverityCounts) {
    out.push_str(&format!(
        "{:<12}{:>12}{:>12}\n",
        "Total",
        violations.total(),
        incomplete.total()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::evaluate;
    use crate::{DedupOutcome, ImpactSummary, IssueTotals};

    #[test]
    fn test_text_report_lists_breaches() {
        let mut summary = ImpactSummary::default();
        summary.violations.add(Severity::Critical, 2);
        let verdict = evaluate(&summary, Some(&[0]), None, false);
        let output = RunOutput {
            dedup: DedupOutcome::default(),
            summary,
            totals: IssueTotals::default(),
            pages: Vec::new(),
        };

        let text = generate(&output, Some(&verdict));
        assert!(text.contains("Critical"));
        assert!(text.contains("Quality gate FAILED"));
        assert!(text.contains("2 found, threshold is 0"));
    }

    #[test]
    fn test_text_report_table_rows() {
        let mut summary = ImpactSummary::default();
        summary.violations.add(Severity::Serious, 3);
        summary.incomplete.add(Severity::Minor, 1);
        let output = RunOutput {
            dedup: DedupOutcome::default(),
            summary,
            totals: IssueTotals::default(),
            pages: Vec::new(),
        };

        let text = generate(&output, None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Accessibility Summary");
        assert!(lines.contains(&format!("{:<12}{:>12}{:>12}", "Serious", 3, 0).as_str()));
        assert!(lines.contains(&format!("{:<12}{:>12}{:>12}", "Total", 3, 1).as_str()));
        assert!(!text.contains("Quality Gate"));
        assert!(text.ends_with('\n'));
    }
}
