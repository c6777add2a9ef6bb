//! JSON report generation and output files

use crate::gate::GateVerdict;
use crate::summary::{ImpactSummary, PageSummary};
use crate::{CoreError, CoreResult, RunOutput};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    output: &'a RunOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    gate: Option<&'a GateVerdict>,
}

pub fn generate(output: &RunOutput, verdict: Option<&GateVerdict>) -> CoreResult<String> {
    serde_json::to_string_pretty(&Report {
        output,
        gate: verdict,
    })
    .map_err(|e| CoreError::Serialize(format!("JSON serialization failed: {}", e)))
}

/// Write the impact summary consumed by CI and the dashboard
pub fn write_summary(path: &Path, summary: &ImpactSummary) -> CoreResult<()> {
    write_pretty(path, summary)
}

/// Write the page table
pub fn write_pages(path: &Path, pages: &[PageSummary]) -> CoreResult<()> {
    write_pretty(path, pages)
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::Serialize(format!("{}: {}", path.display(), e)))?;
    fs::write(path, json)?;
    Ok(())
}
