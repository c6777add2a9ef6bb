//! Run report generation

pub mod json;
pub mod text;

use crate::gate::GateVerdict;
use crate::{CoreError, CoreResult, RunOutput};
use std::str::FromStr;

/// Console report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

impl FromStr for ReportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(CoreError::Config(format!("unknown report format '{}'", other))),
        }
    }
}

/// Render a run (and its gate verdict, if any) in the given format
pub fn generate_report(
    output: &RunOutput,
    verdict: Option<&GateVerdict>,
    format: ReportFormat,
) -> CoreResult<String> {
    match format {
        ReportFormat::Json => json::generate(output, verdict),
        ReportFormat::Text => Ok(text::generate(output, verdict)),
    }
}
