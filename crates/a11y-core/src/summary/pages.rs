//! Per-page index and issue-level totals for the dashboard

use crate::record::ScanRecord;
use serde::{Deserialize, Serialize};

/// One row of the page table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: String,
    /// Display path; falls back to the id
    pub page: String,
    pub url: String,
    pub violations: usize,
    pub incomplete: usize,
    pub passes: usize,
    pub inapplicable: usize,
    pub last_tested: Option<String>,
    /// `major.minor` of the scanning engine
    pub engine_version: Option<String>,
}

impl PageSummary {
    pub fn from_record(record: &ScanRecord) -> Self {
        let id = record.id.clone().unwrap_or_default();
        let page = record
            .page_path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| id.clone());

        Self {
            id,
            page,
            url: record.url.clone(),
            violations: record.violations.len(),
            incomplete: record.incomplete.len(),
            passes: record.passes.len(),
            inapplicable: record.inapplicable.len(),
            last_tested: record.timestamp.clone(),
            engine_version: record.test_engine.as_ref().map(|e| e.dataset_version()),
        }
    }
}

/// Build the page table in record order
pub fn page_index(records: &[ScanRecord]) -> Vec<PageSummary> {
    records.iter().map(PageSummary::from_record).collect()
}

/// Issue-level totals (rules, not nodes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTotals {
    pub violations: usize,
    pub incomplete: usize,
    pub passes: usize,
}

impl IssueTotals {
    pub fn from_records(records: &[ScanRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, r| Self {
            violations: acc.violations + r.violations.len(),
            incomplete: acc.incomplete + r.incomplete.len(),
            passes: acc.passes + r.passes.len(),
        })
    }

    pub fn total(&self) -> usize {
        self.violations + self.incomplete + self.passes
    }
}
