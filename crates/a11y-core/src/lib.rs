//! Accessibility Report Core Engine
//!
//! This crate ingests per-page axe-core scan records, reduces repeated visits
//! of the same logical page to one authoritative record, aggregates the
//! surviving records and evaluates a CI quality gate against the result.

pub mod config;
pub mod dedup;
pub mod gate;
pub mod normalize;
pub mod record;
pub mod report;
pub mod storage;
pub mod summary;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

pub use config::ReportConfig;
pub use dedup::{DedupOutcome, MergeStrategy};
pub use gate::{GateVerdict, QualityGate, ThresholdBreach};
pub use normalize::UrlNormalizer;
pub use record::{Issue, IssueNode, ScanRecord};
pub use storage::{RecordStore, StoredRecord};
pub use summary::{ImpactSummary, IssueTotals, PageSummary, SeverityCounts};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan record directory not found: {}", .0.display())]
    StorageNotFound(PathBuf),

    #[error("Malformed scan record {}: {source}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid URL: {0}")]
    Url(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Severity levels reported by axe-core, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    /// Fixed order used for threshold lists and count arrays
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    /// Exact, case-sensitive match against the axe impact string.
    pub fn from_impact(impact: &str) -> Option<Self> {
        match impact {
            "critical" => Some(Severity::Critical),
            "serious" => Some(Severity::Serious),
            "moderate" => Some(Severity::Moderate),
            "minor" => Some(Severity::Minor),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::Serious => write!(f, "Serious"),
            Severity::Moderate => write!(f, "Moderate"),
            Severity::Minor => write!(f, "Minor"),
        }
    }
}

/// Result of a full merge + summarize run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub dedup: DedupOutcome,
    pub summary: ImpactSummary,
    pub totals: IssueTotals,
    pub pages: Vec<PageSummary>,
}

/// What `ReportRunner::ingest` did with a scan result
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    Stored(StoredRecord),
    /// Nothing in violations, incomplete or passes; no record was written
    Skipped { url: String },
}

/// Main pipeline interface
///
/// Threads one [`RecordStore`] through dedup and aggregation so that the
/// summary is always computed from the post-deletion directory contents.
pub struct ReportRunner {
    config: ReportConfig,
    strategy: MergeStrategy,
}

impl ReportRunner {
    pub fn new(config: ReportConfig) -> CoreResult<Self> {
        let strategy = config.merge_strategy()?;
        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Open the record store, or `None` when the directory does not exist yet.
    pub fn open_store(&self) -> CoreResult<Option<RecordStore>> {
        match RecordStore::open(self.config.pages_dir()) {
            Ok(store) => Ok(Some(store)),
            Err(CoreError::StorageNotFound(dir)) => {
                info!("Directory {} not found, nothing to process", dir.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run deduplication only
    pub fn merge(&self) -> CoreResult<Option<DedupOutcome>> {
        let Some(store) = self.open_store()? else {
            return Ok(None);
        };
        let records = store.read_all()?;
        dedup::deduplicate(self.strategy, &store, records).map(Some)
    }

    /// Deduplicate, then summarize the surviving records and write the outputs
    pub fn summarize(&self) -> CoreResult<Option<RunOutput>> {
        let Some(store) = self.open_store()? else {
            return Ok(None);
        };

        let records = store.read_all()?;
        let dedup = dedup::deduplicate(self.strategy, &store, records)?;

        // Re-enumerate: only what survived on disk is counted.
        let survivors: Vec<ScanRecord> = store
            .read_all()?
            .into_iter()
            .map(|stored| stored.record)
            .collect();

        let summary = summary::summarize(&survivors);
        let totals = IssueTotals::from_records(&survivors);
        let pages = summary::page_index(&survivors);

        report::json::write_summary(&self.config.summary_path(), &summary)?;
        report::json::write_pages(&self.config.pages_index_path(), &pages)?;

        info!(
            "Summarized {} records ({} removed by merge)",
            survivors.len(),
            dedup.deleted.len()
        );

        Ok(Some(RunOutput {
            dedup,
            summary,
            totals,
            pages,
        }))
    }

    /// Import a raw axe-core result into the record store.
    ///
    /// Results with no violations, incomplete or passes are not persisted.
    pub fn ingest(&self, source: &std::path::Path) -> CoreResult<IngestOutcome> {
        let raw = std::fs::read_to_string(source)?;
        let mut record: ScanRecord =
            serde_json::from_str(&raw).map_err(|e| CoreError::MalformedRecord {
                path: source.to_path_buf(),
                source: e,
            })?;

        if record.violations.is_empty() && record.incomplete.is_empty() && record.passes.is_empty() {
            info!("Skipping empty scan result for {}", record.url);
            return Ok(IngestOutcome::Skipped { url: record.url });
        }

        let normalizer = self.config.normalizer()?;
        record.stamp(&normalizer, self.config.base_url.as_deref())?;

        let store = RecordStore::create(self.config.pages_dir())?;
        let path = store.write(&record)?;
        let id = record.id.clone().unwrap_or_default();
        info!(
            "Stored {} as {} ({})",
            record.url,
            id,
            record.fingerprint.as_deref().unwrap_or("")
        );

        Ok(IngestOutcome::Stored(StoredRecord { id, path, record }))
    }

    /// Fingerprint a URL with the configured patterns
    pub fn fingerprint(&self, url: &str) -> CoreResult<String> {
        self.config.normalizer()?.normalize(url)
    }

    /// Full CI run: dedup, summarize, then evaluate the quality gate
    pub fn gate(&self) -> CoreResult<Option<(RunOutput, GateVerdict)>> {
        let gate = QualityGate::from_config(&self.config)?;
        let Some(output) = self.summarize()? else {
            return Ok(None);
        };
        let verdict = gate.evaluate(&output.summary);
        Ok(Some((output, verdict)))
    }
}
