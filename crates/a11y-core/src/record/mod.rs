//! Scan record model
//!
//! One axe-core result per page visit. Only the fields the engine reads are
//! typed; everything else in the document is carried through `extra` so that
//! rewriting a record never drops data produced by the scanner.

use crate::normalize::UrlNormalizer;
use crate::{CoreResult, Severity};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One accessibility scan result for one page visit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: String,
    /// Fingerprint stamped at capture time
    #[serde(default, rename = "path", skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_engine: Option<TestEngine>,
    #[serde(default)]
    pub violations: Vec<Issue>,
    #[serde(default)]
    pub incomplete: Vec<Issue>,
    #[serde(default)]
    pub passes: Vec<Issue>,
    #[serde(default)]
    pub inapplicable: Vec<Issue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scanning engine identification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestEngine {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl TestEngine {
    /// `major.minor` of the engine version, used to select a rule dataset
    pub fn dataset_version(&self) -> String {
        self.version.split('.').take(2).collect::<Vec<_>>().join(".")
    }
}

/// One rule's result within a record section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<IssueNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A DOM element implicated by an issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueNode {
    #[serde(default)]
    pub impact: Option<String>,
    /// Selector path; entries are strings or nested arrays for shadow DOM
    #[serde(default)]
    pub target: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IssueNode {
    pub fn severity(&self) -> Option<Severity> {
        self.impact.as_deref().and_then(Severity::from_impact)
    }
}

impl Issue {
    pub fn severity(&self) -> Option<Severity> {
        self.impact.as_deref().and_then(Severity::from_impact)
    }
}

impl ScanRecord {
    /// Parsed capture time; `None` when absent or unparseable
    pub fn captured_at(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }

    /// All node targets of a section, flattened in document order
    pub fn flattened_targets(issues: &[Issue]) -> Vec<Value> {
        issues
            .iter()
            .flat_map(|issue| issue.nodes.iter())
            .flat_map(|node| node.target.iter().cloned())
            .collect()
    }

    /// Stamp a freshly captured record for storage.
    ///
    /// Assigns an id when absent and records the fingerprint of `url`.
    /// `base_url` is stripped from the fingerprint to form the display path.
    pub fn stamp(&mut self, normalizer: &UrlNormalizer, base_url: Option<&str>) -> CoreResult<()> {
        if self.id.as_deref().map_or(true, str::is_empty) {
            self.id = Some(generate_id());
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now().to_rfc3339());
        }

        let fingerprint = normalizer.normalize(&self.url)?;
        let page_path = match base_url {
            Some(base) if !base.is_empty() => fingerprint.replacen(base, "", 1),
            _ => fingerprint.clone(),
        };

        self.new_url = Some(fingerprint.clone());
        self.page_path = Some(page_path);
        self.fingerprint = Some(fingerprint);
        Ok(())
    }
}

/// Parse an ISO 8601 timestamp.
///
/// Offset-less date-times and bare dates are read as UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<FixedOffset>> {
    let ts = ts.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(ts) {
        return Some(parsed);
    }

    let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(ts, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.and_utc().fixed_offset())
}

/// UUID v4 followed by the last four digits of the epoch milliseconds
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let suffix = &millis[millis.len().saturating_sub(4)..];
    format!("{}{}", Uuid::new_v4(), suffix)
}
