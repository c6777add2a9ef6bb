//! Run configuration
//!
//! Defaults, then an optional TOML file, then environment variables. The CLI
//! applies its own flags on top.

use crate::dedup::MergeStrategy;
use crate::normalize::UrlNormalizer;
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "a11y-report.toml";

/// Subdirectory of the output dir holding scan records
pub const PAGES_DIR: &str = "pages";

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report root; records are read from `<output_dir>/pages`
    pub output_dir: PathBuf,
    /// `none`, `exact` or `best`
    pub merge_strategy: String,
    /// Comma separated ceilings for Critical, Serious, Moderate, Minor
    pub violation_thresholds: Option<String>,
    pub incomplete_thresholds: Option<String>,
    /// Demote a failed gate to a warning
    pub allow_failure: bool,
    /// Custom path patterns for URL fingerprinting
    pub url_patterns: Vec<String>,
    /// Site root stripped from fingerprints for display
    pub base_url: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./axe-playwright-report"),
            merge_strategy: MergeStrategy::Best.name().to_string(),
            violation_thresholds: None,
            incomplete_thresholds: None,
            allow_failure: false,
            url_patterns: Vec::new(),
            base_url: None,
        }
    }
}

impl ReportConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> CoreResult<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(strategy) = lookup("MERGE_STRATEGY") {
            self.merge_strategy = strategy;
        }
        if let Some(raw) = lookup("VIOLATION_THRESHOLDS") {
            self.violation_thresholds = Some(raw);
        }
        if let Some(raw) = lookup("INCOMPLETE_THRESHOLDS") {
            self.incomplete_thresholds = Some(raw);
        }
        if let Some(raw) = lookup("ALLOW_FAILURE") {
            self.allow_failure = parse_flag("ALLOW_FAILURE", &raw)?;
        }
        if let Some(raw) = lookup("URL_PATTERNS") {
            self.url_patterns = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(url) = lookup("URL") {
            self.base_url = Some(url);
        }
        Ok(())
    }

    pub fn merge_strategy(&self) -> CoreResult<MergeStrategy> {
        self.merge_strategy.parse()
    }

    pub fn normalizer(&self) -> CoreResult<UrlNormalizer> {
        UrlNormalizer::with_patterns(&self.url_patterns)
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.output_dir.join(PAGES_DIR)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join("summary.json")
    }

    pub fn pages_index_path(&self) -> PathBuf {
        self.output_dir.join("pages.json")
    }
}

fn parse_flag(key: &str, raw: &str) -> CoreResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" | "" => Ok(false),
        other => Err(CoreError::Config(format!(
            "{}: expected a boolean, got '{}'",
            key, other
        ))),
    }
}
