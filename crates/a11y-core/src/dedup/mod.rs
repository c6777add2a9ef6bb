//! Scan record deduplication
//!
//! Repeated visits to the same page produce several records. A merge
//! strategy picks which of them stay on disk; the losers and their side
//! artifacts are deleted before anything downstream reads the directory.

pub mod engine;

pub use engine::{select_best, select_exact};

use crate::storage::{RecordStore, StoredRecord};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// How duplicate records are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Keep everything
    None,
    /// Drop records identical in url and violation/incomplete targets
    Exact,
    /// Keep the most informative record per fingerprint
    #[default]
    Best,
}

impl MergeStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            MergeStrategy::None => "none",
            MergeStrategy::Exact => "exact",
            MergeStrategy::Best => "best",
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MergeStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MergeStrategy::None),
            "exact" => Ok(MergeStrategy::Exact),
            "best" => Ok(MergeStrategy::Best),
            other => Err(CoreError::Config(format!(
                "merge_strategy: unknown strategy '{}' (expected none, exact or best)",
                other
            ))),
        }
    }
}

/// What a dedup run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupOutcome {
    pub strategy: MergeStrategy,
    pub examined: usize,
    /// Ids of records removed, in deletion order
    pub deleted: Vec<String>,
    /// Every file removed, records and side artifacts
    pub files_removed: usize,
}

/// Apply `strategy` to `records`, deleting the losers from `store`.
///
/// Returns once every deletion has completed.
pub fn deduplicate(
    strategy: MergeStrategy,
    store: &RecordStore,
    records: Vec<StoredRecord>,
) -> CoreResult<DedupOutcome> {
    info!("Merging reports using strategy: {}", strategy.name().to_uppercase());

    let examined = records.len();
    let losers = match strategy {
        MergeStrategy::None => Vec::new(),
        MergeStrategy::Exact => select_exact(&records)?,
        MergeStrategy::Best => select_best(&records),
    };

    let mut files_removed = 0;
    for id in &losers {
        files_removed += store.delete_artifacts(id)?.len();
    }

    if !losers.is_empty() {
        info!(
            "Removed {} of {} records ({} files)",
            losers.len(),
            examined,
            files_removed
        );
    }

    Ok(DedupOutcome {
        strategy,
        examined,
        deleted: losers,
        files_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;

    fn write(dir: &Path, id: &str, doc: Value) {
        fs::write(dir.join(format!("{id}.json")), doc.to_string()).unwrap();
    }

    fn surviving(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn page(id: &str, path: Option<&str>, violations: usize, ts: &str) -> Value {
        let issues: Vec<Value> = (0..violations)
            .map(|i| json!({"id": format!("rule-{i}"), "nodes": [{"impact": "minor", "target": ["#x"]}]}))
            .collect();
        let mut doc = json!({
            "id": id,
            "url": "https://shop.test/user/1",
            "timestamp": ts,
            "violations": issues,
            "incomplete": [],
        });
        if let Some(path) = path {
            doc["path"] = json!(path);
        }
        doc
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("BEST".parse::<MergeStrategy>().unwrap(), MergeStrategy::Best);
        assert_eq!(" exact ".parse::<MergeStrategy>().unwrap(), MergeStrategy::Exact);
        assert_eq!("none".parse::<MergeStrategy>().unwrap(), MergeStrategy::None);
        assert!("fuzzy".parse::<MergeStrategy>().is_err());
        assert_eq!(MergeStrategy::default(), MergeStrategy::Best);
    }

    #[test]
    fn test_none_keeps_everything() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a", page("a", Some("/p"), 1, "2024-01-01T00:00:00Z"));
        write(tmp.path(), "b", page("b", Some("/p"), 1, "2024-01-01T00:00:00Z"));

        let store = RecordStore::open(tmp.path()).unwrap();
        let outcome = deduplicate(MergeStrategy::None, &store, store.read_all().unwrap()).unwrap();
        assert!(outcome.deleted.is_empty());
        assert_eq!(surviving(tmp.path()).len(), 2);
    }

    #[test]
    fn test_best_removes_loser_and_screenshots() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a", page("a", Some("/p"), 1, "2024-01-01T00:00:00Z"));
        write(tmp.path(), "b", page("b", Some("/p"), 3, "2024-01-01T00:00:00Z"));
        fs::write(tmp.path().join("a_violations_1.png"), b"png").unwrap();

        let store = RecordStore::open(tmp.path()).unwrap();
        let outcome = deduplicate(MergeStrategy::Best, &store, store.read_all().unwrap()).unwrap();

        assert_eq!(outcome.deleted, vec!["a".to_string()]);
        assert_eq!(outcome.files_removed, 2);
        assert_eq!(surviving(tmp.path()), vec!["b.json".to_string()]);
    }

    #[test]
    fn test_best_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a", page("a", Some("/p"), 2, "2024-01-01T00:00:00Z"));
        write(tmp.path(), "b", page("b", Some("/p"), 2, "2024-01-02T00:00:00Z"));
        write(tmp.path(), "c", page("c", Some("/q"), 0, "2024-01-01T00:00:00Z"));
        write(tmp.path(), "d", page("d", None, 9, "2024-01-03T00:00:00Z"));

        let store = RecordStore::open(tmp.path()).unwrap();
        let first = deduplicate(MergeStrategy::Best, &store, store.read_all().unwrap()).unwrap();
        assert_eq!(first.deleted, vec!["a".to_string()]);
        let after_first = surviving(tmp.path());

        let second = deduplicate(MergeStrategy::Best, &store, store.read_all().unwrap()).unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(surviving(tmp.path()), after_first);
    }

    #[test]
    fn test_exact_keeps_one_of_identical_pages() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a", page("a", Some("/one"), 1, "2024-01-01T00:00:00Z"));
        write(tmp.path(), "b", page("b", Some("/two"), 1, "2024-01-02T00:00:00Z"));

        let store = RecordStore::open(tmp.path()).unwrap();
        let outcome = deduplicate(MergeStrategy::Exact, &store, store.read_all().unwrap()).unwrap();
        assert_eq!(outcome.deleted.len(), 1);
        assert_eq!(surviving(tmp.path()).len(), 1);
    }

    #[test]
    fn test_best_keeps_winner_whose_id_extends_loser() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "home", page("home", Some("/home"), 0, "2024-01-01T00:00:00Z"));
        write(tmp.path(), "home2", page("home2", Some("/home"), 3, "2024-01-01T00:00:00Z"));
        fs::write(tmp.path().join("home_violations_1.png"), b"png").unwrap();
        fs::write(tmp.path().join("home2_violations_1.png"), b"png").unwrap();

        let store = RecordStore::open(tmp.path()).unwrap();
        let outcome = deduplicate(MergeStrategy::Best, &store, store.read_all().unwrap()).unwrap();

        assert_eq!(outcome.deleted, vec!["home".to_string()]);
        assert_eq!(outcome.files_removed, 2);
        assert_eq!(
            surviving(tmp.path()),
            vec!["home2.json".to_string(), "home2_violations_1.png".to_string()]
        );
    }
}
