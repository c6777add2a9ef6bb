//! File-backed scan record store
//!
//! Records live one per file as `<id>.json` in a single directory, next to
//! any side artifacts (screenshots) named `<id>_<kind>_<n>.png`.

use crate::record::ScanRecord;
use crate::{CoreError, CoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A record together with where it was read from
#[derive(Debug, Clone)]
pub struct StoredRecord {
    /// File stem; after backfill this always equals `record.id`
    pub id: String,
    pub path: PathBuf,
    pub record: ScanRecord,
}

/// Directory of scan record JSON documents
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open an existing record directory
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(CoreError::StorageNotFound(dir));
        }
        Ok(Self { dir })
    }

    /// Open the directory, creating it when missing
    pub fn create(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names in the directory, sorted so enumeration is reproducible
    fn file_names(&self) -> CoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::StorageNotFound(self.dir.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read every `.json` record in the directory.
    ///
    /// Any file that fails to parse aborts the whole read. Records without an
    /// `id` get the file stem written back before they are returned.
    pub fn read_all(&self) -> CoreResult<Vec<StoredRecord>> {
        let mut records = Vec::new();
        for name in self.file_names()? {
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let path = self.dir.join(&name);
            records.push(self.load(stem, path)?);
        }
        debug!("Loaded {} scan records from {}", records.len(), self.dir.display());
        Ok(records)
    }

    /// Read a single record by id
    pub fn read_one(&self, id: &str) -> CoreResult<Option<StoredRecord>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.dir.join(format!("{}.json", id));
        if !path.is_file() {
            return Ok(None);
        }
        self.load(id, path).map(Some)
    }

    fn load(&self, stem: &str, path: PathBuf) -> CoreResult<StoredRecord> {
        let raw = fs::read_to_string(&path)?;
        let mut record: ScanRecord = serde_json::from_str(&raw).map_err(|source| {
            CoreError::MalformedRecord {
                path: path.clone(),
                source,
            }
        })?;

        let missing_id = record.id.as_deref().map_or(true, str::is_empty);
        if missing_id && !stem.is_empty() {
            info!("Backfilling missing id for {}", path.display());
            record.id = Some(stem.to_string());
            write_json(&path, &record)?;
        }

        Ok(StoredRecord {
            id: stem.to_string(),
            path,
            record,
        })
    }

    /// Write a record as `<id>.json`, returning the path written
    pub fn write(&self, record: &ScanRecord) -> CoreResult<PathBuf> {
        let id = record
            .id
            .as_deref()
            .ok_or_else(|| CoreError::Serialize("cannot store a record without an id".to_string()))?;
        if !is_valid_id(id) {
            return Err(CoreError::Serialize(format!(
                "record id {:?} is not a plain file name",
                id
            )));
        }
        let path = self.dir.join(format!("{}.json", id));
        write_json(&path, record)?;
        Ok(path)
    }

    /// Delete `<id>.json` and every `<id>_*` side artifact.
    ///
    /// Files that vanish between listing and removal are skipped. Returns the
    /// names actually removed. An empty id matches nothing.
    pub fn delete_artifacts(&self, id: &str) -> CoreResult<Vec<String>> {
        let mut removed = Vec::new();
        if id.is_empty() {
            return Ok(removed);
        }

        let record_name = format!("{}.json", id);
        let artifact_prefix = format!("{}_", id);
        for name in self.file_names()? {
            if name != record_name && !name.starts_with(&artifact_prefix) {
                continue;
            }
            match fs::remove_file(self.dir.join(&name)) {
                Ok(()) => {
                    debug!("Deleted {}", name);
                    removed.push(name);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

/// Ids become file names, so they must not reach outside the store
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

fn write_json(path: &Path, record: &ScanRecord) -> CoreResult<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| CoreError::Serialize(format!("{}: {}", path.display(), e)))?;
    fs::write(path, json)?;
    Ok(())
}
