//! Merge strategy selection
//!
//! Pure functions: given the loaded records in enumeration order, return the
//! ids that should be deleted. No filesystem access happens here.

use crate::record::ScanRecord;
use crate::storage::StoredRecord;
use crate::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Identity used by the exact strategy
#[derive(Serialize)]
struct ExactKey<'a> {
    url: &'a str,
    incomplete: Vec<Value>,
    violations: Vec<Value>,
}

impl<'a> ExactKey<'a> {
    fn of(record: &'a ScanRecord) -> Self {
        Self {
            url: &record.url,
            incomplete: ScanRecord::flattened_targets(&record.incomplete),
            violations: ScanRecord::flattened_targets(&record.violations),
        }
    }

    fn encode(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialize(e.to_string()))
    }
}

/// First record seen per (url, incomplete targets, violation targets) wins.
pub fn select_exact(records: &[StoredRecord]) -> CoreResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut losers = Vec::new();

    for stored in records {
        let key = ExactKey::of(&stored.record).encode()?;
        if !seen.insert(key) {
            losers.push(stored.id.clone());
        }
    }

    Ok(losers)
}

/// Keep one record per fingerprint: most violations, then most incomplete,
/// then latest timestamp. Records without a fingerprint are left alone.
pub fn select_best(records: &[StoredRecord]) -> Vec<String> {
    let mut incumbents: HashMap<&str, &StoredRecord> = HashMap::new();
    let mut losers = Vec::new();

    for stored in records {
        let Some(fingerprint) = stored.record.fingerprint.as_deref() else {
            continue;
        };

        match incumbents.get(fingerprint).copied() {
            None => {
                incumbents.insert(fingerprint, stored);
            }
            Some(existing) => {
                if outranks(&stored.record, &existing.record) {
                    losers.push(existing.id.clone());
                    incumbents.insert(fingerprint, stored);
                } else {
                    losers.push(stored.id.clone());
                }
            }
        }
    }

    losers
}

/// Strict improvement of `candidate` over `incumbent`
pub fn outranks(candidate: &ScanRecord, incumbent: &ScanRecord) -> bool {
    match candidate.violations.len().cmp(&incumbent.violations.len()) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }
    match candidate.incomplete.len().cmp(&incumbent.incomplete.len()) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }
    // Unparseable timestamps never win the tie-break.
    match (candidate.captured_at(), incumbent.captured_at()) {
        (Some(c), Some(i)) => c > i,
        _ => false,
    }
}
