//! Indexed, read-only view over a parsed snapshot.
//!
//! Registry paths are matched case-insensitively, like the Windows
//! configuration manager does. When a snapshot lists the same path twice the
//! first entry wins.

use crate::error::{SnapshotError, SnapshotResult};
use crate::types::{HiveRecord, KeyRecord, Metadata, ProcessRecord, SnapshotFile, ValueRecord};
use std::collections::HashMap;
use tracing::debug;

/// A parsed snapshot with lookup indexes.
#[derive(Debug, Clone)]
pub struct Snapshot {
    file: SnapshotFile,
    /// Normalized key path → index into `file.keys`.
    key_index: HashMap<String, usize>,
}

/// Lowercase and drop trailing separators.
fn normalize_key_path(path: &str) -> String {
    path.trim_end_matches('\\').to_lowercase()
}

impl Snapshot {
    /// Build the indexes. Fails on keys with an empty path.
    pub fn new(file: SnapshotFile) -> SnapshotResult<Self> {
        let mut key_index = HashMap::with_capacity(file.keys.len());
        for (i, key) in file.keys.iter().enumerate() {
            let normalized = normalize_key_path(&key.path);
            if normalized.is_empty() {
                return Err(SnapshotError::Invalid(format!("key #{} has an empty path", i)));
            }
            if key_index.contains_key(&normalized) {
                debug!("snapshot: duplicate key path '{}' ignored", key.path);
                continue;
            }
            key_index.insert(normalized, i);
        }

        debug!(
            "snapshot: {} processes, {} hives, {} keys",
            file.processes.len(),
            file.hives.len(),
            key_index.len()
        );

        Ok(Snapshot { file, key_index })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.file.metadata
    }

    pub fn processes(&self) -> &[ProcessRecord] {
        &self.file.processes
    }

    /// First process (in snapshot order) whose short name matches, ignoring case.
    pub fn process_by_name(&self, name: &str) -> Option<&ProcessRecord> {
        self.file
            .processes
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn process_by_pid(&self, pid: u32) -> Option<&ProcessRecord> {
        self.file.processes.iter().find(|p| p.pid == pid)
    }

    /// Hives in snapshot order.
    pub fn hives(&self) -> &[HiveRecord] {
        &self.file.hives
    }

    /// Look up a key by its full path.
    pub fn key(&self, path: &str) -> Option<&KeyRecord> {
        self.key_index
            .get(&normalize_key_path(path))
            .map(|&i| &self.file.keys[i])
    }

    /// Parent of `key`, if the snapshot contains it.
    pub fn parent_key(&self, key: &KeyRecord) -> Option<&KeyRecord> {
        key.parent_path().and_then(|p| self.key(p))
    }

    /// Look up a value by its full path (`<key path>\<value name>`).
    ///
    /// A path ending in `\` addresses the key's `(Default)` value.
    pub fn value(&self, path: &str) -> Option<(&KeyRecord, &ValueRecord)> {
        let (key_path, value_name) = path.rsplit_once('\\')?;
        let key = self.key(key_path)?;
        key.value(value_name).map(|v| (key, v))
    }
}
