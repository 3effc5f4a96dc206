//! Backend serving objects from `vmmsnap` snapshot files.

use super::{
    Backend, BackendError, BackendResult, ImageHandle, ProcessObject, RegistryHive, RegistryKey,
    RegistryValue,
};
use std::sync::Arc;
use tracing::{debug, info};
use vmmsnap::{HiveRecord, KeyRecord, ProcessRecord, Snapshot, ValueRecord};

/// Opens `.json` / `.json.xz` snapshot files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapshotBackend;

impl Backend for SnapshotBackend {
    fn open(&self, path: &str) -> BackendResult<Arc<dyn ImageHandle>> {
        info!("Opening snapshot: {}", path);
        let snapshot = vmmsnap::parse_snapshot_file(path).map_err(|e| BackendError::Open {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Arc::new(SnapshotImage::new(snapshot)))
    }
}

/// One opened snapshot.
pub struct SnapshotImage {
    snapshot: Snapshot,
}

impl SnapshotImage {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotImage { snapshot }
    }
}

impl ImageHandle for SnapshotImage {
    fn process(&self, name: &str) -> BackendResult<Option<ProcessObject>> {
        Ok(self.snapshot.process_by_name(name).map(process_object))
    }

    fn reg_hive_list(&self) -> BackendResult<Vec<RegistryHive>> {
        Ok(self.snapshot.hives().iter().map(hive_object).collect())
    }

    fn reg_key(&self, path: &str) -> BackendResult<Option<RegistryKey>> {
        Ok(self.snapshot.key(path).map(key_object))
    }

    fn reg_value(&self, path: &str) -> BackendResult<Option<RegistryValue>> {
        self.snapshot
            .value(path)
            .map(|(key, value)| value_object(key, value))
            .transpose()
    }

    fn reg_key_values(&self, key: &RegistryKey) -> BackendResult<Vec<RegistryValue>> {
        let record = self.snapshot.key(&key.path).ok_or_else(|| {
            BackendError::Internal(format!("key '{}' vanished from snapshot", key.path))
        })?;
        debug!("snapshot: key '{}' has {} values", record.path, record.values.len());
        record
            .values
            .iter()
            .map(|v| value_object(record, v))
            .collect()
    }
}

fn process_object(p: &ProcessRecord) -> ProcessObject {
    ProcessObject {
        pid: p.pid,
        ppid: p.ppid,
        eprocess: p.va_eprocess,
        dtb: p.pa_dtb,
        dtb_user: p.pa_dtb_user,
        state: p.state,
        peb: p.va_peb,
        peb32: p.va_peb32,
        is_wow64: p.is_wow64,
        is_usermode: p.is_user_mode,
        name: p.name.clone(),
        fullname: p.full_name().to_string(),
        pathuser: p.path_user.clone(),
        pathkernel: p.path_kernel.clone(),
        tp_memorymodel: p.tp_memorymodel,
        tp_system: p.tp_system,
        luid: p.luid,
        session: p.session_id,
        sid: p.sid.clone(),
        cmdline: p.cmdline.clone(),
        integrity: p.integrity_level,
    }
}

fn hive_object(h: &HiveRecord) -> RegistryHive {
    RegistryHive {
        name: h.name.clone(),
        name_short: h.name_short.clone(),
        path: h.path.clone(),
        size: h.size,
        addr: h.va,
        addr_baseblock: h.va_baseblock,
        root_key_path: h.root_key.clone(),
        orphan_key_path: h.orphan_key.clone(),
    }
}

fn key_object(k: &KeyRecord) -> RegistryKey {
    RegistryKey {
        name: k.name().to_string(),
        path: k.path.trim_end_matches('\\').to_string(),
        parent_path: k.parent_path().map(str::to_string),
        time_int: k.last_write,
    }
}

fn value_size(len: usize, path: &str) -> BackendResult<u32> {
    u32::try_from(len).map_err(|_| {
        BackendError::Internal(format!("value '{}' data of {} bytes exceeds u32 size", path, len))
    })
}

fn value_object(key: &KeyRecord, v: &ValueRecord) -> BackendResult<RegistryValue> {
    let key_path = key.path.trim_end_matches('\\');
    let path = format!("{}\\{}", key_path, v.name);
    Ok(RegistryValue {
        name: v.name.clone(),
        size: value_size(v.data.len(), &path)?,
        path,
        parent_path: key_path.to_string(),
        value_type: v.value_type,
        value: v.data.clone(),
    })
}
