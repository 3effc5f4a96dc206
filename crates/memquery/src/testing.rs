//! Shared fixtures for unit tests.

use crate::backend::snapshot::SnapshotImage;
use crate::backend::{Backend, BackendError, BackendResult, ImageHandle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Snapshot of a small Windows 10 image.
pub const FIXTURE_SNAPSHOT: &str = r#"{
    "metadata": { "format": "1.0", "image": "win10-19041.raw" },
    "processes": [
        { "pid": 4, "name": "System", "va_eprocess": 18446644053909877888, "pa_dtb": 1757184 },
        { "pid": 812, "ppid": 640, "name": "svchost.exe", "is_user_mode": true },
        { "pid": 4280, "ppid": 4248, "name": "explorer.exe", "name_long": "explorer.exe",
          "va_eprocess": 18446644053912244352, "pa_dtb": 5930565632, "pa_dtb_user": 5930561536,
          "va_peb": 14229504, "is_user_mode": true, "is_wow64": false,
          "path_user": "C:\\Windows\\Explorer.EXE",
          "path_kernel": "\\Device\\HarddiskVolume4\\Windows\\explorer.exe",
          "tp_memorymodel": 3, "tp_system": 2, "luid": 225102, "session_id": 1,
          "sid": "S-1-5-21-3317879871-105768242-2947499445-1001",
          "cmdline": "C:\\Windows\\Explorer.EXE", "integrity_level": 3 },
        { "pid": 5012, "ppid": 4280, "name": "cmd.exe", "cmdline": "cmd.exe /c calc.exe", "is_user_mode": true }
    ],
    "hives": [
        { "name": "0xffffbc079b45f000-SAM-MACHINE_SAM",
          "name_short": "\\SystemRoot\\System32\\Config\\SAM",
          "path": "\\REGISTRY\\MACHINE\\SAM", "size": 65536,
          "va": 18446669339588685824, "va_baseblock": 18446669339588689920,
          "root_key": "HKLM\\SAM" },
        { "name": "0xffffbc079e436000-SOFTWARE-MACHINE_SOFTWARE",
          "name_short": "\\SystemRoot\\System32\\Config\\SOFTWARE",
          "path": "\\REGISTRY\\MACHINE\\SOFTWARE", "size": 83886080,
          "va": 18446669339638849536, "va_baseblock": 18446669339638857728,
          "root_key": "HKLM\\SOFTWARE", "orphan_key": "0xffffbc079e436000\\ORPHAN" },
        { "name": "0xffffbc07a1c2e000-settingsdat-A_{c4fac4f4-b28f-17e2-b8a7-4d3640adf5aa}",
          "name_short": "1h2txyewy\\Settings\\settings.dat",
          "path": "\\REGISTRY\\A\\{c4fac4f4-b28f-17e2-b8a7-4d3640adf5aa}", "size": 12288,
          "va": 18446669339683004416, "va_baseblock": 18446669339683008512 }
    ],
    "keys": [
        { "path": "HKLM\\SAM", "last_write": 131983260431204405 },
        { "path": "HKLM\\SOFTWARE", "last_write": 131983260431204405 },
        { "path": "0xffffbc079e436000\\ORPHAN" },
        { "path": "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion", "last_write": 131983260000000000 },
        { "path": "HKLM\\SOFTWARE\\Policies", "last_write": 131983260000000000,
          "values": [
              { "name": "Shared", "type": 4, "data": "01000000" },
              { "name": "Shared", "type": 1, "data": "41000000" }
          ] },
        { "path": "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run",
          "last_write": 131983260431204405,
          "values": [
              { "name": "SecurityHealth", "type": 2,
                "data": "2500500072006f006700720061006d00460069006c0065007300250000000000" },
              { "name": "OneDrive", "type": 1, "data": "22004300000000" }
          ] }
    ]
}"#;

pub fn fixture_image() -> SnapshotImage {
    SnapshotImage::new(vmmsnap::parse_snapshot_str(FIXTURE_SNAPSHOT).unwrap())
}

/// Backend serving the fixture for a fixed set of paths, counting opens.
pub struct CountingBackend {
    known: Vec<String>,
    opens: AtomicUsize,
    per_path: parking_lot::Mutex<HashMap<String, usize>>,
    delay: Option<std::time::Duration>,
}

impl CountingBackend {
    pub fn new(known: &[&str]) -> Self {
        CountingBackend {
            known: known.iter().map(|s| s.to_string()).collect(),
            opens: AtomicUsize::new(0),
            per_path: parking_lot::Mutex::new(HashMap::new()),
            delay: None,
        }
    }

    /// Make every open block for `delay`.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn opens_of(&self, path: &str) -> usize {
        self.per_path.lock().get(path).copied().unwrap_or(0)
    }
}

impl Backend for CountingBackend {
    fn open(&self, path: &str) -> BackendResult<Arc<dyn ImageHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.per_path.lock().entry(path.to_string()).or_default() += 1;
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if !self.known.iter().any(|k| k == path) {
            return Err(BackendError::Open {
                path: path.to_string(),
                reason: "no such image".to_string(),
            });
        }
        Ok(Arc::new(fixture_image()))
    }
}
