//! Capability seam between the query engine and a memory-forensics backend.
//!
//! A [`Backend`] opens memory images; the resulting [`ImageHandle`] hands out
//! plain, owned object records. Records carry no references back into the
//! backend, so navigation (parent keys, hive root keys, key values) always
//! goes through the handle again.

pub mod snapshot;

use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The image could not be opened (missing file, bad format, no access).
    #[error("cannot open '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Any other backend-internal fault.
    #[error("{0}")]
    Internal(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Opens memory images.
pub trait Backend: Send + Sync {
    fn open(&self, path: &str) -> BackendResult<Arc<dyn ImageHandle>>;
}

/// An opened memory image. All calls are blocking and read-only.
pub trait ImageHandle: Send + Sync {
    /// Find a process by name. The backend's first-match policy is authoritative.
    fn process(&self, name: &str) -> BackendResult<Option<ProcessObject>>;

    /// All registry hives, in enumeration order.
    fn reg_hive_list(&self) -> BackendResult<Vec<RegistryHive>>;

    /// Registry key by full path.
    fn reg_key(&self, path: &str) -> BackendResult<Option<RegistryKey>>;

    /// Registry value by full path (`<key path>\<value name>`).
    fn reg_value(&self, path: &str) -> BackendResult<Option<RegistryValue>>;

    /// Values of `key`, in the order the hive stores them.
    fn reg_key_values(&self, key: &RegistryKey) -> BackendResult<Vec<RegistryValue>>;
}

/// A process snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessObject {
    pub pid: u32,
    pub ppid: u32,
    /// `_EPROCESS` address.
    pub eprocess: u64,
    pub dtb: u64,
    pub dtb_user: u64,
    pub state: u32,
    pub peb: u64,
    pub peb32: u32,
    pub is_wow64: bool,
    pub is_usermode: bool,
    pub name: String,
    pub fullname: String,
    pub pathuser: String,
    pub pathkernel: String,
    pub tp_memorymodel: u32,
    pub tp_system: u32,
    pub luid: u64,
    pub session: u32,
    pub sid: String,
    pub cmdline: String,
    pub integrity: u32,
}

/// A registry hive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryHive {
    pub name: String,
    pub name_short: String,
    pub path: String,
    pub size: u32,
    /// `_CMHIVE` address.
    pub addr: u64,
    pub addr_baseblock: u64,
    pub root_key_path: Option<String>,
    pub orphan_key_path: Option<String>,
}

/// A registry key. `parent_path` is a navigation hint, not ownership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryKey {
    pub name: String,
    pub path: String,
    pub parent_path: Option<String>,
    /// Last write time, Windows FILETIME.
    pub time_int: u64,
}

/// A registry value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryValue {
    pub name: String,
    pub path: String,
    /// Path of the key holding this value.
    pub parent_path: String,
    pub size: u32,
    /// `REG_*` type constant.
    pub value_type: u32,
    pub value: Vec<u8>,
}
