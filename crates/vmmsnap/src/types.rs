//! Record types for parsed snapshot data.
//!
//! Field names follow the vocabulary of the MemProcFS process and registry
//! APIs, which is what most snapshot producers export.

use serde::{Deserialize, Serialize};

/// Top-level snapshot file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub metadata: Metadata,
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
    #[serde(default)]
    pub hives: Vec<HiveRecord>,
    #[serde(default)]
    pub keys: Vec<KeyRecord>,
}

/// Snapshot metadata block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Format version, `1.x`.
    pub format: String,
    #[serde(default)]
    pub producer: Option<Producer>,
    /// Path or name of the memory image the snapshot was taken from.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
}

/// One process as seen in the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    #[serde(default)]
    pub ppid: u32,
    /// Short name, at most 15 characters (`_EPROCESS.ImageFileName`).
    pub name: String,
    /// Full name; falls back to `name` when empty.
    #[serde(default)]
    pub name_long: String,
    #[serde(default)]
    pub state: u32,
    #[serde(default)]
    pub va_eprocess: u64,
    #[serde(default)]
    pub pa_dtb: u64,
    #[serde(default)]
    pub pa_dtb_user: u64,
    #[serde(default)]
    pub va_peb: u64,
    #[serde(default)]
    pub va_peb32: u32,
    #[serde(default)]
    pub is_wow64: bool,
    #[serde(default)]
    pub is_user_mode: bool,
    #[serde(default)]
    pub path_user: String,
    #[serde(default)]
    pub path_kernel: String,
    #[serde(default)]
    pub tp_memorymodel: u32,
    #[serde(default)]
    pub tp_system: u32,
    #[serde(default)]
    pub luid: u64,
    #[serde(default)]
    pub session_id: u32,
    #[serde(default)]
    pub sid: String,
    #[serde(default)]
    pub cmdline: String,
    /// `VMMDLL_PROCESS_INTEGRITY_LEVEL` value.
    #[serde(default)]
    pub integrity_level: u32,
}

impl ProcessRecord {
    pub fn full_name(&self) -> &str {
        if self.name_long.is_empty() {
            &self.name
        } else {
            &self.name_long
        }
    }
}

/// One registry hive (`_CMHIVE`) found in the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HiveRecord {
    /// e.g. `0xffffbc079b45f000-SAM-MACHINE_SAM`
    pub name: String,
    #[serde(default)]
    pub name_short: String,
    /// Kernel object path, e.g. `\REGISTRY\MACHINE\SAM`.
    #[serde(default)]
    pub path: String,
    /// Size of the on-disk hive.
    #[serde(default)]
    pub size: u32,
    /// Address of the `_CMHIVE` object.
    #[serde(default)]
    pub va: u64,
    /// Address of the hive base block (`regf`).
    #[serde(default)]
    pub va_baseblock: u64,
    /// Full path of the hive's root key, if exported.
    #[serde(default)]
    pub root_key: Option<String>,
    /// Full path of the hive's orphan key, if exported.
    #[serde(default)]
    pub orphan_key: Option<String>,
}

/// One registry key with its values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Full path including the key name, components separated by `\`.
    pub path: String,
    /// Last write time as a Windows FILETIME.
    #[serde(default)]
    pub last_write: u64,
    #[serde(default)]
    pub values: Vec<ValueRecord>,
}

impl KeyRecord {
    /// Last path component.
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('\\');
        trimmed.rsplit('\\').next().unwrap_or(trimmed)
    }

    /// Path of the parent key, `None` for a top-level key.
    pub fn parent_path(&self) -> Option<&str> {
        let trimmed = self.path.trim_end_matches('\\');
        trimmed.rsplit_once('\\').map(|(parent, _)| parent)
    }

    /// Look up a value by name (case-insensitive, first match wins).
    pub fn value(&self, name: &str) -> Option<&ValueRecord> {
        self.values.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

/// One registry value. An empty name is the key's `(Default)` value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueRecord {
    #[serde(default)]
    pub name: String,
    /// `REG_*` type constant.
    #[serde(rename = "type", default)]
    pub value_type: u32,
    /// Raw value bytes, hex-encoded in the file.
    #[serde(default, with = "hex::serde")]
    pub data: Vec<u8>,
}

/// Registry value types.
pub mod reg_types {
    pub const REG_NONE: u32 = 0;
    pub const REG_SZ: u32 = 1;
    pub const REG_EXPAND_SZ: u32 = 2;
    pub const REG_BINARY: u32 = 3;
    pub const REG_DWORD: u32 = 4;
    pub const REG_DWORD_BIG_ENDIAN: u32 = 5;
    pub const REG_LINK: u32 = 6;
    pub const REG_MULTI_SZ: u32 = 7;
    pub const REG_QWORD: u32 = 11;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name_and_parent() {
        let key = KeyRecord {
            path: "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run".to_string(),
            ..Default::default()
        };
        assert_eq!(key.name(), "Run");
        assert_eq!(
            key.parent_path(),
            Some("HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion")
        );
    }

    #[test]
    fn test_top_level_key_has_no_parent() {
        let key = KeyRecord {
            path: "HKLM".to_string(),
            ..Default::default()
        };
        assert_eq!(key.name(), "HKLM");
        assert_eq!(key.parent_path(), None);
    }

    #[test]
    fn test_trailing_separator_ignored() {
        let key = KeyRecord {
            path: "HKLM\\SYSTEM\\".to_string(),
            ..Default::default()
        };
        assert_eq!(key.name(), "SYSTEM");
        assert_eq!(key.parent_path(), Some("HKLM"));
    }

    #[test]
    fn test_full_name_fallback() {
        let mut proc = ProcessRecord {
            pid: 4,
            name: "System".to_string(),
            ..Default::default()
        };
        assert_eq!(proc.full_name(), "System");
        proc.name_long = "System Idle".to_string();
        assert_eq!(proc.full_name(), "System Idle");
    }

    #[test]
    fn test_value_data_hex_roundtrip_field() {
        let json = r#"{ "name": "SecurityHealth", "type": 2, "data": "25005000" }"#;
        let value: ValueRecord = serde_json::from_str(json).unwrap();
        assert_eq!(value.value_type, reg_types::REG_EXPAND_SZ);
        assert_eq!(value.data, vec![0x25, 0x00, 0x50, 0x00]);
    }
}
