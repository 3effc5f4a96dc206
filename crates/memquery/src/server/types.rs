//! Request types for MCP tools.

use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt;

/// Deserialize an optional u64 that accepts numbers or decimal strings ("30").
fn deserialize_optional_secs<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    let val: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match val {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a non-negative whole number of seconds")),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(de::Error::custom),
        _ => Err(de::Error::custom("expected number or numeric string")),
    }
}

/// Hive identifier: an integer index, or a string (decimal index, `0x` address, or name).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum HiveIdentifier {
    Index(u64),
    Name(String),
}

impl fmt::Display for HiveIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HiveIdentifier::Index(i) => write!(f, "{}", i),
            HiveIdentifier::Name(s) => f.write_str(s),
        }
    }
}

/// Request for a process attribute.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProcessAttributeRequest {
    /// Path to the memory image (snapshot file).
    pub mempath: String,
    /// Process name, e.g. "explorer.exe". The first matching process is used.
    pub process_name: String,
    /// Dotted attribute path, e.g. "pid" or "process.cmdline".
    pub attributes: String,
    /// Optional time limit in seconds (0 disables the server default).
    #[serde(default, deserialize_with = "deserialize_optional_secs")]
    pub timeout_secs: Option<u64>,
}

/// Request for a registry hive attribute.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegHiveAttributeRequest {
    /// Path to the memory image (snapshot file).
    pub mempath: String,
    /// Zero-based index (integer or decimal string), "0x" hive address, or hive name.
    pub hive_identifier: HiveIdentifier,
    /// Dotted attribute path, e.g. "path" or "rootkey.name".
    pub attributes: String,
    /// Optional time limit in seconds (0 disables the server default).
    #[serde(default, deserialize_with = "deserialize_optional_secs")]
    pub timeout_secs: Option<u64>,
}

/// Request for a registry key attribute.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegKeyAttributeRequest {
    /// Path to the memory image (snapshot file).
    pub mempath: String,
    /// Full key path, e.g. "HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run".
    pub key_path: String,
    /// Dotted attribute path, e.g. "time_str", "parent.name" or "values_dict()".
    pub attributes: String,
    /// Optional time limit in seconds (0 disables the server default).
    #[serde(default, deserialize_with = "deserialize_optional_secs")]
    pub timeout_secs: Option<u64>,
}

/// Request for a registry value attribute.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegValueAttributeRequest {
    /// Path to the memory image (snapshot file).
    pub mempath: String,
    /// Full value path: key path, backslash, value name.
    pub value_path: String,
    /// Dotted attribute path, e.g. "type" or "value".
    pub attributes: String,
    /// Optional time limit in seconds (0 disables the server default).
    #[serde(default, deserialize_with = "deserialize_optional_secs")]
    pub timeout_secs: Option<u64>,
}

/// Request for the hive listing.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegHiveListRequest {
    /// Path to the memory image (snapshot file).
    pub mempath: String,
    /// Optional time limit in seconds (0 disables the server default).
    #[serde(default, deserialize_with = "deserialize_optional_secs")]
    pub timeout_secs: Option<u64>,
}
