//! Attribute values returned by evaluation and their JSON form.
//!
//! JSON encoding:
//! - integers, booleans, strings: plain JSON scalars
//! - byte payloads: `{"encoding": "hex", "size": N, "data": "2500..."}`
//! - object references: `{"ref": "RegKey:Run", "kind": "regkey", "path": "HKLM\\..."}`
//!   (`path` omitted when the object has none)
//! - lists and maps: JSON arrays and objects of the above

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(u64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Ref(ObjectRef),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

/// Opaque, stable reference to a backend object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    #[serde(rename = "ref")]
    pub repr: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Serialize)]
struct BinaryPayload<'a> {
    encoding: &'static str,
    size: usize,
    data: &'a str,
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Int(n) => serializer.serialize_u64(*n),
            AttrValue::Bool(b) => serializer.serialize_bool(*b),
            AttrValue::Str(s) => serializer.serialize_str(s),
            AttrValue::Bytes(bytes) => BinaryPayload {
                encoding: "hex",
                size: bytes.len(),
                data: &hex::encode(bytes),
            }
            .serialize(serializer),
            AttrValue::Ref(r) => r.serialize(serializer),
            AttrValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AttrValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<u64> for AttrValue {
    fn from(n: u64) -> Self {
        AttrValue::Int(n)
    }
}

impl From<u32> for AttrValue {
    fn from(n: u32) -> Self {
        AttrValue::Int(n.into())
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}
