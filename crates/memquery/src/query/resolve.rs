//! Root object resolution, one strategy per object kind.

use crate::backend::{ImageHandle, ProcessObject, RegistryHive, RegistryKey, RegistryValue};
use crate::query::error::{QueryError, QueryResult};
use tracing::debug;

/// How a caller-supplied hive identifier is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HiveSelector {
    /// Pure decimal: zero-based index into the enumerated hive list.
    Index(usize),
    /// `0x`-prefixed hex: `_CMHIVE` address.
    Address(u64),
    /// Anything else: exact name/short name/path, then name substring.
    Name(String),
}

impl HiveSelector {
    pub fn parse(identifier: &str) -> Self {
        let id = identifier.trim();
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = id.parse::<usize>() {
                return HiveSelector::Index(index);
            }
        }
        if let Some(hex) = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
            if let Ok(addr) = u64::from_str_radix(hex, 16) {
                return HiveSelector::Address(addr);
            }
        }
        HiveSelector::Name(id.to_string())
    }

    fn select(&self, hives: Vec<RegistryHive>) -> Option<RegistryHive> {
        match self {
            HiveSelector::Index(i) => hives.into_iter().nth(*i),
            HiveSelector::Address(addr) => hives.into_iter().find(|h| h.addr == *addr),
            HiveSelector::Name(name) => {
                let exact = hives.iter().position(|h| {
                    h.name.eq_ignore_ascii_case(name)
                        || h.name_short.eq_ignore_ascii_case(name)
                        || h.path.eq_ignore_ascii_case(name)
                });
                let lowered = name.to_lowercase();
                let found = exact.or_else(|| {
                    hives
                        .iter()
                        .position(|h| h.name.to_lowercase().contains(&lowered))
                });
                found.and_then(|i| hives.into_iter().nth(i))
            }
        }
    }
}

pub fn resolve_process(handle: &dyn ImageHandle, name: &str) -> QueryResult<ProcessObject> {
    handle
        .process(name)?
        .ok_or_else(|| QueryError::NotFound(format!("process '{}' not found", name)))
}

pub fn resolve_hive(handle: &dyn ImageHandle, identifier: &str) -> QueryResult<RegistryHive> {
    let selector = HiveSelector::parse(identifier);
    if let HiveSelector::Name(name) = &selector {
        if name.is_empty() {
            return Err(QueryError::NotFound("empty hive identifier".to_string()));
        }
    }

    let hives = handle.reg_hive_list()?;
    let count = hives.len();
    debug!("resolve: hive {:?} among {} hives", selector, count);

    selector.select(hives).ok_or_else(|| match selector {
        HiveSelector::Index(i) => QueryError::NotFound(format!(
            "hive index {} out of range ({} hives, zero-based)",
            i, count
        )),
        HiveSelector::Address(addr) => {
            QueryError::NotFound(format!("no hive at address {:#x}", addr))
        }
        HiveSelector::Name(name) => QueryError::NotFound(format!("hive '{}' not found", name)),
    })
}

pub fn resolve_key(handle: &dyn ImageHandle, path: &str) -> QueryResult<RegistryKey> {
    handle
        .reg_key(path)?
        .ok_or_else(|| QueryError::NotFound(format!("registry key '{}' not found", path)))
}

pub fn resolve_value(handle: &dyn ImageHandle, path: &str) -> QueryResult<RegistryValue> {
    handle
        .reg_value(path)?
        .ok_or_else(|| QueryError::NotFound(format!("registry value '{}' not found", path)))
}
