//! Query engine: session cache, root resolution and attribute evaluation.
//!
//! Every operation is a single synchronous attempt: parse the attribute
//! path, acquire the image handle, resolve the root object, evaluate.

pub mod error;
pub mod eval;
pub mod object;
pub mod path;
pub mod resolve;
pub mod session;
pub mod value;

use crate::backend::ImageHandle;
use error::QueryResult;
use object::{Object, RootKind};
use path::AttributePath;
use serde::Serialize;
use session::SessionCache;
use std::sync::Arc;
use tracing::{debug, warn};
use value::AttrValue;

/// One entry of the hive listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HiveDescriptor {
    /// Zero-based position, usable as a hive identifier.
    pub index: usize,
    pub name: String,
    pub name_short: String,
    pub path: String,
    pub size: u32,
    pub addr: u64,
    pub addr_baseblock: u64,
}

pub struct QueryEngine {
    sessions: Arc<SessionCache>,
}

impl QueryEngine {
    pub fn new(sessions: Arc<SessionCache>) -> Self {
        QueryEngine { sessions }
    }

    #[allow(dead_code)]
    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub fn get_process_attribute(
        &self,
        mempath: &str,
        process_name: &str,
        attributes: &str,
    ) -> QueryResult<AttrValue> {
        debug!("query: process '{}' attr '{}' in {}", process_name, attributes, mempath);
        self.run(mempath, RootKind::Process, attributes, |handle| {
            resolve::resolve_process(handle, process_name).map(Object::Process)
        })
        .inspect_err(|e| warn!("process '{}' attr '{}': {}", process_name, attributes, e))
    }

    pub fn get_reghive_attribute(
        &self,
        mempath: &str,
        hive_identifier: &str,
        attributes: &str,
    ) -> QueryResult<AttrValue> {
        debug!("query: hive '{}' attr '{}' in {}", hive_identifier, attributes, mempath);
        self.run(mempath, RootKind::Hive, attributes, |handle| {
            resolve::resolve_hive(handle, hive_identifier).map(Object::Hive)
        })
        .inspect_err(|e| warn!("hive '{}' attr '{}': {}", hive_identifier, attributes, e))
    }

    pub fn get_regkey_attribute(
        &self,
        mempath: &str,
        key_path: &str,
        attributes: &str,
    ) -> QueryResult<AttrValue> {
        debug!("query: key '{}' attr '{}' in {}", key_path, attributes, mempath);
        self.run(mempath, RootKind::Key, attributes, |handle| {
            resolve::resolve_key(handle, key_path).map(Object::Key)
        })
        .inspect_err(|e| warn!("key '{}' attr '{}': {}", key_path, attributes, e))
    }

    pub fn get_regvalue_attribute(
        &self,
        mempath: &str,
        value_path: &str,
        attributes: &str,
    ) -> QueryResult<AttrValue> {
        debug!("query: value '{}' attr '{}' in {}", value_path, attributes, mempath);
        self.run(mempath, RootKind::Value, attributes, |handle| {
            resolve::resolve_value(handle, value_path).map(Object::Value)
        })
        .inspect_err(|e| warn!("value '{}' attr '{}': {}", value_path, attributes, e))
    }

    /// Enumerate the image's hives in backend order.
    pub fn list_reghives(&self, mempath: &str) -> QueryResult<Vec<HiveDescriptor>> {
        debug!("query: hive list in {}", mempath);
        let result = self.sessions.acquire(mempath).and_then(|handle| {
            Ok(handle
                .reg_hive_list()?
                .into_iter()
                .enumerate()
                .map(|(index, h)| HiveDescriptor {
                    index,
                    name: h.name,
                    name_short: h.name_short,
                    path: h.path,
                    size: h.size,
                    addr: h.addr,
                    addr_baseblock: h.addr_baseblock,
                })
                .collect())
        });
        result.inspect_err(|e| warn!("hive list in {}: {}", mempath, e))
    }

    fn run<F>(&self, mempath: &str, kind: RootKind, attributes: &str, resolve: F) -> QueryResult<AttrValue>
    where
        F: FnOnce(&dyn ImageHandle) -> QueryResult<Object>,
    {
        let path = AttributePath::parse(attributes, kind)?;
        let handle = self.sessions.acquire(mempath)?;
        let root = resolve(handle.as_ref())?;
        eval::evaluate(handle.as_ref(), root, &path)
    }
}
