//! Attribute path evaluation over an explicit dispatch table.
//!
//! Every object kind declares its readable properties and callable
//! zero-argument accessors as static tables. A path segment is looked up in
//! the table of the current object's kind and nothing else is reachable:
//! there is no expression evaluation of caller input.

use crate::backend::{ImageHandle, ProcessObject, RegistryHive, RegistryKey, RegistryValue};
use crate::query::error::{QueryError, QueryResult};
use crate::query::object::Object;
use crate::query::path::{AttributePath, Segment};
use crate::query::value::AttrValue;
use std::collections::BTreeMap;
use tracing::debug;

/// Result of one property read.
enum Step {
    Value(AttrValue),
    Object(Object),
}

type Getter<T> = fn(&T, &dyn ImageHandle) -> QueryResult<Step>;

fn int(n: impl Into<u64>) -> QueryResult<Step> {
    Ok(Step::Value(AttrValue::Int(n.into())))
}

fn text(s: &str) -> QueryResult<Step> {
    Ok(Step::Value(AttrValue::Str(s.to_string())))
}

fn flag(b: bool) -> QueryResult<Step> {
    Ok(Step::Value(AttrValue::Bool(b)))
}

const PROCESS_PROPERTIES: &[(&str, Getter<ProcessObject>)] = &[
    ("pid", |p, _| int(p.pid)),
    ("ppid", |p, _| int(p.ppid)),
    ("eprocess", |p, _| int(p.eprocess)),
    ("dtb", |p, _| int(p.dtb)),
    ("dtb_user", |p, _| int(p.dtb_user)),
    ("state", |p, _| int(p.state)),
    ("peb", |p, _| int(p.peb)),
    ("peb32", |p, _| int(p.peb32)),
    ("is_wow64", |p, _| flag(p.is_wow64)),
    ("is_usermode", |p, _| flag(p.is_usermode)),
    ("name", |p, _| text(&p.name)),
    ("fullname", |p, _| text(&p.fullname)),
    ("pathuser", |p, _| text(&p.pathuser)),
    ("pathkernel", |p, _| text(&p.pathkernel)),
    ("tp_memorymodel", |p, _| int(p.tp_memorymodel)),
    ("tp_system", |p, _| int(p.tp_system)),
    ("luid", |p, _| int(p.luid)),
    ("session", |p, _| int(p.session)),
    ("sid", |p, _| text(&p.sid)),
    ("cmdline", |p, _| text(&p.cmdline)),
    ("integrity", |p, _| int(p.integrity)),
    ("maps", |p, _| Ok(Step::Object(Object::ProcessMaps { pid: p.pid }))),
    ("memory", |p, _| Ok(Step::Object(Object::VirtualMemory { pid: p.pid }))),
];

const HIVE_PROPERTIES: &[(&str, Getter<RegistryHive>)] = &[
    ("name", |h, _| text(&h.name)),
    ("name_short", |h, _| text(&h.name_short)),
    ("path", |h, _| text(&h.path)),
    ("size", |h, _| int(h.size)),
    ("addr", |h, _| int(h.addr)),
    ("addr_baseblock", |h, _| int(h.addr_baseblock)),
    ("rootkey", |h, handle| hive_key(handle, h, h.root_key_path.as_deref(), "root")),
    ("orphankey", |h, handle| hive_key(handle, h, h.orphan_key_path.as_deref(), "orphan")),
    ("memory", |h, _| Ok(Step::Object(Object::HiveMemory { addr: h.addr }))),
];

const KEY_PROPERTIES: &[(&str, Getter<RegistryKey>)] = &[
    ("name", |k, _| text(&k.name)),
    ("path", |k, _| text(&k.path)),
    ("parent", |k, handle| parent_key(handle, k.parent_path.as_deref(), &k.path)),
    ("time_int", |k, _| int(k.time_int)),
    ("time_str", |k, _| Ok(Step::Value(AttrValue::Str(filetime_to_string(k.time_int))))),
];

/// Zero-argument accessors, valid only as the final segment on a key root.
const KEY_METHODS: &[(&str, Getter<RegistryKey>)] = &[
    ("values", |k, handle| key_values(handle, k)),
    ("values_dict", |k, handle| key_values_dict(handle, k)),
];

const VALUE_PROPERTIES: &[(&str, Getter<RegistryValue>)] = &[
    ("name", |v, _| text(&v.name)),
    ("path", |v, _| text(&v.path)),
    ("parent", |v, handle| parent_key(handle, Some(v.parent_path.as_str()), &v.path)),
    ("size", |v, _| int(v.size)),
    ("type", |v, _| int(v.value_type)),
    ("value", |v, _| Ok(Step::Value(AttrValue::Bytes(v.value.clone())))),
];

fn hive_key(
    handle: &dyn ImageHandle,
    hive: &RegistryHive,
    path: Option<&str>,
    which: &str,
) -> QueryResult<Step> {
    let path = path.ok_or_else(|| {
        QueryError::NotFound(format!("hive '{}' has no {} key", hive.name, which))
    })?;
    let key = handle.reg_key(path)?.ok_or_else(|| {
        QueryError::BackendFailure(format!(
            "{} key '{}' of hive '{}' cannot be read",
            which, path, hive.name
        ))
    })?;
    Ok(Step::Object(Object::Key(key)))
}

fn parent_key(handle: &dyn ImageHandle, parent: Option<&str>, child: &str) -> QueryResult<Step> {
    let parent = parent
        .ok_or_else(|| QueryError::NotFound(format!("'{}' has no parent key", child)))?;
    let key = handle.reg_key(parent)?.ok_or_else(|| {
        QueryError::NotFound(format!("parent key '{}' of '{}' not found", parent, child))
    })?;
    Ok(Step::Object(Object::Key(key)))
}

fn key_values(handle: &dyn ImageHandle, key: &RegistryKey) -> QueryResult<Step> {
    let values = handle.reg_key_values(key)?;
    Ok(Step::Value(AttrValue::List(
        values
            .into_iter()
            .map(|v| AttrValue::Ref(Object::Value(v).to_ref()))
            .collect(),
    )))
}

fn key_values_dict(handle: &dyn ImageHandle, key: &RegistryKey) -> QueryResult<Step> {
    let mut map = BTreeMap::new();
    for v in handle.reg_key_values(key)? {
        if map.contains_key(&v.name) {
            debug!("eval: duplicate value name '{}' under '{}' ignored", v.name, key.path);
            continue;
        }
        map.insert(v.name.clone(), AttrValue::Ref(Object::Value(v).to_ref()));
    }
    Ok(Step::Value(AttrValue::Map(map)))
}

/// Format a Windows FILETIME (100ns since 1601-01-01) as `YYYY-MM-DD HH:MM:SS UTC`.
///
/// Zero (unset) formats as the FILETIME epoch, `1601-01-01 00:00:00 UTC`.
pub fn filetime_to_string(filetime: u64) -> String {
    // Windows epoch offset from Unix epoch: 11644473600 seconds
    const WINDOWS_EPOCH_OFFSET: i64 = 11_644_473_600;
    const UNSET: &str = "1601-01-01 00:00:00 UTC";

    if filetime == 0 {
        return UNSET.to_string();
    }
    // at most ~1.8e12 seconds, fits i64
    let unix_seconds = (filetime / 10_000_000) as i64 - WINDOWS_EPOCH_OFFSET;

    chrono::DateTime::from_timestamp(unix_seconds, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| UNSET.to_string())
}

fn lookup<T>(table: &[(&str, Getter<T>)], name: &str) -> Option<Getter<T>> {
    table.iter().find(|(n, _)| *n == name).map(|(_, g)| *g)
}

fn names<T>(table: &[(&'static str, Getter<T>)]) -> Vec<&'static str> {
    table.iter().map(|(n, _)| *n).collect()
}

/// Declared properties and accessors of the object's kind.
fn surface(obj: &Object) -> (Vec<&'static str>, Vec<&'static str>) {
    match obj {
        Object::Process(_) => (names(PROCESS_PROPERTIES), vec![]),
        Object::Hive(_) => (names(HIVE_PROPERTIES), vec![]),
        Object::Key(_) => (names(KEY_PROPERTIES), names(KEY_METHODS)),
        Object::Value(_) => (names(VALUE_PROPERTIES), vec![]),
        Object::ProcessMaps { .. } | Object::VirtualMemory { .. } | Object::HiveMemory { .. } => {
            (vec![], vec![])
        }
    }
}

fn describe_surface(obj: &Object) -> String {
    let (props, methods) = surface(obj);
    match (props.is_empty(), methods.is_empty()) {
        (true, true) => format!("{} exposes no attributes", obj.kind()),
        (false, true) => format!("{} properties: {}", obj.kind(), props.join(", ")),
        _ => format!(
            "{} properties: {}; accessors: {}",
            obj.kind(),
            props.join(", "),
            methods.join(", ")
        ),
    }
}

/// Apply one segment to `obj`.
///
/// `accessor_allowed` holds only for the single segment of a path on a
/// registry key root.
fn apply(
    handle: &dyn ImageHandle,
    obj: &Object,
    seg: &Segment,
    accessor_allowed: bool,
    raw: &str,
) -> QueryResult<Step> {
    let is_property = match obj {
        Object::Process(_) => lookup(PROCESS_PROPERTIES, &seg.name).is_some(),
        Object::Hive(_) => lookup(HIVE_PROPERTIES, &seg.name).is_some(),
        Object::Key(_) => lookup(KEY_PROPERTIES, &seg.name).is_some(),
        Object::Value(_) => lookup(VALUE_PROPERTIES, &seg.name).is_some(),
        _ => false,
    };

    if is_property {
        if seg.call {
            return Err(QueryError::invalid_attribute(
                raw,
                format!("'{}' is a property of {}, not a callable accessor", seg.name, obj.kind()),
            ));
        }
        let read = match obj {
            Object::Process(p) => lookup(PROCESS_PROPERTIES, &seg.name).map(|g| g(p, handle)),
            Object::Hive(h) => lookup(HIVE_PROPERTIES, &seg.name).map(|g| g(h, handle)),
            Object::Key(k) => lookup(KEY_PROPERTIES, &seg.name).map(|g| g(k, handle)),
            Object::Value(v) => lookup(VALUE_PROPERTIES, &seg.name).map(|g| g(v, handle)),
            _ => None,
        };
        if let Some(result) = read {
            return result;
        }
    }

    let method = match obj {
        Object::Key(k) => lookup(KEY_METHODS, &seg.name).map(|m| (m, k)),
        _ => None,
    };

    match method {
        Some((m, k)) if accessor_allowed => m(k, handle),
        Some(_) => Err(QueryError::invalid_attribute(
            raw,
            format!(
                "accessor '{}' is only allowed as the final segment on a registry key root",
                seg.name
            ),
        )),
        None => Err(QueryError::invalid_attribute(
            raw,
            format!("unknown attribute '{}' ({})", seg.name, describe_surface(obj)),
        )),
    }
}

/// Evaluate `path` against `root`. Read-only.
pub fn evaluate(handle: &dyn ImageHandle, root: Object, path: &AttributePath) -> QueryResult<AttrValue> {
    let segments = path.segments();
    let mut current = root;

    for (i, seg) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        let accessor_allowed = is_last && i == 0 && matches!(current, Object::Key(_));
        match apply(handle, &current, seg, accessor_allowed, path.raw())? {
            Step::Object(next) => current = next,
            Step::Value(value) if is_last => return Ok(value),
            Step::Value(_) => {
                return Err(QueryError::invalid_attribute(
                    path.raw(),
                    format!("'{}' is a plain value and has no attributes", seg.name),
                ));
            }
        }
    }

    Ok(AttrValue::Ref(current.to_ref()))
}
