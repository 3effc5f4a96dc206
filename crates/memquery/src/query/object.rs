//! Tagged variant over every object an attribute path can reach.

use crate::backend::{ProcessObject, RegistryHive, RegistryKey, RegistryValue};
use crate::query::value::ObjectRef;

/// Kind of root object a query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Process,
    Hive,
    Key,
    Value,
}

impl RootKind {
    /// Redundant names callers may prefix a path with to mean "the root object".
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            RootKind::Process => &["process", "target_process"],
            RootKind::Hive => &["reghive", "target_reghive"],
            RootKind::Key => &["regkey", "target_regkey"],
            RootKind::Value => &["regvalue", "target_regvalue"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Process(ProcessObject),
    Hive(RegistryHive),
    Key(RegistryKey),
    Value(RegistryValue),
    /// Memory-map accessor of a process.
    ProcessMaps { pid: u32 },
    /// Virtual-memory accessor of a process.
    VirtualMemory { pid: u32 },
    /// Hive-memory accessor of a registry hive.
    HiveMemory { addr: u64 },
}

impl Object {
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Process(_) => "process",
            Object::Hive(_) => "reghive",
            Object::Key(_) => "regkey",
            Object::Value(_) => "regvalue",
            Object::ProcessMaps { .. } => "process_maps",
            Object::VirtualMemory { .. } => "virtual_memory",
            Object::HiveMemory { .. } => "hive_memory",
        }
    }

    /// Stable reference used when an object is the terminal value.
    pub fn to_ref(&self) -> ObjectRef {
        let (repr, path) = match self {
            Object::Process(p) => (format!("Process:{}", p.pid), None),
            Object::Hive(h) => (format!("RegHive:{:#x}", h.addr), Some(h.path.clone())),
            Object::Key(k) => (format!("RegKey:{}", k.name), Some(k.path.clone())),
            Object::Value(v) => (format!("RegValue:{}", v.name), Some(v.path.clone())),
            Object::ProcessMaps { pid } => (format!("ProcessMaps:{}", pid), None),
            Object::VirtualMemory { pid } => (format!("VirtualMemory:{}", pid), None),
            Object::HiveMemory { addr } => (format!("RegMemory:{:#x}", addr), None),
        };
        ObjectRef {
            repr,
            kind: self.kind(),
            path,
        }
    }
}
