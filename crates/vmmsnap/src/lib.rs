//! Object snapshots of Windows memory images.
//!
//! A snapshot is a JSON document listing the objects a forensic framework
//! found in one memory image: processes, registry hives, and registry keys
//! with their values. This crate provides:
//!
//! - Parsing of `.json` and `.json.xz` (LZMA-compressed) snapshot files
//! - Record types for every object kind
//! - [`Snapshot`], an indexed, read-only view with case-insensitive
//!   registry path lookups
//!
//! # Example
//!
//! ```rust,ignore
//! use vmmsnap::parse_snapshot_file;
//!
//! let snapshot = parse_snapshot_file("win10-19041.snap.json.xz")?;
//! let explorer = snapshot.process_by_name("explorer.exe");
//! let run = snapshot.key("HKLM\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run");
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export key types at crate root.
pub use error::{SnapshotError, SnapshotResult};
pub use index::Snapshot;
pub use parser::{parse_snapshot_bytes, parse_snapshot_file, parse_snapshot_str};
pub use types::{HiveRecord, KeyRecord, Metadata, ProcessRecord, SnapshotFile, ValueRecord};
