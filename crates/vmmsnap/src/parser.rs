//! Snapshot file parser for plain JSON and .json.xz compressed files.

use crate::error::{SnapshotError, SnapshotResult};
use crate::index::Snapshot;
use crate::types::SnapshotFile;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;
use xz2::read::XzDecoder;

/// Supported major format version.
const FORMAT_MAJOR: &str = "1";

/// Parse a snapshot file from a filesystem path.
///
/// Automatically detects compression:
/// - `.json.xz` or `.xz` → LZMA decompression then JSON parse
/// - `.json` or anything else → direct JSON parse
pub fn parse_snapshot_file(path: impl AsRef<Path>) -> SnapshotResult<Snapshot> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SnapshotError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path)
        .map_err(|e| SnapshotError::Io(format!("opening {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let path_str = path.to_string_lossy().to_lowercase();
    let mut buf = Vec::new();
    if path_str.ends_with(".xz") {
        XzDecoder::new(reader)
            .read_to_end(&mut buf)
            .map_err(|e| SnapshotError::Decompression(format!("{}: {}", path.display(), e)))?;
    } else {
        let mut reader = reader;
        reader
            .read_to_end(&mut buf)
            .map_err(|e| SnapshotError::Io(format!("reading {}: {}", path.display(), e)))?;
    }

    debug!("snapshot: read {} bytes from {}", buf.len(), path.display());
    parse_snapshot_bytes(&buf)
}

/// Parse a snapshot from raw JSON bytes (already decompressed).
pub fn parse_snapshot_bytes(json_bytes: &[u8]) -> SnapshotResult<Snapshot> {
    let file: SnapshotFile = serde_json::from_slice(json_bytes)
        .map_err(|e| SnapshotError::JsonParse(format!("{}", e)))?;

    into_snapshot(file)
}

/// Parse a snapshot from a JSON string.
pub fn parse_snapshot_str(json_str: &str) -> SnapshotResult<Snapshot> {
    let file: SnapshotFile = serde_json::from_str(json_str)
        .map_err(|e| SnapshotError::JsonParse(format!("{}", e)))?;

    into_snapshot(file)
}

fn into_snapshot(file: SnapshotFile) -> SnapshotResult<Snapshot> {
    let major = file.metadata.format.split('.').next().unwrap_or_default();
    if major != FORMAT_MAJOR {
        return Err(SnapshotError::UnsupportedFormat(file.metadata.format));
    }
    Snapshot::new(file)
}
