//! Export / import of layout files
//!
//! Exports use the same envelope as the store, pretty-printed, named
//! `<storage-key>-YYYYMMDD-HHMMSS.json` (UTC).

use crate::error::{ExportError, ImportError};
use atlas_graph::{encode_layout, validate_import};
use atlas_types::{DiagramKind, LayoutBlob};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn export_file_name(kind: DiagramKind, at: DateTime<Utc>) -> String {
    format!("{}-{}.json", kind.storage_key(), at.format("%Y%m%d-%H%M%S"))
}

/// Write an export file into `dir`, returning its path
pub fn write_export(
    dir: &Path,
    kind: DiagramKind,
    blob: &LayoutBlob,
    at: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let text = encode_layout(blob)?;
    let path = dir.join(export_file_name(kind, at));
    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(text.as_bytes()).map_err(io_err)?;
    tmp.persist(&path).map_err(|e| io_err(e.error))?;

    tracing::info!("Exported {} positions to {}", blob.len(), path.display());
    Ok(path)
}

/// Read and strictly validate an import file
pub fn read_import(path: &Path) -> Result<LayoutBlob, ImportError> {
    let text = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(validate_import(&text)?)
}
