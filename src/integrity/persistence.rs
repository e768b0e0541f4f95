//! Reading and writing integrity snapshots.
//!
//! A snapshot is a pretty-printed JSON sidecar. File paths inside it are
//! relative to the snapshot's own directory so the whole project tree can be
//! moved without invalidating it, and every retained content field is
//! compressed independently to keep the file small.

use super::content::IntegrityContent;
use super::hasher::HASH_ALGORITHM;
use super::types::{ContentIntegrity, FileIntegrity, Integrity};
use crate::error::{IntegrityError, Result, ResultExt as _};
use crate::utils::{from_portable, normalize_path, relative_path, to_portable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current snapshot schema version.
///
/// Increment this when changing the snapshot format or the digest algorithm.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// On-disk representation of [`Integrity`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIntegrity {
    /// Absent in snapshots written before versioning was introduced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash_algorithm: Option<String>,

    #[serde(default)]
    enabled: bool,

    #[serde(default)]
    file_integrity: Vec<StoredFileIntegrity>,

    #[serde(default)]
    content_integrity: Vec<StoredContentIntegrity>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFileIntegrity {
    file_path: String,
    hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredContentIntegrity {
    content_key: String,
    hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

/// Write a snapshot to `integrity_file_path`, replacing any existing file.
///
/// Parent directories are created as needed.
///
/// # Errors
///
/// Returns error if the path has no parent, content can't be compressed, or
/// the file can't be written.
pub fn write_integrity_data(integrity_file_path: &Path, integrity: &Integrity) -> Result<()> {
    let snapshot_dir = snapshot_dir(integrity_file_path)?;
    fs::create_dir_all(&snapshot_dir).with_context(|| {
        format!(
            "Failed to create integrity directory: {}",
            snapshot_dir.display()
        )
    })?;

    let file_integrity = integrity
        .file_integrity
        .iter()
        .map(|entry| {
            Ok(StoredFileIntegrity {
                file_path: store_path(&snapshot_dir, &entry.file_path),
                hash: entry.hash.clone(),
                content: Some(entry.content.to_stored()?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let content_integrity = integrity
        .content_integrity
        .iter()
        .map(|entry| {
            Ok(StoredContentIntegrity {
                content_key: entry.content_key.clone(),
                hash: entry.hash.clone(),
                content: Some(entry.content.to_stored()?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let stored = StoredIntegrity {
        schema_version: Some(SNAPSHOT_SCHEMA_VERSION),
        hash_algorithm: Some(HASH_ALGORITHM.to_owned()),
        enabled: integrity.enabled,
        file_integrity,
        content_integrity,
    };

    let json = serde_json::to_string_pretty(&stored).context("Failed to serialize snapshot")?;
    fs::write(integrity_file_path, json).with_context(|| {
        format!(
            "Failed to write integrity snapshot to {}",
            integrity_file_path.display()
        )
    })?;

    tracing::debug!(
        path = %integrity_file_path.display(),
        files = integrity.file_integrity.len(),
        content = integrity.content_integrity.len(),
        "wrote integrity snapshot"
    );
    Ok(())
}

/// Read a snapshot from `integrity_file_path`.
///
/// Relative paths are resolved against the snapshot's directory. Content
/// fields stay compressed until [`IntegrityContent::get`] is called.
///
/// # Errors
///
/// - [`IntegrityError::SnapshotNotFound`] if the file does not exist
/// - [`IntegrityError::IncompatibleSnapshot`] for a newer schema version or a
///   different digest algorithm
/// - parse and I/O errors
pub fn read_integrity_data(integrity_file_path: &Path) -> Result<Integrity> {
    if !integrity_file_path.try_exists()? {
        return Err(IntegrityError::SnapshotNotFound(
            integrity_file_path.to_path_buf(),
        ));
    }
    let snapshot_dir = snapshot_dir(integrity_file_path)?;

    let json = fs::read_to_string(integrity_file_path).with_context(|| {
        format!(
            "Failed to read integrity snapshot: {}",
            integrity_file_path.display()
        )
    })?;
    let stored: StoredIntegrity = serde_json::from_str(&json)
        .context("Failed to parse integrity snapshot (file may be corrupted)")?;

    validate_format(integrity_file_path, &stored)?;

    let file_integrity = stored
        .file_integrity
        .into_iter()
        .map(|entry| FileIntegrity {
            file_path: resolve_path(&snapshot_dir, &entry.file_path),
            hash: entry.hash,
            content: entry
                .content
                .map(IntegrityContent::compressed)
                .unwrap_or_default(),
        })
        .collect();

    let content_integrity = stored
        .content_integrity
        .into_iter()
        .map(|entry| ContentIntegrity {
            content_key: entry.content_key,
            hash: entry.hash,
            content: entry
                .content
                .map(IntegrityContent::compressed)
                .unwrap_or_default(),
        })
        .collect();

    Ok(Integrity {
        enabled: stored.enabled,
        file_integrity,
        content_integrity,
    })
}

fn validate_format(path: &Path, stored: &StoredIntegrity) -> Result<()> {
    match stored.schema_version {
        None => tracing::warn!(
            path = %path.display(),
            "integrity snapshot has no schema version; hashes from older formats will report as different"
        ),
        Some(version) if version > SNAPSHOT_SCHEMA_VERSION => {
            return Err(IntegrityError::IncompatibleSnapshot(format!(
                "{} uses schema version {version}, newest supported is {SNAPSHOT_SCHEMA_VERSION}",
                path.display()
            )));
        }
        Some(_) => {}
    }

    if let Some(algorithm) = &stored.hash_algorithm
        && algorithm != HASH_ALGORITHM
    {
        return Err(IntegrityError::IncompatibleSnapshot(format!(
            "{} was hashed with {algorithm}, expected {HASH_ALGORITHM}",
            path.display()
        )));
    }
    Ok(())
}

fn snapshot_dir(integrity_file_path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(integrity_file_path).map_err(|e| {
        IntegrityError::InvalidPath(format!("{}: {e}", integrity_file_path.display()))
    })?;
    absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            IntegrityError::InvalidPath(format!(
                "Snapshot has no parent directory: {}",
                integrity_file_path.display()
            ))
        })
}

fn store_path(snapshot_dir: &Path, file_path: &Path) -> String {
    let relative = relative_path(snapshot_dir, file_path);
    if relative.is_absolute() {
        relative.to_string_lossy().into_owned()
    } else {
        to_portable(&relative)
    }
}

fn resolve_path(snapshot_dir: &Path, stored: &str) -> PathBuf {
    if Path::new(stored).is_absolute() {
        return normalize_path(Path::new(stored));
    }
    normalize_path(&snapshot_dir.join(from_portable(stored)))
}
