//! Streaming hash computation for tracked files and strings.
//!
//! Files are read once: every chunk is fed to the digest and appended to a
//! byte buffer that becomes the retained content. Batches of files are hashed
//! in parallel; there is no ordering dependency between them.

use super::content::IntegrityContent;
use super::types::{ContentIntegrity, FileIntegrity};
use crate::error::{IntegrityError, Result, ResultExt as _};
use rayon::prelude::*;
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read as _};
use std::path::{Path, PathBuf};

/// Buffer size for streaming file reads (8 KB).
const BUFFER_SIZE: usize = 8192;

/// Hash algorithm identifier recorded in snapshots.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Compute the lowercase hex SHA-256 digest of `bytes`.
pub fn compute_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Stream a file through the hasher, returning its digest and its bytes.
///
/// # Errors
///
/// Returns error if the file can't be opened or read.
pub fn hash_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut retained = Vec::new();

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
        retained.extend_from_slice(&buffer[..bytes_read]);
    }

    Ok((format!("{:x}", hasher.finalize()), retained))
}

/// Compute integrity entries for a list of files.
///
/// Every path is checked for existence before any file is read, so a missing
/// file fails the whole batch without partial results. Output order matches
/// input order and paths are made absolute.
///
/// # Errors
///
/// - [`IntegrityError::FileNotFound`] naming the first missing path
/// - [`IntegrityError::Io`] when a path can't be inspected or read, for
///   example a directory or a file without read permission
pub fn compute_file_integrity(file_paths: &[PathBuf]) -> Result<Vec<FileIntegrity>> {
    let absolute_paths = file_paths
        .iter()
        .map(|path| absolute(path))
        .collect::<Result<Vec<_>>>()?;

    for path in &absolute_paths {
        let exists = path
            .try_exists()
            .with_context(|| format!("Failed to inspect file: {}", path.display()))?;
        if !exists {
            return Err(IntegrityError::FileNotFound(path.clone()));
        }
    }

    let entries = absolute_paths
        .into_par_iter()
        .map(|file_path| {
            let (hash, bytes) = hash_file(&file_path)?;
            Ok(FileIntegrity {
                file_path,
                hash,
                content: IntegrityContent::plain(bytes),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(files = entries.len(), "computed file integrity");
    Ok(entries)
}

/// Compute integrity entries for auxiliary string content, ordered by key.
pub fn compute_content_integrity(content: &BTreeMap<String, String>) -> Vec<ContentIntegrity> {
    content
        .iter()
        .map(|(key, value)| ContentIntegrity {
            content_key: key.clone(),
            hash: compute_hash(value.as_bytes()),
            content: IntegrityContent::plain(value.as_str()),
        })
        .collect()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| IntegrityError::InvalidPath(format!("{}: {e}", path.display())))
}
