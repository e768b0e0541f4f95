//! Comparison of a stored snapshot against the live project.
//!
//! Nothing here writes to disk or mutates the snapshot; the result is pure
//! data describing what changed.

use super::hasher::{compute_file_integrity, compute_hash};
use super::types::{
    CheckIntegrityResult, ContentCheckResult, DifferentContent, DifferentFile, FileCheckResult,
    Integrity,
};
use crate::error::{Result, ResultExt as _};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Classify every tracked file and content key as equal or different.
///
/// Files that no longer exist are reported as different and `missing` with
/// empty new content rather than failing the check. Any other failure to
/// inspect or read a file is returned as an error. Content keys only present in the
/// snapshot are reported with `new_content = None`; keys only present in
/// `additional_string_content` are reported with `old_content = None`.
///
/// # Errors
///
/// Returns error if stored content can't be decompressed or an existing file
/// can't be read.
pub fn check_integrity(
    integrity: &Integrity,
    additional_string_content: &BTreeMap<String, String>,
) -> Result<CheckIntegrityResult> {
    let files = check_files(integrity)?;
    let additional_string_content = check_content(integrity, additional_string_content)?;

    tracing::debug!(
        different_files = files.different_files.len(),
        different_content = additional_string_content.different_content.len(),
        "checked integrity"
    );

    Ok(CheckIntegrityResult {
        files,
        additional_string_content,
    })
}

fn check_files(integrity: &Integrity) -> Result<FileCheckResult> {
    let mut result = FileCheckResult::default();

    let mut existing = Vec::new();
    for entry in &integrity.file_integrity {
        let exists = entry.file_path.try_exists().with_context(|| {
            format!("Failed to inspect tracked file: {}", entry.file_path.display())
        })?;
        if exists {
            existing.push(entry);
        } else {
            result.different_files.push(DifferentFile {
                file_path: entry.file_path.clone(),
                old_content: entry.content.get()?.to_vec(),
                new_content: Vec::new(),
                missing: true,
            });
        }
    }

    let existing_paths: Vec<PathBuf> = existing
        .iter()
        .map(|entry| entry.file_path.clone())
        .collect();
    let current = compute_file_integrity(&existing_paths)?;

    for (stored, live) in existing.iter().zip(current) {
        if stored.hash == live.hash {
            result.equal_files.push(stored.file_path.clone());
        } else {
            result.different_files.push(DifferentFile {
                file_path: stored.file_path.clone(),
                old_content: stored.content.get()?.to_vec(),
                new_content: live.content.get()?.to_vec(),
                missing: false,
            });
        }
    }

    Ok(result)
}

fn check_content(
    integrity: &Integrity,
    additional_string_content: &BTreeMap<String, String>,
) -> Result<ContentCheckResult> {
    let mut result = ContentCheckResult::default();
    let mut stored_keys = HashSet::new();

    for entry in &integrity.content_integrity {
        stored_keys.insert(entry.content_key.as_str());
        match additional_string_content.get(&entry.content_key) {
            Some(live) if compute_hash(live.as_bytes()) == entry.hash => {
                result.equal_content.push(entry.content_key.clone());
            }
            Some(live) => result.different_content.push(DifferentContent {
                key: entry.content_key.clone(),
                old_content: Some(entry.content.text()?.into_owned()),
                new_content: Some(live.clone()),
            }),
            None => result.different_content.push(DifferentContent {
                key: entry.content_key.clone(),
                old_content: Some(entry.content.text()?.into_owned()),
                new_content: None,
            }),
        }
    }

    for (key, live) in additional_string_content {
        if !stored_keys.contains(key.as_str()) {
            result.different_content.push(DifferentContent {
                key: key.clone(),
                old_content: None,
                new_content: Some(live.clone()),
            });
        }
    }

    Ok(result)
}
