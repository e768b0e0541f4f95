//! Reconciliation between source files and the model compiled from them.
//!
//! The compiled model is the more reliable indicator of a real change:
//!
//! - whitespace, comments, or line endings change a source file's hash but
//!   not the model's
//! - a new compiler version can change the model's serialization while no
//!   source file changed at all
//!
//! Both situations are reclassified as equal and the affected snapshot
//! entries are refreshed so they are not reported again. Every other
//! combination is passed through untouched.

use crate::error::Result;
use crate::integrity::{
    CheckIntegrityResult, IntegrityContent, Integrity, compute_file_integrity, compute_hash,
};
use std::path::PathBuf;

/// Which reclassification, if any, was applied by [`reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was reclassified
    None,

    /// Source files changed without changing the model
    CosmeticSourceChange,

    /// The model changed without any source file changing
    ToolchainModelChange,
}

impl Reconciliation {
    /// Whether the snapshot was modified and needs to be written back.
    pub fn is_applied(self) -> bool {
        self != Self::None
    }
}

/// Apply whichever single reclassification pass matches `result`.
///
/// # Errors
///
/// Returns error if a source file can't be re-hashed.
pub fn reconcile(
    result: &mut CheckIntegrityResult,
    integrity: &mut Integrity,
    model_key: &str,
) -> Result<Reconciliation> {
    if reconcile_cosmetic_source_changes(result, integrity, model_key)? {
        return Ok(Reconciliation::CosmeticSourceChange);
    }
    if reconcile_toolchain_model_change(result, integrity, model_key) {
        return Ok(Reconciliation::ToolchainModelChange);
    }
    Ok(Reconciliation::None)
}

/// Treat source file changes as equal when the compiled model is unchanged.
///
/// Applies only when `model_key` is among the equal content keys. Differing
/// files that still exist are moved to `equal_files` and their snapshot
/// entries are replaced by fresh hashes; deleted files stay different.
///
/// Returns whether anything was reclassified.
///
/// # Errors
///
/// Returns error if a source file can't be re-hashed.
pub fn reconcile_cosmetic_source_changes(
    result: &mut CheckIntegrityResult,
    integrity: &mut Integrity,
    model_key: &str,
) -> Result<bool> {
    let model_unchanged = result
        .additional_string_content
        .equal_content
        .iter()
        .any(|key| key == model_key);
    if !model_unchanged || result.files.different_files.is_empty() {
        return Ok(false);
    }

    let (missing, cosmetic): (Vec<_>, Vec<_>) = std::mem::take(&mut result.files.different_files)
        .into_iter()
        .partition(|file| file.missing);
    result.files.different_files = missing;
    if cosmetic.is_empty() {
        return Ok(false);
    }

    let paths: Vec<PathBuf> = cosmetic.into_iter().map(|file| file.file_path).collect();
    for fresh in compute_file_integrity(&paths)? {
        tracing::info!(
            path = %fresh.file_path.display(),
            "source changed without affecting the model, refreshing stored hash"
        );
        result.files.equal_files.push(fresh.file_path.clone());
        match integrity.file_entry_mut(&fresh.file_path) {
            Some(entry) => *entry = fresh,
            None => integrity.file_integrity.push(fresh),
        }
    }
    Ok(true)
}

/// Treat a model change as equal when no source file changed.
///
/// Applies only when no file differs and `model_key` changed on both sides
/// (not added, not removed). The snapshot entry takes the new model content.
///
/// Returns whether anything was reclassified.
pub fn reconcile_toolchain_model_change(
    result: &mut CheckIntegrityResult,
    integrity: &mut Integrity,
    model_key: &str,
) -> bool {
    if !result.files.different_files.is_empty() {
        return false;
    }

    let content = &mut result.additional_string_content;
    let Some(index) = content.different_content.iter().position(|diff| {
        diff.key == model_key && diff.old_content.is_some() && diff.new_content.is_some()
    }) else {
        return false;
    };
    let Some(entry) = integrity.content_entry_mut(model_key) else {
        return false;
    };

    let diff = content.different_content.remove(index);
    let new_content = diff.new_content.unwrap_or_default();
    entry.hash = compute_hash(new_content.as_bytes());
    entry.content = IntegrityContent::plain(new_content);
    content.equal_content.push(diff.key);

    tracing::info!(
        key = model_key,
        "model changed without source changes, refreshing stored hash"
    );
    true
}
