//! Generic project lifecycle: init, check, update, enable, disable.
//!
//! Each operation is a self-contained read-modify-write cycle against one
//! snapshot file. Writes always serialize the full snapshot.

use crate::error::{IntegrityError, Result};
use crate::integrity::{
    CheckIntegrityResult, Integrity, check_integrity, compute_content_integrity,
    compute_file_integrity, read_integrity_data, write_integrity_data,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Inputs for [`initialize_project`].
#[derive(Debug, Clone, Default)]
pub struct ProjectSettings {
    /// Where the snapshot is written
    pub integrity_file_path: PathBuf,

    /// Files to protect; never discovered automatically
    pub file_list: Vec<PathBuf>,

    /// Auxiliary string content to protect, by key
    pub additional_string_content: BTreeMap<String, String>,
}

/// Compute and persist a fresh snapshot with checks enabled.
///
/// Calling this twice with unchanged inputs produces an equivalent snapshot.
///
/// # Errors
///
/// Returns [`IntegrityError::FileNotFound`] before anything is written if any
/// listed file does not exist.
pub fn initialize_project(settings: &ProjectSettings) -> Result<()> {
    let integrity = Integrity {
        enabled: true,
        file_integrity: compute_file_integrity(&settings.file_list)?,
        content_integrity: compute_content_integrity(&settings.additional_string_content),
    };
    write_integrity_data(&settings.integrity_file_path, &integrity)?;

    tracing::info!(
        path = %settings.integrity_file_path.display(),
        files = integrity.file_integrity.len(),
        content = integrity.content_integrity.len(),
        "initialized project integrity"
    );
    Ok(())
}

/// Compare the stored snapshot against the live project. Read-only.
///
/// # Errors
///
/// Returns [`IntegrityError::SnapshotNotFound`] if the project was never
/// initialized.
pub fn check_project(
    integrity_file_path: &Path,
    additional_string_content: &BTreeMap<String, String>,
) -> Result<CheckIntegrityResult> {
    let integrity = read_integrity_data(integrity_file_path)?;
    check_integrity(&integrity, additional_string_content)
}

/// Recompute the snapshot from the stored file list and the supplied content.
///
/// The `enabled` flag is preserved.
///
/// # Errors
///
/// - [`IntegrityError::SnapshotNotFound`] if the project was never initialized
/// - [`IntegrityError::KeyMismatch`] if the content keys differ from the
///   stored keys; the snapshot is left untouched
/// - [`IntegrityError::FileNotFound`] if a tracked file was deleted
pub fn update_project(
    integrity_file_path: &Path,
    additional_string_content: &BTreeMap<String, String>,
) -> Result<()> {
    let stored = read_integrity_data(integrity_file_path)?;
    ensure_same_keys(&stored, additional_string_content)?;

    let integrity = Integrity {
        enabled: stored.enabled,
        file_integrity: compute_file_integrity(&stored.file_paths())?,
        content_integrity: compute_content_integrity(additional_string_content),
    };
    write_integrity_data(integrity_file_path, &integrity)?;

    tracing::info!(path = %integrity_file_path.display(), "updated project integrity");
    Ok(())
}

/// Turn integrity checks on without touching hashes or content.
///
/// # Errors
///
/// Returns [`IntegrityError::SnapshotNotFound`] if the project was never
/// initialized.
pub fn enable_project(integrity_file_path: &Path) -> Result<()> {
    set_enabled(integrity_file_path, true)
}

/// Turn integrity checks off without touching hashes or content.
///
/// # Errors
///
/// Returns [`IntegrityError::SnapshotNotFound`] if the project was never
/// initialized.
pub fn disable_project(integrity_file_path: &Path) -> Result<()> {
    set_enabled(integrity_file_path, false)
}

/// Whether the stored snapshot has checks enabled.
///
/// # Errors
///
/// Returns [`IntegrityError::SnapshotNotFound`] if the project was never
/// initialized.
pub fn is_project_enabled(integrity_file_path: &Path) -> Result<bool> {
    Ok(read_integrity_data(integrity_file_path)?.enabled)
}

fn set_enabled(integrity_file_path: &Path, enabled: bool) -> Result<()> {
    let mut integrity = read_integrity_data(integrity_file_path)?;
    integrity.enabled = enabled;
    write_integrity_data(integrity_file_path, &integrity)?;

    tracing::info!(path = %integrity_file_path.display(), enabled, "changed integrity state");
    Ok(())
}

/// Sorted key-set equality between the snapshot and the supplied content.
pub(crate) fn ensure_same_keys(
    integrity: &Integrity,
    additional_string_content: &BTreeMap<String, String>,
) -> Result<()> {
    let stored = integrity.content_keys();
    let supplied: Vec<String> = additional_string_content.keys().cloned().collect();
    if stored == supplied {
        Ok(())
    } else {
        Err(IntegrityError::KeyMismatch { stored, supplied })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings(dir: &Path) -> ProjectSettings {
        fs::write(dir.join("schema.cds"), "A").unwrap();
        ProjectSettings {
            integrity_file_path: dir.join(".fiori-ai/ai-integrity.json"),
            file_list: vec![dir.join("schema.cds")],
            additional_string_content: BTreeMap::from([("k".to_owned(), "v".to_owned())]),
        }
    }

    #[test]
    fn test_init_then_check_is_clean() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());

        initialize_project(&settings).unwrap();
        let result =
            check_project(&settings.integrity_file_path, &settings.additional_string_content)
                .unwrap();

        assert!(result.is_clean());
        assert!(is_project_enabled(&settings.integrity_file_path).unwrap());
    }

    #[test]
    fn test_init_with_missing_file_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(dir.path());
        settings.file_list.push(dir.path().join("service.cds"));

        let err = initialize_project(&settings).unwrap_err();

        assert!(matches!(err, IntegrityError::FileNotFound(_)));
        assert!(err.to_string().contains("service.cds"));
        assert!(!settings.integrity_file_path.exists());
    }

    #[test]
    fn test_check_without_init() {
        let dir = TempDir::new().unwrap();
        let err = check_project(&dir.path().join("ai-integrity.json"), &BTreeMap::new());
        assert!(matches!(err, Err(IntegrityError::SnapshotNotFound(_))));
    }

    #[test]
    fn test_update_accepts_changes() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());
        initialize_project(&settings).unwrap();

        fs::write(dir.path().join("schema.cds"), "B").unwrap();
        let content = BTreeMap::from([("k".to_owned(), "v2".to_owned())]);
        assert!(!check_project(&settings.integrity_file_path, &content).unwrap().is_clean());

        update_project(&settings.integrity_file_path, &content).unwrap();
        assert!(check_project(&settings.integrity_file_path, &content).unwrap().is_clean());
    }

    #[test]
    fn test_update_rejects_key_mismatch() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());
        initialize_project(&settings).unwrap();
        let before = fs::read_to_string(&settings.integrity_file_path).unwrap();

        let content = BTreeMap::from([
            ("k".to_owned(), "v".to_owned()),
            ("extra".to_owned(), "x".to_owned()),
        ]);
        let err = update_project(&settings.integrity_file_path, &content).unwrap_err();

        match err {
            IntegrityError::KeyMismatch { stored, supplied } => {
                assert_eq!(stored, vec!["k"]);
                assert_eq!(supplied, vec!["extra", "k"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            fs::read_to_string(&settings.integrity_file_path).unwrap(),
            before
        );
    }

    #[test]
    fn test_enable_disable_keeps_hashes() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());
        initialize_project(&settings).unwrap();
        let hash_before = read_integrity_data(&settings.integrity_file_path)
            .unwrap()
            .file_integrity[0]
            .hash
            .clone();

        disable_project(&settings.integrity_file_path).unwrap();
        assert!(!is_project_enabled(&settings.integrity_file_path).unwrap());

        enable_project(&settings.integrity_file_path).unwrap();
        let integrity = read_integrity_data(&settings.integrity_file_path).unwrap();
        assert!(integrity.enabled);
        assert_eq!(integrity.file_integrity[0].hash, hash_before);
        assert_eq!(integrity.file_integrity[0].content.text().unwrap(), "A");
    }

    #[test]
    fn test_update_preserves_disabled_state() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());
        initialize_project(&settings).unwrap();
        disable_project(&settings.integrity_file_path).unwrap();

        update_project(&settings.integrity_file_path, &settings.additional_string_content)
            .unwrap();

        assert!(!is_project_enabled(&settings.integrity_file_path).unwrap());
    }
}
