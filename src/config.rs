//! Integrity configuration for Fiori/CAP projects.
//!
//! Every field has a default matching the standard project layout, so a
//! configuration file is only needed for projects that deviate from it.

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the snapshot, relative to the project root.
pub const INTEGRITY_DIR: &str = ".fiori-ai";

/// Canonical snapshot file name.
pub const SNAPSHOT_FILE_NAME: &str = "ai-integrity.json";

/// Snapshot file name used by earlier releases; read but never written.
pub const LEGACY_SNAPSHOT_FILE_NAME: &str = "hash-map.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrityConfig {
    /// Directory for the snapshot, relative to the project root
    pub integrity_dir: PathBuf,

    pub snapshot_file_name: String,

    /// Deprecated snapshot name, consulted only when the canonical file is absent
    pub legacy_snapshot_file_name: String,

    /// Hand-authored sources that must exist at init time, relative to the root
    pub source_files: Vec<PathBuf>,

    /// Source categories passed to the model compiler
    pub model_sources: Vec<String>,

    /// Auxiliary content key for the serialized compiled model
    pub model_content_key: String,

    /// Auxiliary content key for the custom project paths
    pub paths_content_key: String,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            integrity_dir: PathBuf::from(INTEGRITY_DIR),
            snapshot_file_name: SNAPSHOT_FILE_NAME.to_owned(),
            legacy_snapshot_file_name: LEGACY_SNAPSHOT_FILE_NAME.to_owned(),
            source_files: vec![
                PathBuf::from("db").join("schema.cds"),
                PathBuf::from("srv").join("service.cds"),
            ],
            model_sources: vec!["db".to_owned(), "srv".to_owned()],
            model_content_key: "csn".to_owned(),
            paths_content_key: "capPaths".to_owned(),
        }
    }
}

impl IntegrityConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but can't be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.try_exists()? {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read integrity config from {}", path.display()))?;

        let config: Self =
            serde_json::from_str(&contents).context("Failed to parse integrity config JSON")?;

        Ok(config)
    }

    /// Save configuration to `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file can't be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize integrity config")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write integrity config to {}", path.display()))?;

        Ok(())
    }

    /// Canonical snapshot location for a project.
    pub fn snapshot_path(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(&self.integrity_dir)
            .join(&self.snapshot_file_name)
    }

    /// Legacy snapshot location for a project.
    pub fn legacy_snapshot_path(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(&self.integrity_dir)
            .join(&self.legacy_snapshot_file_name)
    }
}
