//! Integrity protection for Fiori/CAP projects.
//!
//! Tracks the hand-authored `db/schema.cds` and `srv/service.cds` sources,
//! the model compiled from them, and the project's custom folder layout.
//! Checks run the reconciler so cosmetic source edits and compiler upgrades
//! are not reported as changes.
//!
//! The model compiler and the path resolver are external tools; they are
//! reached through the [`ModelProvider`] and [`PathResolver`] traits.

use super::lifecycle::{self, ProjectSettings};
use super::reconcile::{Reconciliation, reconcile};
use crate::config::IntegrityConfig;
use crate::error::{IntegrityError, Result, ResultExt as _};
use crate::integrity::{
    CheckIntegrityResult, check_integrity, read_integrity_data, write_integrity_data,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The part of a compiled CDS model that is tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdsModel {
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub definitions: serde_json::Map<String, serde_json::Value>,
}

impl CdsModel {
    /// Deterministic JSON form used as the tracked model content.
    ///
    /// # Errors
    ///
    /// Returns error if the model can't be serialized.
    pub fn to_content(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize compiled model")
    }
}

/// Compiles the project's CDS sources into a model.
pub trait ModelProvider {
    /// # Errors
    ///
    /// Returns [`IntegrityError::Collaborator`] (or any other error) when the
    /// model can't be compiled.
    fn get_model(&self, project_root: &Path, sources: &[String]) -> Result<CdsModel>;
}

impl<F> ModelProvider for F
where
    F: Fn(&Path, &[String]) -> Result<CdsModel>,
{
    fn get_model(&self, project_root: &Path, sources: &[String]) -> Result<CdsModel> {
        self(project_root, sources)
    }
}

/// Reads a model that was compiled ahead of time (for example with
/// `cds compile srv --to csn`) from a JSON file.
#[derive(Debug, Clone)]
pub struct PrecompiledModel {
    pub path: PathBuf,
}

impl ModelProvider for PrecompiledModel {
    fn get_model(&self, project_root: &Path, _sources: &[String]) -> Result<CdsModel> {
        let path = project_root.join(&self.path);
        let json = std::fs::read_to_string(&path).map_err(|e| {
            IntegrityError::Collaborator(format!(
                "Failed to read compiled model {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            IntegrityError::Collaborator(format!(
                "Failed to parse compiled model {}: {e}",
                path.display()
            ))
        })
    }
}

/// Reports project folders that were moved away from their default location.
pub trait PathResolver {
    /// Map of folder kind (for example `db`, `srv`, `app`) to custom relative path.
    ///
    /// # Errors
    ///
    /// Returns error when the project configuration can't be read.
    fn custom_paths(&self, project_root: &Path) -> Result<BTreeMap<String, String>>;
}

/// A fixed set of custom paths.
#[derive(Debug, Clone, Default)]
pub struct StaticPaths(pub BTreeMap<String, String>);

impl PathResolver for StaticPaths {
    fn custom_paths(&self, _project_root: &Path) -> Result<BTreeMap<String, String>> {
        Ok(self.0.clone())
    }
}

/// Integrity operations for one Fiori/CAP project root.
#[derive(Debug)]
pub struct FioriProject<M, P> {
    root: PathBuf,
    config: IntegrityConfig,
    model_provider: M,
    path_resolver: P,
}

impl<M: ModelProvider, P: PathResolver> FioriProject<M, P> {
    pub fn new(
        root: impl Into<PathBuf>,
        config: IntegrityConfig,
        model_provider: M,
        path_resolver: P,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            model_provider,
            path_resolver,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    /// Snapshot to read from: the canonical file, or the legacy file when
    /// only that one exists.
    pub fn integrity_file_path(&self) -> PathBuf {
        let canonical = self.config.snapshot_path(&self.root);
        if canonical.exists() {
            return canonical;
        }
        let legacy = self.config.legacy_snapshot_path(&self.root);
        if legacy.exists() {
            return legacy;
        }
        canonical
    }

    pub fn is_initialized(&self) -> bool {
        self.integrity_file_path().exists()
    }

    /// Whether integrity checks are enabled. Uninitialized projects are not.
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot exists but can't be read.
    pub fn is_enabled(&self) -> Result<bool> {
        if !self.is_initialized() {
            return Ok(false);
        }
        lifecycle::is_project_enabled(&self.integrity_file_path())
    }

    /// Snapshot the project's sources, compiled model, and custom paths.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::FileNotFound`] naming the first required source
    ///   file that does not exist; the compiler is not invoked and nothing is
    ///   written
    /// - collaborator errors from the model compiler or path resolver
    pub fn init(&self) -> Result<()> {
        let file_list = self.source_paths();
        for path in &file_list {
            if !path.try_exists()? {
                return Err(IntegrityError::FileNotFound(path.clone()));
            }
        }

        lifecycle::initialize_project(&ProjectSettings {
            integrity_file_path: self.config.snapshot_path(&self.root),
            file_list,
            additional_string_content: self.additional_string_content()?,
        })
    }

    /// Check the project and reconcile cosmetic or toolchain-only changes.
    ///
    /// When the reconciler reclassifies anything, the refreshed entries are
    /// written back so they are not reported again.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SnapshotNotFound`] if the project was never initialized
    /// - collaborator and I/O errors
    pub fn check(&self) -> Result<CheckIntegrityResult> {
        let path = self.integrity_file_path();
        if path != self.config.snapshot_path(&self.root) {
            tracing::warn!(
                path = %path.display(),
                "using deprecated integrity snapshot name; it is replaced by {} on the next write",
                self.config.snapshot_file_name
            );
        }
        let mut integrity = read_integrity_data(&path)?;
        let content = self.additional_string_content()?;
        let mut result = check_integrity(&integrity, &content)?;

        let outcome = reconcile(&mut result, &mut integrity, &self.config.model_content_key)?;
        if outcome.is_applied() {
            write_integrity_data(&self.config.snapshot_path(&self.root), &integrity)?;
            tracing::info!(
                root = %self.root.display(),
                cosmetic = outcome == Reconciliation::CosmeticSourceChange,
                "reconciled integrity snapshot"
            );
        }
        Ok(result)
    }

    /// Accept the current state of the project as the new snapshot.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::SnapshotNotFound`] if the project was never initialized
    /// - [`IntegrityError::KeyMismatch`] if the tracked content keys changed
    pub fn update(&self) -> Result<()> {
        let path = self.writable_snapshot_path()?;
        lifecycle::update_project(&path, &self.additional_string_content()?)
    }

    /// # Errors
    ///
    /// Returns [`IntegrityError::SnapshotNotFound`] if the project was never
    /// initialized.
    pub fn enable(&self) -> Result<()> {
        lifecycle::enable_project(&self.writable_snapshot_path()?)
    }

    /// # Errors
    ///
    /// Returns [`IntegrityError::SnapshotNotFound`] if the project was never
    /// initialized.
    pub fn disable(&self) -> Result<()> {
        lifecycle::disable_project(&self.writable_snapshot_path()?)
    }

    fn source_paths(&self) -> Vec<PathBuf> {
        self.config
            .source_files
            .iter()
            .map(|relative| self.root.join(relative))
            .collect()
    }

    fn additional_string_content(&self) -> Result<BTreeMap<String, String>> {
        let model = self
            .model_provider
            .get_model(&self.root, &self.config.model_sources)?;
        let paths = self.path_resolver.custom_paths(&self.root)?;
        let paths = serde_json::to_string(&paths).context("Failed to serialize custom paths")?;

        Ok(BTreeMap::from([
            (self.config.model_content_key.clone(), model.to_content()?),
            (self.config.paths_content_key.clone(), paths),
        ]))
    }

    /// Canonical snapshot path, migrating a legacy snapshot into it first.
    fn writable_snapshot_path(&self) -> Result<PathBuf> {
        let canonical = self.config.snapshot_path(&self.root);
        let current = self.integrity_file_path();
        if current != canonical {
            let integrity = read_integrity_data(&current)?;
            write_integrity_data(&canonical, &integrity)?;
            tracing::warn!(
                from = %current.display(),
                to = %canonical.display(),
                "migrated legacy integrity snapshot"
            );
        }
        Ok(canonical)
    }
}
