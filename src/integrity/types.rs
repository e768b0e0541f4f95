//! In-memory integrity snapshot and check result types.

use super::content::IntegrityContent;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Hash and retained content of one tracked file.
#[derive(Debug, Clone)]
pub struct FileIntegrity {
    /// Absolute path of the file
    pub file_path: PathBuf,

    /// Lowercase hex digest of the file bytes
    pub hash: String,

    /// Bytes of the file at snapshot time
    pub content: IntegrityContent,
}

/// Hash and retained content of one auxiliary string, keyed by name.
#[derive(Debug, Clone)]
pub struct ContentIntegrity {
    pub content_key: String,
    pub hash: String,
    pub content: IntegrityContent,
}

/// A complete integrity snapshot.
#[derive(Debug, Clone, Default)]
pub struct Integrity {
    /// Whether checks should be enforced for this project
    pub enabled: bool,

    pub file_integrity: Vec<FileIntegrity>,

    pub content_integrity: Vec<ContentIntegrity>,
}

impl Integrity {
    /// Tracked file paths in snapshot order.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.file_integrity
            .iter()
            .map(|entry| entry.file_path.clone())
            .collect()
    }

    /// Auxiliary content keys, sorted.
    pub fn content_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .content_integrity
            .iter()
            .map(|entry| entry.content_key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn file_entry_mut(&mut self, path: &Path) -> Option<&mut FileIntegrity> {
        self.file_integrity
            .iter_mut()
            .find(|entry| entry.file_path == path)
    }

    pub fn content_entry_mut(&mut self, key: &str) -> Option<&mut ContentIntegrity> {
        self.content_integrity
            .iter_mut()
            .find(|entry| entry.content_key == key)
    }
}

/// A tracked file whose digest no longer matches the snapshot.
///
/// Contents are the exact bytes; JSON output renders them as text with
/// invalid UTF-8 replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferentFile {
    pub file_path: PathBuf,
    #[serde(serialize_with = "serialize_lossy")]
    pub old_content: Vec<u8>,
    /// Empty when the file no longer exists
    #[serde(serialize_with = "serialize_lossy")]
    pub new_content: Vec<u8>,
    /// The file did not exist when the check ran
    pub missing: bool,
}

impl DifferentFile {
    pub fn old_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.old_content)
    }

    pub fn new_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.new_content)
    }
}

fn serialize_lossy<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// An auxiliary content key that changed, appeared, or disappeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferentContent {
    pub key: String,
    /// `None` when the key is new
    pub old_content: Option<String>,
    /// `None` when the key was removed
    pub new_content: Option<String>,
}

impl DifferentContent {
    pub fn is_added(&self) -> bool {
        self.old_content.is_none()
    }

    pub fn is_removed(&self) -> bool {
        self.new_content.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCheckResult {
    pub different_files: Vec<DifferentFile>,
    pub equal_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCheckResult {
    pub different_content: Vec<DifferentContent>,
    pub equal_content: Vec<String>,
}

/// Classified differences between a snapshot and the live project.
///
/// This is never persisted; a fresh one is produced by every check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIntegrityResult {
    pub files: FileCheckResult,
    pub additional_string_content: ContentCheckResult,
}

impl CheckIntegrityResult {
    /// True when nothing differs from the snapshot.
    pub fn is_clean(&self) -> bool {
        self.files.different_files.is_empty()
            && self.additional_string_content.different_content.is_empty()
    }

    pub fn different_count(&self) -> usize {
        self.files.different_files.len() + self.additional_string_content.different_content.len()
    }

    /// Format the result for terminal display.
    pub fn format_cli(&self) -> String {
        if self.is_clean() {
            return format!(
                "✓ PASS: Project integrity verified\n  \
                Files: {} unchanged\n  \
                Content: {} unchanged",
                self.files.equal_files.len(),
                self.additional_string_content.equal_content.len()
            );
        }

        let mut output = format!("✗ FAIL: {} difference(s) detected", self.different_count());
        for file in &self.files.different_files {
            let state = if file.missing { "missing" } else { "modified" };
            let _ = write!(output, "\n  File {state}: {}", file.file_path.display());
        }
        for content in &self.additional_string_content.different_content {
            let state = if content.is_added() {
                "added"
            } else if content.is_removed() {
                "removed"
            } else {
                "modified"
            };
            let _ = write!(output, "\n  Content {state}: {}", content.key);
        }
        output.push_str("\n  Review the changes, then run `update` to accept them");
        output
    }
}
