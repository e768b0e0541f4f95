//! Centralized error handling for project integrity operations.
//!
//! Errors fall into two groups:
//!
//! - **Preconditions**: a required source file is missing at init time, the
//!   snapshot file does not exist, or the auxiliary content keys supplied to
//!   an update no longer match the snapshot. These are setup problems and are
//!   reported before any work is done.
//! - **Everything else**: I/O failures, corrupt snapshots, collaborator
//!   failures. These propagate unchanged to the caller.
//!
//! Differences between a snapshot and the live project are *not* errors; they
//! are returned as data in [`crate::integrity::CheckIntegrityResult`].
//!
//! ## Context Extension Trait
//!
//! The `ResultExt` trait adds `.context()` to any `Result` whose error can be
//! converted into an [`IntegrityError`]:
//!
//! ```no_run
//! use project_integrity::error::ResultExt as _;
//! use std::fs;
//!
//! fn load_schema() -> project_integrity::error::Result<String> {
//!     fs::read_to_string("db/schema.cds").context("Failed to load schema")
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for integrity operations.
#[derive(Debug)]
pub enum IntegrityError {
    /// I/O errors other than a missing input file
    Io(std::io::Error),

    /// A file that must be hashed does not exist
    FileNotFound(PathBuf),

    /// The integrity snapshot has not been written yet
    SnapshotNotFound(PathBuf),

    /// Auxiliary content keys differ from the keys stored in the snapshot
    KeyMismatch {
        stored: Vec<String>,
        supplied: Vec<String>,
    },

    /// Snapshot was written with an unsupported format or digest
    IncompatibleSnapshot(String),

    /// JSON (de)serialization errors
    Serialization(String),

    /// Stored content could not be compressed or decompressed
    Compression(String),

    /// Path cannot be resolved or has no parent directory
    InvalidPath(String),

    /// An external collaborator (model compiler, path resolver) failed
    Collaborator(String),

    /// Generic error with context
    Other(String),
}

impl IntegrityError {
    /// Whether this error is a setup problem rather than a runtime failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::SnapshotNotFound(_) | Self::KeyMismatch { .. }
        )
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::FileNotFound(path) => write!(f, "File not found: {}", path.display()),
            Self::SnapshotNotFound(path) => {
                write!(f, "Integrity snapshot not found: {}", path.display())
            }
            Self::KeyMismatch { stored, supplied } => write!(
                f,
                "Content keys do not match the integrity snapshot. Stored: [{}], supplied: [{}]",
                stored.join(", "),
                supplied.join(", ")
            ),
            Self::IncompatibleSnapshot(msg) => write!(f, "Incompatible integrity snapshot: {msg}"),
            Self::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            Self::Compression(msg) => write!(f, "Compression error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Collaborator(msg) => write!(f, "Collaborator error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IntegrityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IntegrityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for IntegrityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for IntegrityError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Compression(format!("invalid base64 payload: {err}"))
    }
}

impl From<anyhow::Error> for IntegrityError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<IntegrityError> for String {
    fn from(err: IntegrityError) -> Self {
        err.to_string()
    }
}

/// Result type alias for integrity operations.
pub type Result<T> = std::result::Result<T, IntegrityError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<IntegrityError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(msg.into(), e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

/// Every variant survives added context so callers can still match on it.
fn wrap(msg: String, err: IntegrityError) -> IntegrityError {
    use IntegrityError as E;

    match err {
        E::FileNotFound(_) | E::SnapshotNotFound(_) | E::KeyMismatch { .. } => err,
        E::Io(source) => E::Io(std::io::Error::new(
            source.kind(),
            IoContext { msg, source },
        )),
        E::IncompatibleSnapshot(inner) => E::IncompatibleSnapshot(format!("{msg}: {inner}")),
        E::Serialization(inner) => E::Serialization(format!("{msg}: {inner}")),
        E::Compression(inner) => E::Compression(format!("{msg}: {inner}")),
        E::InvalidPath(inner) => E::InvalidPath(format!("{msg}: {inner}")),
        E::Collaborator(inner) => E::Collaborator(format!("{msg}: {inner}")),
        E::Other(inner) => E::Other(format!("{msg}: {inner}")),
    }
}

/// An I/O error with a description of the operation that failed.
///
/// Wrapped in a new `io::Error` of the same kind, so the original stays
/// reachable through `source()`.
#[derive(Debug)]
struct IoContext {
    msg: String,
    source: std::io::Error,
}

impl fmt::Display for IoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.msg, self.source)
    }
}

impl std::error::Error for IoContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
