//! Content-addressed integrity snapshots.
//!
//! This module records the hash and content of a set of files and auxiliary
//! strings, stores them as a JSON sidecar, and later reports which of them
//! changed.
//!
//! ## Key Concepts
//!
//! - **Snapshot**: the persisted [`Integrity`] record for a known set of
//!   files and content keys
//! - **Auxiliary content**: string payloads without a backing file (for
//!   example a serialized compiled model) tracked alongside files
//! - **Check**: a pure comparison producing a [`CheckIntegrityResult`]
//!
//! ## Usage
//!
//! ```no_run
//! use project_integrity::integrity;
//! use std::collections::BTreeMap;
//! use std::path::{Path, PathBuf};
//!
//! # fn example() -> project_integrity::error::Result<()> {
//! let files = vec![PathBuf::from("db/schema.cds")];
//! let content = BTreeMap::from([("csn".to_owned(), "{}".to_owned())]);
//!
//! let snapshot = integrity::Integrity {
//!     enabled: true,
//!     file_integrity: integrity::compute_file_integrity(&files)?,
//!     content_integrity: integrity::compute_content_integrity(&content),
//! };
//! integrity::write_integrity_data(Path::new(".fiori-ai/ai-integrity.json"), &snapshot)?;
//!
//! let stored = integrity::read_integrity_data(Path::new(".fiori-ai/ai-integrity.json"))?;
//! let result = integrity::check_integrity(&stored, &content)?;
//! println!("{}", result.format_cli());
//! # Ok(())
//! # }
//! ```
//!
//! ## Snapshot Format
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "hashAlgorithm": "SHA-256",
//!   "enabled": true,
//!   "fileIntegrity": [
//!     { "filePath": "../db/schema.cds", "hash": "a3b2c1d4...", "content": "H4sIAAAA..." }
//!   ],
//!   "contentIntegrity": [
//!     { "contentKey": "csn", "hash": "9f86d081...", "content": "H4sIAAAA..." }
//!   ]
//! }
//! ```
//!
//! ## Edge Cases & Limitations
//!
//! - **Line Endings**: converting CRLF to LF changes the file hash
//! - **Non-UTF-8 files**: hashes and retained content are the exact bytes;
//!   only [`IntegrityContent::text`] and JSON reports decode them lossily
//! - **Concurrent writers**: the last writer wins; there is no locking
//!
//! ## Architecture
//!
//! - [`content`]: retained text with lazy decompression
//! - [`hasher`]: streaming hash computation
//! - [`persistence`]: snapshot file format
//! - [`checker`]: snapshot versus live comparison
//! - [`types`]: snapshot and result data structures

pub mod checker;
pub mod content;
pub mod hasher;
pub mod persistence;
pub mod types;

pub use checker::check_integrity;
pub use content::IntegrityContent;
pub use hasher::{HASH_ALGORITHM, compute_content_integrity, compute_file_integrity, compute_hash};
pub use persistence::{SNAPSHOT_SCHEMA_VERSION, read_integrity_data, write_integrity_data};
pub use types::{
    CheckIntegrityResult, ContentCheckResult, ContentIntegrity, DifferentContent, DifferentFile,
    FileCheckResult, FileIntegrity, Integrity,
};
