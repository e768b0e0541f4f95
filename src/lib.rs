//! # Project Integrity
//!
//! Protects a generated project's hand-authored source files against
//! unintended modification. A snapshot records the hash and content of a known
//! set of files and auxiliary strings; later checks report which of them
//! changed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use project_integrity::project::{ProjectSettings, check_project, initialize_project};
//! use std::collections::BTreeMap;
//! use std::path::PathBuf;
//!
//! # fn example() -> project_integrity::error::Result<()> {
//! let settings = ProjectSettings {
//!     integrity_file_path: PathBuf::from(".fiori-ai/ai-integrity.json"),
//!     file_list: vec![PathBuf::from("db/schema.cds")],
//!     additional_string_content: BTreeMap::from([("k".to_owned(), "v".to_owned())]),
//! };
//! initialize_project(&settings)?;
//!
//! let result = check_project(
//!     &settings.integrity_file_path,
//!     &settings.additional_string_content,
//! )?;
//! for file in &result.files.different_files {
//!     println!("changed: {}", file.file_path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`integrity`]: hashing, snapshot persistence, and comparison
//! - [`project`]: lifecycle operations, reconciliation, and the Fiori/CAP
//!   project variant
//! - [`config`]: snapshot location and tracked content configuration
//! - [`error`]: error types and handling utilities
//! - [`logging`]: tracing subscriber setup for the command-line tool
//! - [`utils`]: path helpers

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod integrity;
pub mod logging;
pub mod project;
pub mod utils;
