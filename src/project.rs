//! Project-level integrity operations.
//!
//! - [`lifecycle`]: generic init / check / update / enable / disable over an
//!   explicit file list and auxiliary content map
//! - [`reconcile`]: reclassification of cosmetic source edits and
//!   toolchain-only model changes
//! - [`fiori`]: the Fiori/CAP variant that tracks CDS sources and the
//!   compiled model, and reconciles on check

pub mod fiori;
pub mod lifecycle;
pub mod reconcile;

pub use fiori::{CdsModel, FioriProject, ModelProvider, PathResolver, PrecompiledModel, StaticPaths};
pub use lifecycle::{
    ProjectSettings, check_project, disable_project, enable_project, initialize_project,
    is_project_enabled, update_project,
};
pub use reconcile::{
    Reconciliation, reconcile, reconcile_cosmetic_source_changes,
    reconcile_toolchain_model_change,
};
