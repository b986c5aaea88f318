//! arbiter - Authoring tool for turn-based game projects
//!
//! Validates a project's tiered configuration, prepares a local preview of
//! its view (with optional content-hashed assets), serves it, and packages
//! the sources for export.

pub mod assets;
pub mod cli;
pub mod error;
pub mod output;
pub mod package;
pub mod project;
pub mod server;
pub mod validation;
pub mod view;

pub use assets::{rewrite_assets, AssetManifest};
pub use error::{ArbiterError, Result};
pub use package::{export_project, package_sources};
pub use project::{Project, Settings};
pub use validation::{validate_project, ExportStatus, ReportItem, Severity, ValidationReport};
pub use view::{ResourceRoots, ViewBundle, ViewExporter};
