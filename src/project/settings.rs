//! Tool settings (arbiter.yaml) parsing.
//!
//! The settings file tells the preview tooling where the view resources
//! live, where to stage the scratch tree, and how assets are published.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArbiterError, Result};

/// Settings loaded from arbiter.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port the preview server listens on (loopback only).
    pub port: u16,

    /// Public base URL for hashed assets. Enables content hashing when set.
    pub assets_base_url: Option<String>,

    /// Scratch directory for generated previews.
    /// Defaults to `arbiter-preview` under the system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Loose view resource tree, relative to the project root.
    pub view_dir: PathBuf,

    /// Framework view bundles staged before the loose tree, in order.
    /// Each entry is either a `.zip` archive or a directory.
    pub view_bundles: Vec<PathBuf>,

    /// Logical prefix selecting view entries inside archive bundles.
    pub bundle_prefix: String,

    /// File name of the project manifest shipped with exports.
    pub project_manifest: String,
}

pub const DEFAULT_PORT: u16 = 8888;

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            assets_base_url: None,
            scratch_dir: None,
            view_dir: PathBuf::from("src/main/resources/view"),
            view_bundles: vec![],
            bundle_prefix: "view/".to_string(),
            project_manifest: "pom.xml".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an arbiter.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ArbiterError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read settings: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse settings from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ArbiterError::Parse {
            message: format!("Invalid settings: {}", e),
            help: Some("Check arbiter.yaml syntax".to_string()),
        })
    }

    /// Get the effective scratch directory.
    pub fn effective_scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("arbiter-preview"))
    }
}
