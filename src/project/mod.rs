//! Project layout and tool settings.
//!
//! A project root holds a `config/` tree (optionally split into `levelN`
//! tiers), a `src/` tree, a project manifest file and a loose view tree.
//! Settings come from an optional `arbiter.yaml` next to them.
//!
//! # Example
//!
//! ```ignore
//! use arbiter::project::Project;
//!
//! let project = Project::open("./my-game")?;
//! println!("config lives in {}", project.config_dir().display());
//! ```

mod settings;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{ArbiterError, Result};
use crate::validation::Properties;

pub use settings::{Settings, DEFAULT_PORT};

/// The name of the settings file.
pub const SETTINGS_FILENAME: &str = "arbiter.yaml";

/// Configuration directory name, relative to the project root.
pub const CONFIG_DIR: &str = "config";

/// Source directory name, relative to the project root.
pub const SOURCE_DIR: &str = "src";

/// Replay module file name inside the view tree.
pub const REPLAY_MODULE: &str = "demo.js";

/// Joins the values of a repeated config parameter.
pub const CONFIG_VALUE_DELIMITER: &str = ",";

/// Hard upper bound on the number of tiers.
pub const MAX_TIERS: u32 = 50;

/// Hard upper bound on `max_players`.
pub const MAX_PLAYERS: i64 = 8;

/// Directory name of a tier, e.g. `level3`.
pub fn tier_dir_name(ordinal: u32) -> String {
    format!("level{}", ordinal)
}

/// Render a relative path with forward slashes, whatever the host convention.
pub fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// An authoring project on disk.
#[derive(Debug, Clone)]
pub struct Project {
    /// The project root directory.
    pub root: PathBuf,

    /// Settings (defaults when no arbiter.yaml is present).
    pub settings: Settings,

    /// Whether an arbiter.yaml was found.
    pub has_settings: bool,
}

impl Project {
    /// Open a project, loading `arbiter.yaml` from the root if present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let settings_path = root.join(SETTINGS_FILENAME);
        let (settings, has_settings) = if settings_path.is_file() {
            (Settings::load(&settings_path)?, true)
        } else {
            (Settings::default(), false)
        };

        Ok(Self {
            root,
            settings,
            has_settings,
        })
    }

    /// Build a project with explicit settings.
    pub fn with_settings(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings,
            has_settings: false,
        }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// The base `config.ini`.
    pub fn config_ini(&self) -> PathBuf {
        self.config_dir().join("config.ini")
    }

    /// The loose view resource tree.
    pub fn view_dir(&self) -> PathBuf {
        self.resolve(&self.settings.view_dir)
    }

    /// The "last replay" module inside the loose view tree.
    pub fn replay_module(&self) -> PathBuf {
        self.view_dir().join(REPLAY_MODULE)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.settings.effective_scratch_dir()
    }

    /// View bundles, resolved against the project root.
    pub fn view_bundles(&self) -> Vec<PathBuf> {
        self.settings
            .view_bundles
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    pub fn manifest_name(&self) -> &str {
        &self.settings.project_manifest
    }

    /// Merge parameters into the base `config.ini`, creating it if needed.
    ///
    /// Repeated keys are joined with `,` in the order given. Existing keys
    /// not mentioned are kept.
    #[instrument(skip_all, fields(project = %self.root.display()))]
    pub fn merge_config<I, K, V>(&self, params: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config_dir = self.config_dir();
        fs::create_dir_all(&config_dir)
            .map_err(|e| ArbiterError::io(&config_dir, "Cannot create config directory", e))?;

        let path = self.config_ini();
        let mut props = if path.is_file() {
            Properties::load(&path)?
        } else {
            Properties::new()
        };

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in params {
            grouped.entry(key.into()).or_default().push(value.into());
        }
        let merged = grouped.len();
        for (key, values) in grouped {
            props.set(key, values.join(CONFIG_VALUE_DELIMITER));
        }

        props.store(&path)?;
        info!(keys = merged, "config.ini updated");
        Ok(path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
