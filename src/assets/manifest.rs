//! Asset manifest and its JavaScript module form.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{ArbiterError, Result};

/// Resolved asset names, consumed by the viewer through `assets.js`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetManifest {
    /// Public base URL of hashed assets (hashing mode only).
    #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Asset-relative path -> resolved name.
    pub images: BTreeMap<String, String>,

    /// Resolved sprite descriptor names.
    pub sprites: Vec<String>,
}

impl AssetManifest {
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url.map(str::to_string),
            ..Default::default()
        }
    }

    /// Whether assets are content-hashed.
    pub fn is_hashed(&self) -> bool {
        self.base_url.is_some()
    }

    /// Every resolved image name.
    pub fn image_names(&self) -> BTreeSet<&str> {
        self.images.values().map(String::as_str).collect()
    }

    /// Render as an ES module exporting `assets`.
    pub fn to_module(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("export const assets = {};\n", json))
    }

    /// Write the module file.
    pub fn write_module(&self, path: &Path) -> Result<()> {
        let module = self.to_module()?;
        fs::write(path, module).map_err(|e| ArbiterError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write asset manifest: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_without_base_url() {
        let mut manifest = AssetManifest::new(None);
        manifest
            .images
            .insert("hero.png".to_string(), "assets/hero.png".to_string());
        manifest.sprites.push("assets/hero.json".to_string());

        assert_eq!(
            manifest.to_module().unwrap(),
            "export const assets = {\"images\":{\"hero.png\":\"assets/hero.png\"},\"sprites\":[\"assets/hero.json\"]};\n"
        );
    }

    #[test]
    fn test_module_with_base_url() {
        let manifest = AssetManifest::new(Some("https://cdn.example.com/"));
        let module = manifest.to_module().unwrap();

        assert!(manifest.is_hashed());
        assert!(module.starts_with("export const assets = {\"baseUrl\":\"https://cdn.example.com/\""));
    }
}
