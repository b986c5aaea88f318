//! Asset rewriting for the preview viewer.
//!
//! Walks `<scratch>/assets`, rewrites sprite descriptors so their image
//! reference matches how images are served, optionally content-hashes every
//! file into `<scratch>/hashed_assets`, and writes `<scratch>/assets.js`.
//!
//! Without a public base URL assets are served in place (pass-through);
//! with one, every asset gets a content-addressed name that is safe to cache
//! forever.

mod hashing;
mod manifest;

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::error::{ArbiterError, Result};
use crate::project::slash_path;

pub use hashing::{hash_file, hashed_name, sha256_hex};
pub use manifest::AssetManifest;

/// Asset subtree inside the scratch directory.
pub const ASSETS_DIR: &str = "assets";

/// Destination of content-hashed assets.
pub const HASHED_ASSETS_DIR: &str = "hashed_assets";

/// Manifest module written to the scratch root.
pub const MANIFEST_MODULE: &str = "assets.js";

/// Maximum directory depth walked under the asset subtree.
const MAX_DEPTH: usize = 100;

/// How an asset file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Sprite sheet metadata (JSON) referencing a backing image.
    SpriteDescriptor,
    /// Any other file, served as-is.
    Image,
}

/// Detect the asset kind from a file path based on its extension.
pub fn detect_asset_kind(path: &Path) -> AssetKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => AssetKind::SpriteDescriptor,
        _ => AssetKind::Image,
    }
}

/// Rewrite assets under `scratch_dir` and write the manifest module.
///
/// Failures on individual assets are logged and the asset is skipped. A
/// missing asset subtree yields an empty manifest.
#[instrument(skip_all, fields(scratch = %scratch_dir.display(), hashed = base_url.is_some()))]
pub fn rewrite_assets(scratch_dir: &Path, base_url: Option<&str>) -> Result<AssetManifest> {
    let rewriter = AssetRewriter::new(scratch_dir, base_url.is_some());
    let mut manifest = AssetManifest::new(base_url);

    if rewriter.is_hashing() {
        fs::create_dir_all(&rewriter.hashed_dir).map_err(|e| ArbiterError::Io {
            path: rewriter.hashed_dir.clone(),
            message: format!("Failed to create hashed asset directory: {}", e),
        })?;
    }

    if rewriter.asset_root.is_dir() {
        for file in scan_assets(&rewriter.asset_root) {
            let result = match detect_asset_kind(&file) {
                AssetKind::SpriteDescriptor => rewriter.process_descriptor(&file, &mut manifest),
                AssetKind::Image => rewriter.process_image(&file, &mut manifest),
            };
            if let Err(e) = result {
                warn!(asset = %file.display(), "skipping asset: {}", e);
            }
        }
    } else {
        debug!("no asset directory, writing empty manifest");
    }

    manifest.write_module(&scratch_dir.join(MANIFEST_MODULE))?;
    debug!(
        images = manifest.images.len(),
        sprites = manifest.sprites.len(),
        "asset manifest written"
    );

    Ok(manifest)
}

/// All regular files under the asset root, in a stable order.
fn scan_assets(asset_root: &Path) -> Vec<PathBuf> {
    WalkDir::new(asset_root)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("cannot walk asset tree: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

struct AssetRewriter {
    scratch_dir: PathBuf,
    asset_root: PathBuf,
    hashed_dir: PathBuf,
    hashing: bool,
}

impl AssetRewriter {
    fn new(scratch_dir: &Path, hashing: bool) -> Self {
        Self {
            scratch_dir: scratch_dir.to_path_buf(),
            asset_root: scratch_dir.join(ASSETS_DIR),
            hashed_dir: scratch_dir.join(HASHED_ASSETS_DIR),
            hashing,
        }
    }

    fn is_hashing(&self) -> bool {
        self.hashing
    }

    fn asset_relative(&self, path: &Path) -> String {
        slash_path(path.strip_prefix(&self.asset_root).unwrap_or(path))
    }

    fn scratch_relative(&self, path: &Path) -> String {
        slash_path(path.strip_prefix(&self.scratch_dir).unwrap_or(path))
    }

    fn process_image(&self, path: &Path, manifest: &mut AssetManifest) -> Result<()> {
        let key = self.asset_relative(path);

        let resolved = if self.hashing {
            let name = hash_file(path).map_err(|e| ArbiterError::io(path, "Failed to hash asset", e))?;
            let target = self.hashed_dir.join(&name);
            fs::copy(path, &target)
                .map_err(|e| ArbiterError::io(&target, "Failed to copy hashed asset", e))?;
            name
        } else {
            self.scratch_relative(path)
        };

        manifest.images.insert(key, resolved);
        Ok(())
    }

    fn process_descriptor(&self, path: &Path, manifest: &mut AssetManifest) -> Result<()> {
        let raw = fs::read(path).map_err(|e| ArbiterError::io(path, "Failed to read sprite descriptor", e))?;
        let mut descriptor: Value = serde_json::from_slice(&raw)?;

        let image = descriptor
            .pointer("/meta/image")
            .and_then(Value::as_str)
            .ok_or_else(|| ArbiterError::Parse {
                message: format!("{}: sprite descriptor has no meta.image", path.display()),
                help: Some("Sprite sheets need a `meta.image` entry naming their image".to_string()),
            })?
            .to_string();
        let image_path = self.resolve_image(&image)?;

        if self.hashing {
            let image_name = hash_file(&image_path)
                .map_err(|e| ArbiterError::io(&image_path, "Failed to hash sprite image", e))?;
            set_image(&mut descriptor, image_name);

            let rewritten = serde_json::to_vec(&descriptor)?;
            let name = hashed_name(&rewritten, path);
            let target = self.hashed_dir.join(&name);
            fs::write(&target, &rewritten)
                .map_err(|e| ArbiterError::io(&target, "Failed to write sprite descriptor", e))?;
            manifest.sprites.push(name);
        } else {
            set_image(&mut descriptor, self.scratch_relative(&image_path));

            let rewritten = serde_json::to_vec(&descriptor)?;
            fs::write(path, &rewritten)
                .map_err(|e| ArbiterError::io(path, "Failed to write sprite descriptor", e))?;
            manifest.sprites.push(self.scratch_relative(path));
        }

        Ok(())
    }

    /// Resolve a descriptor's image reference against the asset root.
    ///
    /// The image must stay inside the asset tree so it is also published
    /// through the image map.
    fn resolve_image(&self, image: &str) -> Result<PathBuf> {
        let relative = Path::new(image);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ArbiterError::Parse {
                message: format!("sprite image '{}' points outside the asset directory", image),
                help: None,
            });
        }

        let path = self.asset_root.join(relative);
        if !path.is_file() {
            return Err(ArbiterError::Io {
                path,
                message: "Sprite image not found".to_string(),
            });
        }
        Ok(path)
    }
}

fn set_image(descriptor: &mut Value, image: String) {
    if let Some(meta) = descriptor.get_mut("meta").and_then(Value::as_object_mut) {
        meta.insert("image".to_string(), Value::String(image));
    }
}
