//! Preview preparation.
//!
//! Builds a fresh scratch directory for each preview: the game-state
//! snapshot, the staged view bundles and the rewritten assets. Returns the
//! ordered [`ResourceRoots`] the preview server resolves requests against.

mod roots;
mod scratch;

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::assets::rewrite_assets;
use crate::error::{ArbiterError, Result};
use crate::project::Project;

pub use roots::ResourceRoots;
pub use scratch::{remove_dir_if_exists, ScratchDir, StagedScratch};

/// Game-state snapshot file inside the scratch directory.
pub const GAME_STATE_FILE: &str = "game.json";

/// Content of the replay module when no replay has been saved.
pub const EMPTY_REPLAY_MODULE: &str = "export const demo = null;\n";

/// Render the replay module for a game-state snapshot.
pub fn replay_module(game_state: &str) -> String {
    format!("export const demo = {};\n", game_state.trim_end())
}

/// A source of default view resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBundle {
    /// A packaged archive; entries under the bundle prefix are extracted.
    Archive(PathBuf),
    /// A loose tree on disk. Also served live, ahead of the scratch copy.
    Directory(PathBuf),
}

impl ViewBundle {
    /// Classify a bundle path: `.zip`/`.jar` files are archives.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_archive = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip") || ext.eq_ignore_ascii_case("jar"));
        if is_archive {
            ViewBundle::Archive(path)
        } else {
            ViewBundle::Directory(path)
        }
    }

    fn path(&self) -> &Path {
        match self {
            ViewBundle::Archive(p) | ViewBundle::Directory(p) => p,
        }
    }
}

/// Prepares the scratch directory served by the preview.
#[derive(Debug, Clone)]
pub struct ViewExporter {
    scratch: ScratchDir,
    bundles: Vec<ViewBundle>,
    bundle_prefix: String,
    replay_module: PathBuf,
}

impl ViewExporter {
    pub fn new(
        scratch_dir: impl Into<PathBuf>,
        bundles: Vec<ViewBundle>,
        bundle_prefix: impl Into<String>,
        replay_module: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scratch: ScratchDir::new(scratch_dir),
            bundles,
            bundle_prefix: bundle_prefix.into(),
            replay_module: replay_module.into(),
        }
    }

    /// Framework bundles from the settings, then the project's loose view tree.
    pub fn for_project(project: &Project) -> Self {
        let mut bundles: Vec<ViewBundle> = project
            .view_bundles()
            .into_iter()
            .map(ViewBundle::from_path)
            .collect();
        bundles.push(ViewBundle::Directory(project.view_dir()));

        Self::new(
            project.scratch_dir(),
            bundles,
            project.settings.bundle_prefix.clone(),
            project.replay_module(),
        )
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Generate a preview and return the roots to serve it from.
    ///
    /// Loose bundle directories come first, latest bundle first, so the
    /// project's own view tree shadows framework files just as it does in
    /// the staged copy. The scratch directory comes last.
    #[instrument(skip_all, fields(scratch = %self.scratch.path().display()))]
    pub fn prepare(
        &self,
        game_state: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<ResourceRoots> {
        let staged = self.scratch.acquire()?;

        if let Some(state) = game_state {
            let path = staged.path().join(GAME_STATE_FILE);
            fs::write(&path, state)
                .map_err(|e| ArbiterError::io(&path, "Cannot write the game file", e))?;
        }

        let mut live_roots = Vec::new();
        let mut staged_count = 0;
        for bundle in &self.bundles {
            if !bundle.path().exists() {
                debug!(bundle = %bundle.path().display(), "view bundle not found, skipping");
                continue;
            }
            match bundle {
                ViewBundle::Archive(path) => {
                    let count = extract_archive(path, &self.bundle_prefix, staged.path())?;
                    debug!(archive = %path.display(), entries = count, "view archive staged");
                }
                ViewBundle::Directory(path) => {
                    copy_tree(path, staged.path())?;
                    live_roots.insert(0, path.clone());
                }
            }
            staged_count += 1;
        }

        if staged_count == 0 {
            return Err(ArbiterError::Export {
                message: "No view resources found".to_string(),
                help: Some("Add a view directory or set view_bundles in arbiter.yaml".to_string()),
            });
        }

        rewrite_assets(staged.path(), base_url)?;
        let scratch = staged.commit()?;

        self.ensure_replay_module();

        let mut roots = live_roots;
        roots.push(scratch);
        info!(roots = roots.len(), "preview prepared");
        Ok(ResourceRoots::new(roots))
    }

    /// Persist the latest game-state snapshot as the replay module.
    #[instrument(skip_all)]
    pub fn save_replay(&self) -> Result<PathBuf> {
        let game_file = self.scratch.path().join(GAME_STATE_FILE);
        let state = fs::read_to_string(&game_file)
            .map_err(|e| ArbiterError::io(&game_file, "No generated replay to save", e))?;

        if let Some(parent) = self.replay_module.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ArbiterError::io(parent, "Cannot create view directory", e))?;
        }
        fs::write(&self.replay_module, replay_module(&state))
            .map_err(|e| ArbiterError::io(&self.replay_module, "Cannot write replay module", e))?;

        info!(module = %self.replay_module.display(), "replay saved");
        Ok(self.replay_module.clone())
    }

    fn ensure_replay_module(&self) {
        if self.replay_module.exists() {
            return;
        }
        let result = self
            .replay_module
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&self.replay_module, EMPTY_REPLAY_MODULE));
        if let Err(e) = result {
            warn!(module = %self.replay_module.display(), "cannot create placeholder replay: {}", e);
        }
    }
}

/// Extract archive entries under `prefix` into `target`, keeping their
/// relative structure. Returns the number of files extracted.
fn extract_archive(archive_path: &Path, prefix: &str, target: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .map_err(|e| ArbiterError::io(archive_path, "Cannot open view archive", e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(tail) = entry.name().strip_prefix(prefix).map(str::to_string) else {
            continue;
        };
        if tail.is_empty() {
            continue;
        }

        let relative = Path::new(&tail);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            warn!(entry = %entry.name(), "skipping archive entry outside the view tree");
            continue;
        }

        let dest = target.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| ArbiterError::io(&dest, "Cannot create directory", e))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ArbiterError::io(parent, "Cannot create directory", e))?;
        }
        let mut out =
            File::create(&dest).map_err(|e| ArbiterError::io(&dest, "Cannot copy resources", e))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| ArbiterError::io(&dest, "Cannot copy resources", e))?;
        extracted += 1;
    }

    Ok(extracted)
}

/// Copy a directory tree into `target`, overwriting existing files.
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| ArbiterError::Io {
            path: source.to_path_buf(),
            message: format!("Cannot copy resources: {}", e),
        })?;
        let relative = match entry.path().strip_prefix(source) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| ArbiterError::io(&dest, "Cannot create directory", e))?;
        } else {
            fs::copy(entry.path(), &dest)
                .map_err(|e| ArbiterError::io(&dest, "Cannot copy resources", e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn make_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_bundle_classification() {
        assert_eq!(
            ViewBundle::from_path("engine.zip"),
            ViewBundle::Archive(PathBuf::from("engine.zip"))
        );
        assert_eq!(
            ViewBundle::from_path("src/view"),
            ViewBundle::Directory(PathBuf::from("src/view"))
        );
    }

    #[test]
    fn test_prepare_orders_live_roots_before_scratch() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "view/test.html", b"<html></html>");
        write(root, "view/assets/hero.png", b"hero");

        let exporter = ViewExporter::new(
            root.join("scratch"),
            vec![ViewBundle::Directory(root.join("view"))],
            "view/",
            root.join("view/demo.js"),
        );
        let roots = exporter.prepare(Some("{\"turns\":[]}"), None).unwrap();

        let roots: Vec<&Path> = roots.iter().collect();
        assert_eq!(roots, vec![root.join("view").as_path(), root.join("scratch").as_path()]);
        assert_eq!(
            fs::read_to_string(root.join("scratch/game.json")).unwrap(),
            "{\"turns\":[]}"
        );
        assert!(root.join("scratch/test.html").is_file());
        assert!(root.join("scratch/assets.js").is_file());
        assert_eq!(
            fs::read_to_string(root.join("view/demo.js")).unwrap(),
            EMPTY_REPLAY_MODULE
        );
    }

    #[test]
    fn test_project_view_shadows_framework_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "engine/test.html", b"<html>engine default</html>");
        write(root, "engine/core.js", b"export {}");
        write(root, "view/test.html", b"<html>live</html>");

        let exporter = ViewExporter::new(
            root.join("scratch"),
            vec![
                ViewBundle::Directory(root.join("engine")),
                ViewBundle::Directory(root.join("view")),
            ],
            "view/",
            root.join("view/demo.js"),
        );
        let roots = exporter.prepare(None, None).unwrap();

        let order: Vec<&Path> = roots.iter().collect();
        assert_eq!(
            order,
            vec![
                root.join("view").as_path(),
                root.join("engine").as_path(),
                root.join("scratch").as_path(),
            ]
        );
        let served = roots.resolve(Path::new("test.html")).unwrap();
        assert_eq!(fs::read_to_string(served).unwrap(), "<html>live</html>");
        assert_eq!(
            fs::read_to_string(root.join("scratch/test.html")).unwrap(),
            "<html>live</html>"
        );
        assert_eq!(
            roots.resolve(Path::new("core.js")),
            Some(root.join("engine/core.js"))
        );
    }

    #[test]
    fn test_prepare_extracts_archive_by_prefix() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        make_archive(
            &root.join("engine.zip"),
            &[
                ("view/core/player.js", b"export {}"),
                ("view/assets/logo.png", b"logo"),
                ("META-INF/MANIFEST.MF", b"x"),
                ("view/../escape.txt", b"x"),
            ],
        );

        let exporter = ViewExporter::new(
            root.join("scratch"),
            vec![ViewBundle::Archive(root.join("engine.zip"))],
            "view/",
            root.join("project/view/demo.js"),
        );
        let roots = exporter.prepare(None, Some("/cdn/")).unwrap();

        assert_eq!(roots.len(), 1);
        assert!(root.join("scratch/core/player.js").is_file());
        assert!(!root.join("scratch/META-INF").exists());
        assert!(!root.join("escape.txt").exists());
        assert!(!root.join("scratch/game.json").exists());
        assert!(root.join("scratch/hashed_assets").is_dir());
        assert!(root.join("project/view/demo.js").is_file());
    }

    #[test]
    fn test_prepare_without_resources_fails() {
        let dir = tempdir().unwrap();
        let exporter = ViewExporter::new(
            dir.path().join("scratch"),
            vec![ViewBundle::Directory(dir.path().join("missing"))],
            "view/",
            dir.path().join("demo.js"),
        );

        assert!(exporter.prepare(None, None).is_err());
    }

    #[test]
    fn test_existing_replay_is_kept() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "view/demo.js", b"export const demo = {\"saved\":true};\n");

        let exporter = ViewExporter::new(
            root.join("scratch"),
            vec![ViewBundle::Directory(root.join("view"))],
            "view/",
            root.join("view/demo.js"),
        );
        exporter.prepare(None, None).unwrap();

        assert!(fs::read_to_string(root.join("view/demo.js"))
            .unwrap()
            .contains("saved"));
    }

    #[test]
    fn test_save_replay() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "view/test.html", b"");

        let exporter = ViewExporter::new(
            root.join("scratch"),
            vec![ViewBundle::Directory(root.join("view"))],
            "view/",
            root.join("view/demo.js"),
        );
        exporter.prepare(Some("{\"frames\":[1]}\n"), None).unwrap();

        let saved = exporter.save_replay().unwrap();

        assert_eq!(
            fs::read_to_string(saved).unwrap(),
            "export const demo = {\"frames\":[1]};\n"
        );
    }

    #[test]
    fn test_save_replay_without_snapshot_fails() {
        let dir = tempdir().unwrap();
        let exporter = ViewExporter::new(
            dir.path().join("scratch"),
            vec![],
            "view/",
            dir.path().join("demo.js"),
        );

        let err = exporter.save_replay().unwrap_err();
        assert!(err.to_string().contains("No generated replay"));
    }
}
