//! Source packaging.
//!
//! Bundles the configuration tree, the source tree and the project manifest
//! into one in-memory zip archive, keyed by forward-slash relative paths.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArbiterError, Result};
use crate::project::{slash_path, Project, CONFIG_DIR, SOURCE_DIR};
use crate::validation::{validate_project, ValidationReport};

/// Whether a project-relative path belongs in the archive.
pub fn is_packaged(relative: &str, manifest_name: &str) -> bool {
    relative == manifest_name
        || relative.starts_with(&format!("{}/", CONFIG_DIR))
        || relative.starts_with(&format!("{}/", SOURCE_DIR))
}

/// Whether to descend into a directory while walking the project.
fn worth_descending(entry: &DirEntry, root: &Path) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return true;
    }
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    let first = relative
        .components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default();
    first == CONFIG_DIR || first == SOURCE_DIR
}

/// Package the project sources into a zip archive held in memory.
#[instrument(skip_all, fields(project = %project_root.display()))]
pub fn package_sources(project_root: &Path, manifest_name: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0usize;

    let walker = WalkDir::new(project_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| worth_descending(e, project_root));

    for entry in walker {
        let entry = entry.map_err(|e| ArbiterError::Io {
            path: project_root.to_path_buf(),
            message: format!("Failed to walk project: {}", e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(project_root) {
            Ok(rel) => slash_path(rel),
            Err(_) => continue,
        };
        if !is_packaged(&relative, manifest_name) {
            continue;
        }

        let mut file = File::open(entry.path())
            .map_err(|e| ArbiterError::io(entry.path(), "Failed to read source", e))?;
        zip.start_file(relative.as_str(), options)?;
        io::copy(&mut file, &mut zip)
            .map_err(|e| ArbiterError::io(entry.path(), "Failed to archive source", e))?;
        debug!(entry = %relative, "packaged");
        count += 1;
    }

    let bytes = zip.finish()?.into_inner();
    info!(files = count, bytes = bytes.len(), "sources packaged");
    Ok(bytes)
}

/// Validate the project and, only when it passes, attach the packaged sources.
///
/// The report is returned whatever the outcome; a failing report never
/// carries an archive.
#[instrument(skip_all, fields(project = %project.root.display()))]
pub fn export_project(project: &Project) -> Result<ValidationReport> {
    let mut report = validate_project(&project.root);
    if report.is_success() {
        let archive = package_sources(&project.root, project.manifest_name())?;
        report.attach_archive(archive);
    } else {
        info!("validation failed, sources not packaged");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_is_packaged() {
        assert!(is_packaged("config/config.ini", "pom.xml"));
        assert!(is_packaged("src/main/java/Referee.java", "pom.xml"));
        assert!(is_packaged("pom.xml", "pom.xml"));
        assert!(!is_packaged("configuration.txt", "pom.xml"));
        assert!(!is_packaged("target/pom.xml", "pom.xml"));
        assert!(!is_packaged("srcfile", "pom.xml"));
    }

    #[test]
    fn test_package_selects_project_sources() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "config/config.ini", "title=Duel\n");
        write(root, "config/level1/Boss.java", "class Boss {}");
        write(root, "src/main/java/Referee.java", "class Referee {}");
        write(root, "pom.xml", "<project/>");
        write(root, "target/classes/Referee.class", "binary");
        write(root, "README.md", "# readme");

        let names = entry_names(package_sources(root, "pom.xml").unwrap());

        assert_eq!(
            names,
            vec![
                "config/config.ini",
                "config/level1/Boss.java",
                "pom.xml",
                "src/main/java/Referee.java",
            ]
        );
    }

    #[test]
    fn test_package_preserves_content() {
        let dir = tempdir().unwrap();
        write(dir.path(), "config/stub.txt", "read n:int\n");

        let bytes = package_sources(dir.path(), "pom.xml").unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("config/stub.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();

        assert_eq!(content, "read n:int\n");
    }

    fn valid_project(root: &Path) {
        write(root, "config/config.ini", "title=Duel\nmin_players=2\nmax_players=2\n");
        write(root, "config/statement_en.html", "<p>Rules</p>");
        write(root, "config/stub.txt", "read n:int\n");
        write(root, "config/Boss.java", "class Boss {}");
        write(root, "pom.xml", "<project/>");
    }

    #[test]
    fn test_export_attaches_archive_on_success() {
        let dir = tempdir().unwrap();
        valid_project(dir.path());

        let report = export_project(&Project::open(dir.path()).unwrap()).unwrap();

        assert!(report.is_success());
        let names = entry_names(report.archive().unwrap().to_vec());
        assert!(names.contains(&"pom.xml".to_string()));
        assert!(names.iter().all(|n| n == "pom.xml" || n.starts_with("config/")));
    }

    #[test]
    fn test_export_never_packages_on_failure() {
        let dir = tempdir().unwrap();
        valid_project(dir.path());
        write(dir.path(), "config/config.ini", "title=Duel\nmin_players=3\nmax_players=2\n");

        let report = export_project(&Project::open(dir.path()).unwrap()).unwrap();

        assert!(!report.is_success());
        assert!(report.archive().is_none());
    }

    #[test]
    fn test_custom_manifest_name() {
        let dir = tempdir().unwrap();
        write(dir.path(), "build.gradle", "apply plugin");
        write(dir.path(), "pom.xml", "<project/>");

        let names = entry_names(package_sources(dir.path(), "build.gradle").unwrap());

        assert_eq!(names, vec!["build.gradle"]);
    }
}
