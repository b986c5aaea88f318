//! Project configuration validation.
//!
//! Checks the `config/` tree against the layout the game engine expects and
//! produces a [`ValidationReport`]. Used by `arbiter validate`, `arbiter
//! package` and the preview server's export action.
//!
//! Tiers (`config/level1` … `config/levelN`) may omit any artifact and
//! inherit it from the base `config/` directory. Each inheritance is
//! recorded as an INFO item.

mod checks;
mod properties;
mod report;

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use crate::output::{Printer, VERB_WIDTH};
use crate::project::{tier_dir_name, CONFIG_DIR, MAX_TIERS};

pub use checks::{
    check_artifact, check_properties, image_references, Artifact, ConfigDir, Outcome,
    STUB_SYNTAX_LINK,
};
pub use properties::Properties;
pub use report::{ExportStatus, ReportItem, Severity, ValidationReport};

/// Which directory satisfied an artifact for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Found in the tier's own directory.
    Tier,
    /// Inherited from the base `config/` directory.
    Base,
    /// Found in neither.
    Unresolved,
}

/// Tier layout problems that abort validation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TierScan {
    Tiers(u32),
    NotConsecutive(u32),
    TooMany,
}

/// Validate the configuration tree of a project.
///
/// Structural problems (missing `config/`, tier gaps, too many tiers) stop
/// the pass with a single error. Per-artifact problems are collected.
#[instrument(skip_all, fields(project = %project_root.display()))]
pub fn validate_project(project_root: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();

    if !project_root.join(CONFIG_DIR).is_dir() {
        report.error("Missing config directory.");
        return report;
    }

    let tiers = match scan_tiers(project_root) {
        TierScan::Tiers(count) => count,
        TierScan::NotConsecutive(ordinal) => {
            report.error(format!(
                "Folder {}/{} must be consecutive with previous tiers.",
                CONFIG_DIR,
                tier_dir_name(ordinal)
            ));
            return report;
        }
        TierScan::TooMany => {
            report.error(format!("Too many tiers (>{}).", MAX_TIERS));
            return report;
        }
    };

    let base_label = format!("{}/", CONFIG_DIR);
    let base = ConfigDir {
        project_root,
        label: &base_label,
    };

    if tiers == 0 {
        debug!("no tiers, checking base configuration only");
        for artifact in Artifact::ALL {
            report.merge(check_artifact(base, artifact, false).report);
        }
    } else {
        debug!(tiers, "checking tiers");
        for ordinal in 1..=tiers {
            let tier_label = format!("{}/{}/", CONFIG_DIR, tier_dir_name(ordinal));
            let tier = ConfigDir {
                project_root,
                label: &tier_label,
            };
            for artifact in Artifact::ALL {
                let provenance = resolve_artifact(&mut report, tier, base, artifact);
                debug!(tier = ordinal, artifact = artifact.file_label(), ?provenance);
            }
        }
    }

    report.normalize();
    report
}

/// Check an artifact in a tier, falling back to the base directory when the
/// tier does not have its own copy.
///
/// Issues found in a tier-local file are kept as-is: inheritance only
/// applies to absence.
pub fn resolve_artifact(
    report: &mut ValidationReport,
    tier: ConfigDir<'_>,
    base: ConfigDir<'_>,
    artifact: Artifact,
) -> Provenance {
    let local = check_artifact(tier, artifact, true);
    if local.present {
        report.merge(local.report);
        return Provenance::Tier;
    }

    report.info(format!(
        "{}: Inherit {} file from {} directory.",
        tier.label,
        artifact.file_label(),
        CONFIG_DIR
    ));

    let inherited = check_artifact(base, artifact, true);
    let provenance = if inherited.present {
        Provenance::Base
    } else {
        Provenance::Unresolved
    };
    report.merge(inherited.report);
    provenance
}

fn scan_tiers(project_root: &Path) -> TierScan {
    let config_dir = project_root.join(CONFIG_DIR);

    let mut ordinals: Vec<u32> = fs::read_dir(&config_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .filter_map(|e| parse_tier_ordinal(&e.file_name().to_string_lossy()))
                .collect()
        })
        .unwrap_or_default();
    ordinals.sort_unstable();

    let mut expected = 1;
    for &ordinal in ordinals.iter().filter(|&&o| o <= MAX_TIERS) {
        if ordinal != expected {
            return TierScan::NotConsecutive(ordinal);
        }
        expected += 1;
    }

    if ordinals.iter().any(|&o| o > MAX_TIERS) {
        return TierScan::TooMany;
    }

    TierScan::Tiers(expected - 1)
}

fn parse_tier_ordinal(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("level")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0')
    {
        return None;
    }
    digits.parse().ok()
}

/// Print a report to stderr.
pub fn print_report(report: &ValidationReport, printer: &Printer) {
    for item in report.iter() {
        match item.severity {
            Severity::Error | Severity::MissingMandatoryFile => printer.error("error", &item.message),
            Severity::Warning => printer.warning("warning", &item.message),
            Severity::Info => printer.info("info", &item.message),
        }
        if let Some(link) = &item.link {
            eprintln!("{:>width$} {}", "", printer.dim(&format!("see {}", link)), width = VERB_WIDTH);
        }
    }

    let errors = report.count(Severity::Error) + report.count(Severity::MissingMandatoryFile);
    let warnings = report.count(Severity::Warning);

    if errors > 0 {
        printer.error(
            "Failed",
            &format!("{} error(s), {} warning(s)", errors, warnings),
        );
    } else if warnings > 0 {
        printer.warning("Passed", &format!("{} warning(s)", warnings));
    } else {
        printer.success("Passed", "configuration is valid");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const VALID_INI: &str = "title=Tron\nmin_players=2\nmax_players=4\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn complete_base(root: &Path) {
        write(root, "config/config.ini", VALID_INI);
        write(root, "config/stub.txt", "read n:int\n");
        write(root, "config/statement_en.html", "<p>rules</p>");
        write(root, "config/Boss.java", "class Boss {}");
        write(root, "config/welcome_en.html", "<p>welcome</p>");
    }

    fn has_message(report: &ValidationReport, needle: &str) -> bool {
        report.iter().any(|i| i.message.contains(needle))
    }

    #[test]
    fn test_missing_config_directory() {
        let dir = tempdir().unwrap();

        let report = validate_project(dir.path());

        assert_eq!(report.status(), ExportStatus::Fail);
        assert_eq!(report.items().len(), 1);
        assert_eq!(report.items()[0].message, "Missing config directory.");
    }

    #[test]
    fn test_base_only_project_passes() {
        let dir = tempdir().unwrap();
        complete_base(dir.path());

        let report = validate_project(dir.path());

        assert!(report.is_success(), "{:?}", report.items());
        assert!(report.stubs().contains_key("config/stub.txt"));
    }

    #[test]
    fn test_base_only_missing_statement_is_error() {
        let dir = tempdir().unwrap();
        complete_base(dir.path());
        fs::remove_file(dir.path().join("config/statement_en.html")).unwrap();

        let report = validate_project(dir.path());

        assert_eq!(report.status(), ExportStatus::Fail);
        assert_eq!(report.count(Severity::MissingMandatoryFile), 0);
        assert!(has_message(&report, "Missing config/statement_en.html file."));
    }

    #[test]
    fn test_non_consecutive_tiers_abort() {
        let dir = tempdir().unwrap();
        complete_base(dir.path());
        for ordinal in [1, 2, 3, 4, 5, 7] {
            fs::create_dir_all(dir.path().join(format!("config/level{}", ordinal))).unwrap();
        }

        let report = validate_project(dir.path());

        assert_eq!(report.status(), ExportStatus::Fail);
        assert_eq!(report.items().len(), 1);
        assert!(has_message(&report, "level7 must be consecutive"));
    }

    #[test]
    fn test_too_many_tiers() {
        let dir = tempdir().unwrap();
        complete_base(dir.path());
        for ordinal in 1..=51 {
            fs::create_dir_all(dir.path().join(format!("config/level{}", ordinal))).unwrap();
        }

        let report = validate_project(dir.path());

        assert_eq!(report.items().len(), 1);
        assert!(has_message(&report, "Too many tiers (>50)"));
    }

    #[test]
    fn test_tier_inherits_stub_from_base() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        complete_base(root);
        write(root, "config/level1/config.ini", VALID_INI);
        write(root, "config/level1/statement_en.html", "<p>tier 1</p>");
        write(root, "config/level1/Boss.java", "class Boss {}");
        write(root, "config/level1/welcome_en.html", "<p>tier 1</p>");

        let report = validate_project(root);

        assert!(report.is_success(), "{:?}", report.items());
        assert_eq!(report.count(Severity::Info), 1);
        assert!(has_message(
            &report,
            "config/level1/: Inherit stub.txt file from config directory."
        ));
        assert!(report.stubs().contains_key("config/stub.txt"));
    }

    #[test]
    fn test_boss_missing_everywhere_fails() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        complete_base(root);
        fs::remove_file(root.join("config/Boss.java")).unwrap();
        fs::create_dir_all(root.join("config/level1")).unwrap();

        let report = validate_project(root);

        assert_eq!(report.status(), ExportStatus::Fail);
        assert_eq!(report.count(Severity::MissingMandatoryFile), 0);
        assert!(report
            .iter()
            .any(|i| i.severity == Severity::Error && i.message == "Missing config/Boss.* file."));
    }

    #[test]
    fn test_tier_config_errors_not_suppressed() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        complete_base(root);
        write(root, "config/level1/config.ini", "title=Tron\nmin_players=3\nmax_players=2\n");

        let report = validate_project(root);

        assert_eq!(report.status(), ExportStatus::Fail);
        assert!(has_message(&report, "config/level1/config.ini: max_players"));
        assert!(!has_message(&report, "Inherit config.ini"));
    }

    #[test]
    fn test_popup_inheritance_message_names_popup() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        complete_base(root);
        fs::create_dir_all(root.join("config/level1")).unwrap();

        let report = validate_project(root);

        assert!(has_message(
            &report,
            "config/level1/: Inherit welcome_en.html file from config directory."
        ));
        assert!(report.is_success(), "{:?}", report.items());
    }

    #[test]
    fn test_resolve_artifact_provenance() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        complete_base(root);
        write(root, "config/level1/Boss.js", "");
        let tier = ConfigDir {
            project_root: root,
            label: "config/level1/",
        };
        let base = ConfigDir {
            project_root: root,
            label: "config/",
        };
        let mut report = ValidationReport::new();

        assert_eq!(
            resolve_artifact(&mut report, tier, base, Artifact::Boss),
            Provenance::Tier
        );
        assert_eq!(
            resolve_artifact(&mut report, tier, base, Artifact::Statement),
            Provenance::Base
        );
        fs::remove_file(root.join("config/stub.txt")).unwrap();
        assert_eq!(
            resolve_artifact(&mut report, tier, base, Artifact::Stub),
            Provenance::Unresolved
        );
    }

    #[test]
    fn test_parse_tier_ordinal() {
        assert_eq!(parse_tier_ordinal("level1"), Some(1));
        assert_eq!(parse_tier_ordinal("level42"), Some(42));
        assert_eq!(parse_tier_ordinal("level"), None);
        assert_eq!(parse_tier_ordinal("level01"), None);
        assert_eq!(parse_tier_ordinal("levelx"), None);
        assert_eq!(parse_tier_ordinal("assets"), None);
    }
}
