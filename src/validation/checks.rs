//! Artifact checks for a single configuration directory.
//!
//! Each check looks at one directory only (`config/` or `config/levelN/`)
//! and returns an [`Outcome`]. Tier inheritance is layered on top by the
//! resolver in the parent module.

use std::fs;
use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;

use crate::project::{CONFIG_DIR, MAX_PLAYERS};

use super::properties::Properties;
use super::report::{ReportItem, Severity, ValidationReport};

pub const STUB_SYNTAX_LINK: &str =
    "https://github.com/CodinGame/codingame-game-engine/blob/master/stubGeneratorSyntax.md";

/// An artifact expected in a configuration directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    ConfigIni,
    Stub,
    Statement,
    Boss,
    TierPopup,
}

impl Artifact {
    /// All artifacts, in the order they are checked.
    pub const ALL: [Artifact; 5] = [
        Artifact::ConfigIni,
        Artifact::Stub,
        Artifact::Statement,
        Artifact::Boss,
        Artifact::TierPopup,
    ];

    /// File name (or pattern) shown in messages.
    pub fn file_label(self) -> &'static str {
        match self {
            Artifact::ConfigIni => "config.ini",
            Artifact::Stub => "stub.txt",
            Artifact::Statement => "statement_en.html",
            Artifact::Boss => "Boss.*",
            Artifact::TierPopup => "welcome_en.html",
        }
    }
}

/// Result of checking one artifact in one directory.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Whether the artifact file exists in the directory.
    pub present: bool,
    pub report: ValidationReport,
}

impl Outcome {
    fn present(report: ValidationReport) -> Self {
        Self {
            present: true,
            report,
        }
    }

    fn absent(report: ValidationReport) -> Self {
        Self {
            present: false,
            report,
        }
    }
}

/// A configuration directory, addressed both on disk and in messages.
#[derive(Debug, Clone, Copy)]
pub struct ConfigDir<'a> {
    pub project_root: &'a Path,
    /// Project-relative label with trailing slash, e.g. `config/level2/`.
    pub label: &'a str,
}

impl ConfigDir<'_> {
    fn path(&self) -> std::path::PathBuf {
        self.project_root.join(self.label.trim_end_matches('/'))
    }

    fn display(&self, file: &str) -> String {
        format!("{}{}", self.label, file)
    }

    fn is_base(&self) -> bool {
        self.label.trim_end_matches('/') == CONFIG_DIR
    }
}

/// Check one artifact in one directory.
pub fn check_artifact(dir: ConfigDir<'_>, artifact: Artifact, tiers_present: bool) -> Outcome {
    match artifact {
        Artifact::ConfigIni => check_config_ini(dir),
        Artifact::Stub => check_stub(dir),
        Artifact::Statement => check_mandatory_file(dir, "statement_en.html"),
        Artifact::Boss => check_boss(dir),
        Artifact::TierPopup => check_tier_popup(dir, tiers_present),
    }
}

fn check_mandatory_file(dir: ConfigDir<'_>, filename: &str) -> Outcome {
    let mut report = ValidationReport::new();
    if dir.path().join(filename).is_file() {
        return Outcome::present(report);
    }
    report.missing_mandatory_file(format!("Missing {} file.", dir.display(filename)));
    Outcome::absent(report)
}

/// Check `config.ini` exists, parses, and declares valid player bounds.
pub fn check_config_ini(dir: ConfigDir<'_>) -> Outcome {
    let outcome = check_mandatory_file(dir, "config.ini");
    if !outcome.present {
        return outcome;
    }

    let mut report = outcome.report;
    let display = dir.display("config.ini");
    let path = dir.path().join("config.ini");

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            report.error(format!("{}: Cannot read config.ini: {}.", display, e));
            return Outcome::present(report);
        }
    };

    match Properties::parse(&content) {
        Ok(props) => report.merge(check_properties(&props, &display)),
        Err(e) => report.error(format!("{}: Cannot parse config.ini: {}.", display, e)),
    }

    Outcome::present(report)
}

/// Check the required keys of a parsed `config.ini`.
///
/// A missing or non-integer player bound stops the numeric checks; once
/// both bounds parse, every range violation is reported.
pub fn check_properties(props: &Properties, display: &str) -> ValidationReport {
    let mut report = ValidationReport::new();

    match props.get("title") {
        None => report.error(format!("{}: Missing title property in config.ini.", display)),
        Some(title) if title.trim().is_empty() => {
            report.error(format!("{}: title property should not be empty.", display))
        }
        Some(_) => {}
    }

    let mut bounds = [None, None];
    for (slot, key) in bounds.iter_mut().zip(["min_players", "max_players"]) {
        match props.get(key) {
            None => report.error(format!(
                "{}: Missing {} property in config.ini.",
                display, key
            )),
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) => *slot = Some(value),
                Err(_) => report.error(format!(
                    "{}: {} property is not an integer.",
                    display, key
                )),
            },
        }
    }

    let (min, max) = match bounds {
        [Some(min), Some(max)] => (min, max),
        _ => return report,
    };

    if min <= 0 {
        report.error(format!(
            "{}: min_players property should be greater than 0.",
            display
        ));
    }
    if min > max {
        report.error(format!(
            "{}: max_players property should be greater or equal to min_players property.",
            display
        ));
    }
    if max > MAX_PLAYERS {
        report.error(format!(
            "{}: max_players property should be lower or equal to {}.",
            display, MAX_PLAYERS
        ));
    }

    report
}

/// Check `stub.txt`. Advisory: absence is a warning, content is captured.
pub fn check_stub(dir: ConfigDir<'_>) -> Outcome {
    let mut report = ValidationReport::new();
    let display = dir.display("stub.txt");
    let path = dir.path().join("stub.txt");

    if !path.is_file() {
        report.push(
            ReportItem::new(
                Severity::Warning,
                format!("{}: Missing stub.txt file.", display),
            )
            .with_link(STUB_SYNTAX_LINK),
        );
        return Outcome::absent(report);
    }

    match fs::read(&path) {
        Ok(bytes) => report.capture_stub(display, String::from_utf8_lossy(&bytes)),
        Err(e) => report.warning(format!("{}: Cannot read stub.txt: {}.", display, e)),
    }
    Outcome::present(report)
}

/// Check that a `Boss.*` file exists.
pub fn check_boss(dir: ConfigDir<'_>) -> Outcome {
    let mut report = ValidationReport::new();

    let found = fs::read_dir(dir.path())
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|entry| {
                entry.path().is_file()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| name.starts_with("Boss."))
            })
        })
        .unwrap_or(false);

    if found {
        return Outcome::present(report);
    }
    report.missing_mandatory_file(format!("Missing {} file.", dir.display("Boss.*")));
    Outcome::absent(report)
}

fn image_src_regex() -> &'static Regex {
    static IMG_SRC: OnceLock<Regex> = OnceLock::new();
    IMG_SRC.get_or_init(|| {
        Regex::new(r#"(?is)<\s*img\s[^>]*?src\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("invalid regex pattern")
    })
}

/// Extract `<img src=...>` references from HTML-like content.
pub fn image_references(content: &str) -> Vec<String> {
    image_src_regex()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn is_external(reference: &str) -> bool {
    reference.contains("://") || reference.starts_with("data:")
}

/// A popup image reference as a path under the config directory.
///
/// A leading `/` is the config directory itself; references climbing out
/// of it never resolve.
fn popup_relative(reference: &str) -> Option<&Path> {
    let relative = Path::new(reference.trim_start_matches('/'));
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then_some(relative)
}

/// Check the tier popup and the images it embeds.
///
/// Absence is only reported when tiers exist. Image references resolve
/// against this directory first, then against the base `config/`.
pub fn check_tier_popup(dir: ConfigDir<'_>, tiers_present: bool) -> Outcome {
    let mut report = ValidationReport::new();
    let display = dir.display("welcome_en.html");
    let path = dir.path().join("welcome_en.html");

    if !path.is_file() {
        if tiers_present {
            report.warning(format!("{}: Missing welcome_en.html file.", display));
        }
        return Outcome::absent(report);
    }

    let content = match fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            report.warning(format!("{}: Cannot read welcome_en.html: {}.", display, e));
            return Outcome::present(report);
        }
    };

    let own_dir = dir.path();
    let base_dir = dir.project_root.join(CONFIG_DIR);

    for reference in image_references(&content) {
        if is_external(&reference) {
            continue;
        }
        let resolved = popup_relative(&reference).is_some_and(|relative| {
            own_dir.join(relative).is_file()
                || (!dir.is_base() && base_dir.join(relative).is_file())
        });
        if !resolved {
            report.warning(format!(
                "{}: File {} is used but missing.",
                display, reference
            ));
        }
    }

    Outcome::present(report)
}
