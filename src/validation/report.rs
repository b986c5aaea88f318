//! Report types for project validation.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine as _;
use serde::{Serialize, Serializer};

/// Severity level for a report item.
///
/// `MissingMandatoryFile` is internal: it marks a required artifact that is
/// absent at one level so tier inheritance can still retry the base
/// directory. [`ValidationReport::normalize`] turns it into `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    MissingMandatoryFile,
    Info,
}

impl Severity {
    /// Whether this severity flips the export status to FAIL.
    pub fn is_failure(self) -> bool {
        matches!(self, Severity::Error | Severity::MissingMandatoryFile)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::MissingMandatoryFile => write!(f, "missing"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A single report item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub severity: Severity,
    pub message: String,
    /// Optional reference link explaining the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl ReportItem {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            link: None,
        }
    }

    /// Attach a reference link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Overall outcome of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportStatus {
    Success,
    Fail,
}

/// Collects report items, captured stubs and, after packaging, the archive.
///
/// Serializes to the `/services/export` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    report_items: Vec<ReportItem>,
    export_status: ExportStatus,
    #[serde(
        rename = "data",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_archive"
    )]
    archive: Option<Vec<u8>>,
    stubs: BTreeMap<String, String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            report_items: vec![],
            export_status: ExportStatus::Success,
            archive: None,
            stubs: BTreeMap::new(),
        }
    }
}

impl ValidationReport {
    /// Create an empty, successful report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item, updating the status.
    pub fn push(&mut self, item: ReportItem) {
        if item.severity.is_failure() {
            self.export_status = ExportStatus::Fail;
        }
        self.report_items.push(item);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::Error, message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::Warning, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::Info, message));
    }

    pub fn missing_mandatory_file(&mut self, message: impl Into<String>) {
        self.push(ReportItem::new(Severity::MissingMandatoryFile, message));
    }

    /// Record the verbatim content of a stub file.
    pub fn capture_stub(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.stubs.insert(path.into(), content.into());
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        for item in other.report_items {
            self.push(item);
        }
        self.stubs.extend(other.stubs);
    }

    /// Rewrite every `MissingMandatoryFile` item as `Error`.
    pub fn normalize(&mut self) {
        for item in &mut self.report_items {
            if item.severity == Severity::MissingMandatoryFile {
                item.severity = Severity::Error;
            }
        }
    }

    pub fn status(&self) -> ExportStatus {
        self.export_status
    }

    pub fn is_success(&self) -> bool {
        self.export_status == ExportStatus::Success
    }

    pub fn has_mandatory_file_missing(&self) -> bool {
        self.report_items
            .iter()
            .any(|i| i.severity == Severity::MissingMandatoryFile)
    }

    /// Attach the packaged archive. Only meaningful on a successful report.
    pub fn attach_archive(&mut self, bytes: Vec<u8>) {
        self.archive = Some(bytes);
    }

    pub fn archive(&self) -> Option<&[u8]> {
        self.archive.as_deref()
    }

    pub fn stubs(&self) -> &BTreeMap<String, String> {
        &self.stubs
    }

    /// Iterate over items.
    pub fn iter(&self) -> impl Iterator<Item = &ReportItem> {
        self.report_items.iter()
    }

    pub fn items(&self) -> &[ReportItem] {
        &self.report_items
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.report_items
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }
}

fn serialize_archive<S: Serializer>(
    archive: &Option<Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match archive {
        Some(bytes) => serializer
            .serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}
