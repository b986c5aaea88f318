//! Human-facing progress lines for the arbiter commands.
//!
//! Each line is a right-aligned verb followed by a message, e.g.
//! `  Validating ./my-game`. Everything goes to stderr so stdout stays free
//! for anything a caller might pipe.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Column the verbs are right-aligned to.
pub const VERB_WIDTH: usize = 12;

const RESET: &str = "\x1b[0m";

/// How a line or fragment is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Progress,
    Note,
    Caution,
    Failure,
    Faint,
    Link,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Progress => "\x1b[1;32m",
            Tone::Note => "\x1b[1;36m",
            Tone::Caution => "\x1b[1;33m",
            Tone::Failure => "\x1b[1;31m",
            Tone::Faint => "\x1b[2m",
            Tone::Link => "\x1b[36m",
        }
    }
}

/// Writes progress lines for validation, packaging and the preview server.
///
/// Highlighting is only used when stderr is attached to a terminal.
pub struct Printer {
    color: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    /// A step in progress: `Preparing`, `Validating`.
    pub fn status(&self, verb: &str, message: &str) {
        self.line(Tone::Progress, verb, message);
    }

    /// A finished step: `Packaged`, `Updated`, `Listening`.
    pub fn success(&self, verb: &str, message: &str) {
        self.line(Tone::Progress, verb, message);
    }

    pub fn info(&self, verb: &str, message: &str) {
        self.line(Tone::Note, verb, message);
    }

    pub fn warning(&self, verb: &str, message: &str) {
        self.line(Tone::Caution, verb, message);
    }

    pub fn error(&self, verb: &str, message: &str) {
        self.line(Tone::Failure, verb, message);
    }

    /// De-emphasised text, used for reference links under report items.
    pub fn dim(&self, text: &str) -> String {
        self.paint(Tone::Faint, text)
    }

    /// Highlighted text, used for the preview URL.
    pub fn cyan(&self, text: &str) -> String {
        self.paint(Tone::Link, text)
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.color {
            format!("{}{}{}", tone.ansi(), text, RESET)
        } else {
            text.to_string()
        }
    }

    fn line(&self, tone: Tone, verb: &str, message: &str) {
        let verb = format!("{:>width$}", verb, width = VERB_WIDTH);
        let _ = writeln!(io::stderr().lock(), "{} {}", self.paint(tone, &verb), message);
    }
}

/// `plural(2, "tier", "tiers")` is "2 tiers".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    let word = if n == 1 { singular } else { pluralized };
    format!("{} {}", n, word)
}

/// Show a path relative to the working directory when it lies below it.
pub fn display_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    match relative {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => rel.display().to_string(),
        None => path.display().to_string(),
    }
}
