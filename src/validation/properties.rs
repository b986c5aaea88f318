//! Key-value properties files (`config.ini`).
//!
//! Lines are `key=value`, `key: value` or `key value`. `#` and `!` start
//! comments, a trailing backslash continues the value on the next line.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{ArbiterError, Result};

/// Ordered key-value properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties from a string.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        let mut lines = content.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line = raw.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_pair(&logical).ok_or_else(|| ArbiterError::Parse {
                message: format!("line {} is not a key=value pair", index + 1),
                help: Some("Use `key=value` entries, one per line".to_string()),
            })?;
            entries.insert(unescape(key), unescape(value));
        }

        Ok(Self { entries })
    }

    /// Load properties from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ArbiterError::io(path, "Failed to read properties", e))?;
        Self::parse(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `key=value` lines in key order.
    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    /// Write to a file, replacing its content.
    pub fn store(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_file_string())
            .map_err(|e| ArbiterError::io(path, "Failed to write properties", e))
    }
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 1
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                let key = line[..i].trim_end();
                if key.is_empty() {
                    return None;
                }
                return Some((key, line[i + 1..].trim()));
            }
            c if c.is_whitespace() => {
                let key = &line[..i];
                let rest = line[i..].trim_start();
                let value = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return Some((key, value.trim()));
            }
            _ => {}
        }
    }
    None
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // UTF-16 units from `\uXXXX` escapes; surrogate pairs span two escapes.
    let mut units: Vec<u16> = Vec::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some('u') = chars.clone().next() {
                chars.next();
                let hex: String = chars.by_ref().take(4).collect();
                match u16::from_str_radix(&hex, 16) {
                    Ok(unit) if hex.len() == 4 => {
                        units.push(unit);
                        continue;
                    }
                    _ => {
                        flush_units(&mut units, &mut out);
                        out.push('u');
                        out.push_str(&hex);
                        continue;
                    }
                }
            }
        }

        flush_units(&mut units, &mut out);
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    flush_units(&mut units, &mut out);
    out
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if !units.is_empty() {
        out.push_str(&String::from_utf16_lossy(units));
        units.clear();
    }
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_separators() {
        let props = Properties::parse("title=Tron\nmin_players: 2\nmax_players 4\n").unwrap();

        assert_eq!(props.get("title"), Some("Tron"));
        assert_eq!(props.get("min_players"), Some("2"));
        assert_eq!(props.get("max_players"), Some("4"));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let props = Properties::parse("# header\n\n! legacy comment\ntitle = Snake\n").unwrap();

        assert_eq!(props.len(), 1);
        assert_eq!(props.get("title"), Some("Snake"));
    }

    #[test]
    fn test_parse_continuation() {
        let props = Properties::parse("title=Very \\\n    Long Title\n").unwrap();
        assert_eq!(props.get("title"), Some("Very Long Title"));
    }

    #[test]
    fn test_parse_rejects_bare_word() {
        let err = Properties::parse("title=ok\ngarbage\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_escaped_key_round_trip() {
        let mut props = Properties::new();
        props.set("odd key", "a\\b");

        let parsed = Properties::parse(&props.to_file_string()).unwrap();
        assert_eq!(parsed.get("odd key"), Some("a\\b"));
    }

    #[test]
    fn test_unicode_escapes_decoded() {
        let props = Properties::parse(
            "title=Caf\\u00e9\nicon=\\ud83d\\ude00\nbroken=\\u00zz\n",
        )
        .unwrap();

        assert_eq!(props.get("title"), Some("Café"));
        assert_eq!(props.get("icon"), Some("😀"));
        assert_eq!(props.get("broken"), Some("u00zz"));
    }

    #[test]
    fn test_empty_value_is_kept() {
        let props = Properties::parse("title=\n").unwrap();
        assert_eq!(props.get("title"), Some(""));
    }

    #[test]
    fn test_store_round_trips_through_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let mut props = Properties::new();
        props.set("title", "Code of Kutulu");
        props.set("type", "multi,solo");
        props.store(&path).unwrap();

        let loaded = Properties::load(&path).unwrap();
        assert_eq!(loaded, props);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "title=Code of Kutulu\ntype=multi,solo\n"
        );
    }
}
