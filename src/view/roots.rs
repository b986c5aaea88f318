//! Ordered resource roots for static resolution.

use std::path::{Component, Path, PathBuf};

/// Filesystem roots searched in order; the first match wins.
///
/// Live (loose) view trees come first so in-place edits override the
/// staged copy in the scratch directory, which is always last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRoots {
    roots: Vec<PathBuf>,
}

impl ResourceRoots {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find the first root containing `relative` as a regular file.
    ///
    /// Paths that are absolute or climb with `..` never resolve.
    pub fn resolve(&self, relative: &Path) -> Option<PathBuf> {
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return None;
        }

        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
    }
}
