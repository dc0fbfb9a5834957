//! Filesystem utility functions
//!
//! Inspection and removal helpers that never follow links, so a shared
//! resource can be unlinked without touching the global profile behind it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};

/// What currently occupies a path, determined without following links
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    File,
    Directory,
    Link { target: PathBuf },
    BrokenLink { target: PathBuf },
}

impl EntryKind {
    pub fn detect(path: &Path) -> Self {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let target = fs::read_link(path).unwrap_or_else(|_| PathBuf::from("?"));
                // `exists` follows the link
                if path.exists() {
                    Self::Link { target }
                } else {
                    Self::BrokenLink { target }
                }
            }
            Ok(meta) if meta.is_dir() => Self::Directory,
            Ok(_) => Self::File,
            Err(_) => Self::Missing,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. } | Self::BrokenLink { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Link target, for links only
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::Link { target } | Self::BrokenLink { target } => Some(target),
            _ => None,
        }
    }
}

/// Delete a real (non-link) file or directory tree at `path`
pub fn remove_real_item(path: &Path) -> Result<()> {
    match EntryKind::detect(path) {
        EntryKind::Directory => fs::remove_dir_all(path).at("delete directory", path),
        EntryKind::File => fs::remove_file(path).at("delete file", path),
        EntryKind::Missing => Ok(()),
        EntryKind::Link { .. } | EntryKind::BrokenLink { .. } => remove_link(path),
    }
}

/// Delete the link entry at `path` itself, never what it points to
pub fn remove_link(path: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        // Directory symlinks are directories as far as Windows is concerned.
        if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
            return fs::remove_dir(path).at("delete link", path);
        }
    }

    fs::remove_file(path).at("delete link", path)
}

/// Whether both paths resolve to the same existing file
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
