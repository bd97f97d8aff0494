//! Workspace paths: target resolution, file enumeration, and disk access.
//!
//! Target resolution policy:
//! - absolute `filePath` values are used as-is
//! - relative values are joined onto the workspace root
//! - paths inside the workspace are stored relative (with `/` separators),
//!   anything else is stored absolute

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{IoResultExt, MatchbarResult};

/// Dependency and tooling directories skipped when listing workspace files.
const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "target"];

/// Read access to target files.
///
/// Hosts normally use [`DiskFiles`]; tests substitute counting fakes.
pub trait FileSource: Send {
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> MatchbarResult<String>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFiles;

impl FileSource for DiskFiles {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Invalid UTF-8 is replaced rather than rejected.
    fn read_to_string(&self, path: &Path) -> MatchbarResult<String> {
        let bytes = fs::read(path).with_path(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Lexically normalise a path: drop `.` components and fold `..`.
///
/// Used to compare saved-document paths against the target without touching
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a configured `filePath` to an absolute path.
///
/// Returns `None` for a relative path when no workspace is open.
pub fn resolve_target(root: Option<&Path>, configured: &str) -> Option<PathBuf> {
    let path = Path::new(configured);
    if path.is_absolute() {
        return Some(normalize(path));
    }
    root.map(|r| normalize(&r.join(path)))
}

/// Value to persist for an existing absolute target path.
pub fn storage_form(root: Option<&Path>, absolute: &Path) -> String {
    let absolute = normalize(absolute);
    if let Some(root) = root {
        if let Ok(relative) = absolute.strip_prefix(normalize(root)) {
            if relative.as_os_str().is_empty() {
                return absolute.to_string_lossy().to_string();
            }
            return relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
        }
    }
    absolute.to_string_lossy().to_string()
}

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Lists every regular file under `root` as a sorted workspace-relative path.
///
/// `node_modules/`, `.git/` and `target/` subtrees are pruned before descent.
pub fn list_workspace_files(root: &Path) -> Result<Vec<String>> {
    let excludes: HashSet<&str> = EXCLUDED_DIRS.iter().copied().collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() => {
                Some(Ok(storage_form(Some(root), e.path())))
            }
            Ok(_) => None,
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to list files under {}", root.display()))?;

    files.sort();
    Ok(files)
}
