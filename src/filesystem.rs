//! On-disk tree helpers shared by the fetch, cache and vendoring layers

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Recursively copy `src` into `dst`.
///
/// `src` may be a directory (its contents land in `dst`) or a single file (it
/// is copied to `dst/<file name>`). Missing parents of `dst` are created.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;

    if src.is_file() {
        let name = src.file_name().ok_or_else(|| Error::Cache {
            message: format!("Cannot copy {}: no file name", src.display()),
        })?;
        fs::copy(src, dst.join(name))?;
        return Ok(());
    }

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| Error::Cache {
            message: format!("Failed to walk {}: {}", src.display(), e),
        })?;
        let relative = entry.path().strip_prefix(src).map_err(|e| Error::Cache {
            message: format!("Failed to relativize {}: {}", entry.path().display(), e),
        })?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Create a hidden staging directory next to `target`.
///
/// Staging on the same filesystem as `target` lets the caller publish the
/// result with a single `rename`. The directory is removed when dropped.
pub fn staging_dir_for(target: &Path, prefix: &str) -> Result<TempDir> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    let staging = tempfile::Builder::new().prefix(prefix).tempdir_in(&parent)?;
    Ok(staging)
}

/// Remove a file or directory tree, succeeding if nothing is there.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Move `from` onto `to`, replacing whatever `to` held.
pub fn replace_dir(from: &Path, to: &Path) -> Result<()> {
    remove_if_exists(to)?;
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(from, to)?;
    Ok(())
}

/// Delete every `.git` entry below `root`, at any depth.
pub fn remove_git_metadata(root: &Path) -> Result<()> {
    let mut git_entries = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        if entry.file_name() == ".git" {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            git_entries.push(entry.into_path());
        }
    }

    for path in git_entries {
        remove_if_exists(&path)?;
    }
    Ok(())
}

/// Total size in bytes and file count of a tree.
pub fn tree_stats(root: &Path) -> (u64, usize) {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .fold((0, 0), |(size, count), entry| {
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (size + len, count + 1)
        })
}
