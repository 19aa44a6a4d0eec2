//! Path Relativization
//!
//! Arguments handed to git are rewritten so that anything naming a location
//! under the repository root becomes root-relative. Git runs with the root as
//! its working directory, so relative arguments resolve the same way for us
//! and for the child process.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Rewrites `arg` relative to `root` when it resolves inside it.
///
/// The directory part of `arg` is resolved (symlinks included) against
/// `root`, the final component is re-attached, and the `root/` prefix is
/// stripped. Anything resolving outside `root` comes back absolute.
/// Arguments that are not paths (revisions, flags) pass through unchanged
/// because they resolve to `root/<arg>`.
///
/// `root` must already be canonical.
///
/// # Examples
///
/// ```
/// use pool::git::paths::relativize;
/// use std::path::Path;
///
/// let root = Path::new("/");
/// assert_eq!(relativize(root, "HEAD"), "HEAD");
/// ```
#[must_use]
pub fn relativize(root: &Path, arg: &str) -> String {
    let (dir, base) = split_dir_base(arg);

    let dir_path = if dir.is_empty() {
        root.to_path_buf()
    } else if Path::new(dir).is_absolute() {
        PathBuf::from(dir)
    } else {
        root.join(dir)
    };

    let resolved = resolve(&dir_path);
    let resolved = resolved.to_string_lossy();

    let candidate = if resolved.ends_with('/') {
        format!("{resolved}{base}")
    } else {
        format!("{resolved}/{base}")
    };

    let prefix = format!("{}/", root.to_string_lossy().trim_end_matches('/'));
    match candidate.strip_prefix(&prefix) {
        Some(relative) => relative.to_string(),
        None => candidate,
    }
}

/// Applies [`relativize`] to every argument, preserving order.
#[must_use]
pub fn relativize_all(root: &Path, args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| relativize(root, arg)).collect()
}

/// Splits at the last `/` into a directory part and a final component.
fn split_dir_base(arg: &str) -> (&str, &str) {
    match arg.rfind('/') {
        Some(idx) => {
            let dir = arg[..idx].trim_end_matches('/');
            // "/x" and "//x" keep the root as their directory
            let dir = if dir.is_empty() { &arg[..=idx] } else { dir };
            (dir, &arg[idx + 1..])
        }
        None => ("", arg),
    }
}

/// Canonicalizes the longest existing ancestor of `path` and re-attaches the
/// rest, normalizing `.` and `..` lexically.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(real) = fs::canonicalize(path) {
        return real;
    }

    let normalized = normalize(path);
    let mut tail = Vec::new();
    let mut existing = normalized.as_path();

    while let Some(parent) = existing.parent() {
        if let Some(name) = existing.file_name() {
            tail.push(name.to_owned());
        }
        existing = parent;

        if let Ok(real) = fs::canonicalize(existing) {
            return tail.iter().rev().fold(real, |acc, name| acc.join(name));
        }
    }

    normalized
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}
