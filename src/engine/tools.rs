//! Path utilities

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Path of `path` as seen from `base`, climbing out with `..` when it lies elsewhere.
/// Both should be absolute and normalized. `None` when they share no leading component
/// (different drives on Windows).
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if let Ok(rest) = path.strip_prefix(base) {
        return Some(rest.to_path_buf());
    }
    let mut path_parts = path.components().peekable();
    let mut base_parts = base.components().peekable();
    if path_parts.peek() != base_parts.peek() {
        return None;
    }
    while let (Some(p), Some(b)) = (path_parts.peek(), base_parts.peek()) {
        if p != b {
            break;
        }
        path_parts.next();
        base_parts.next();
    }
    let mut rel = PathBuf::new();
    for part in base_parts {
        if part != Component::CurDir {
            rel.push("..");
        }
    }
    for part in path_parts {
        rel.push(part.as_os_str());
    }
    Some(rel)
}

/// Path as shown to the consumer: forward slashes on every platform.
pub fn path_to_display_string(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Remove `.` and resolve `..` without touching the filesystem. `..` never climbs above
/// the filesystem root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Absolute path for one output line: relative lines are joined onto `root`.
pub fn resolve_line(root: &Path, line: &str) -> PathBuf {
    let p = Path::new(line);
    if p.is_absolute() {
        normalize_lexically(p)
    } else {
        normalize_lexically(&root.join(p))
    }
}

/// Expand a leading `~` using `HOME` (or `USERPROFILE`).
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => PathBuf::from(home),
        (Some(rest), Some(home)) if rest.starts_with('/') || rest.starts_with('\\') => {
            PathBuf::from(home).join(&rest[1..])
        }
        _ => PathBuf::from(path),
    }
}

/// Working directory for a search: empty → current directory, `~` expanded, made
/// absolute and lexically normalized. Existence is not checked.
pub fn resolve_root(path: &str) -> Result<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return std::env::current_dir().context("read current directory");
    }
    let expanded = expand_tilde(path);
    let absolute = std::path::absolute(&expanded)
        .with_context(|| format!("make {} absolute", expanded.display()))?;
    Ok(normalize_lexically(&absolute))
}
