//! Per-path classification: metadata lookup that skips instead of failing.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::tools::{path_relative_to, path_to_display_string};
use crate::{EntryKind, ResolvedEntry};

/// Result of classifying one path. `Skip` covers vanished entries, permission errors,
/// dangling links, and types other than file/directory/symlink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    Entry(ResolvedEntry),
    Skip,
}

/// Directory wins over symlink, symlink over file. Anything else is not listed.
pub fn entry_kind(is_dir: bool, is_link: bool, is_file: bool) -> Option<EntryKind> {
    if is_dir {
        Some(EntryKind::Directory)
    } else if is_link {
        Some(EntryKind::Symlink)
    } else if is_file {
        Some(EntryKind::File)
    } else {
        None
    }
}

/// Milliseconds since the Unix epoch; negative for times before 1970.
pub fn mtime_ms(modified: SystemTime) -> Option<i64> {
    match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).ok(),
        Err(before) => i64::try_from(before.duration().as_millis())
            .ok()
            .map(|ms| -ms),
    }
}

/// Display word for `abs_path` as seen from `root` (`../x` outside it), `/`-suffixed for
/// directories. The root itself displays as `.`. Absolute only when no relative form exists.
pub fn display_word(abs_path: &Path, root: &Path, kind: EntryKind) -> String {
    let mut word = match path_relative_to(abs_path, root) {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => path_to_display_string(&rel),
        None => path_to_display_string(abs_path),
    };
    if kind == EntryKind::Directory {
        word.push('/');
    }
    word
}

/// Read metadata for `abs_path` (following links) and build its entry.
pub fn classify(abs_path: &Path, root: &Path) -> Classified {
    let Ok(meta) = fs::metadata(abs_path) else {
        return Classified::Skip;
    };
    let is_link = fs::symlink_metadata(abs_path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    let Some(kind) = entry_kind(meta.is_dir(), is_link, meta.is_file()) else {
        return Classified::Skip;
    };
    Classified::Entry(ResolvedEntry {
        word: display_word(abs_path, root, kind),
        path: abs_path.to_path_buf(),
        kind,
        is_link,
        size: meta.len(),
        mtime_ms: meta.modified().ok().and_then(mtime_ms),
    })
}
