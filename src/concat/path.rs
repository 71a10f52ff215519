//! Reference → filesystem path resolution.
//!
//! Resolution is a pure textual join under the document root. Canonical
//! paths were produced when the reference was generated, so no symlink
//! resolution happens here; the joined path is still confined to the root.

use super::{ConcatError, ConcatResult};
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Reject empty references and ones carrying `..` or NUL.
pub fn check_reference(raw: &str) -> ConcatResult<()> {
    if raw.is_empty() {
        return Err(ConcatError::protocol("empty file reference"));
    }
    if raw.contains("..") || raw.contains('\0') {
        return Err(ConcatError::PathSafety(raw.escape_default().to_string()));
    }
    Ok(())
}

/// Join a reference onto the document root.
pub fn resolve_reference(root: &Path, raw: &str) -> ConcatResult<PathBuf> {
    check_reference(raw)?;

    let relative = raw.trim_start_matches('/');
    let confined = Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !confined || relative.is_empty() {
        return Err(ConcatError::PathSafety(raw.to_string()));
    }

    Ok(root.join(relative))
}

/// Directory of a reference, rooted at `/`.
///
/// `/theme/css/a.css` → `/theme/css`, `/a.css` → `/`, `a.css` → `/`.
pub fn reference_dir(raw: &str) -> String {
    let rooted = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    };
    match rooted.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((dir, _)) => dir.to_string(),
    }
}

/// Modification time in whole seconds since the epoch.
pub fn mtime_secs(meta: &Metadata) -> std::io::Result<u64> {
    let modified = meta.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}
