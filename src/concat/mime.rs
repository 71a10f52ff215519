//! Extension to MIME type lookup for combinable files.

use rustc_hash::FxHashMap;
use std::path::Path;

pub const CSS: &str = "text/css";
pub const JAVASCRIPT: &str = "application/x-javascript";

/// Extension → MIME table.
pub type MimeTable = FxHashMap<String, String>;

/// The two families the combiner knows how to transform.
pub fn default_types() -> MimeTable {
    let mut types = MimeTable::default();
    types.insert("css".into(), CSS.into());
    types.insert("js".into(), JAVASCRIPT.into());
    types
}

/// How a file's content is folded into the combined body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Css,
    Js,
    /// Appended verbatim.
    Raw,
}

impl Family {
    /// Family of a MIME type, ignoring parameters such as `; charset=...`.
    pub fn of(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case(CSS) {
            Self::Css
        } else if essence.eq_ignore_ascii_case(JAVASCRIPT)
            || essence.eq_ignore_ascii_case("application/javascript")
            || essence.eq_ignore_ascii_case("text/javascript")
        {
            Self::Js
        } else {
            Self::Raw
        }
    }
}

/// Look up the MIME type of a file by its (case-sensitive) extension.
pub fn lookup<'a>(types: &'a MimeTable, path: &Path) -> Option<&'a str> {
    let ext = path.extension()?.to_str()?;
    types.get(ext).map(String::as_str)
}
