//! `[concat]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [concat]
//! root = "public"          # document root, relative to masher.toml
//! slug = "s"               # URL segment: /s/??a.css,b.css
//! max_files = 150          # files per request
//! unique_mime = true       # one MIME type per request
//! compress = true          # use the `-` compressed form when shorter
//! minify_css = true
//! minify_js = false
//! rtl = false              # text direction when planning stylesheets
//!
//! [concat.types]           # replaces the whole table when given
//! css = "text/css"
//! js = "application/x-javascript"
//! ```

use crate::concat::mime::{MimeTable, default_types};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatConfig {
    /// Document root all references resolve under.
    pub root: PathBuf,

    /// URL path segment the endpoint answers on.
    pub slug: String,

    /// Maximum references per request.
    pub max_files: usize,

    /// The first file's MIME type fixes the type for the whole request.
    pub unique_mime: bool,

    /// Allow the compressed argument form in generated URLs.
    pub compress: bool,

    pub minify_css: bool,

    pub minify_js: bool,

    /// Right-to-left page: stylesheets flagged `rtl` are served alone.
    pub rtl: bool,

    /// Extension → MIME type of files that may be combined.
    pub types: MimeTable,
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            slug: "s".into(),
            max_files: 150,
            unique_mime: true,
            compress: true,
            minify_css: true,
            minify_js: false,
            rtl: false,
            types: default_types(),
        }
    }
}
