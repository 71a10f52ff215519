//! Outbound URL building: combined URLs and cache-busted single-file URLs.
//!
//! A combinable group of more than one file becomes
//! `<site>/<slug>/??<args>` where `<args>` is the comma-joined path list
//! plus `?m=<newest mtime>`, or its compressed form when that is shorter.
//! A single file keeps its own URL with `?m=<mtime>` appended.

use super::path::{mtime_secs, resolve_reference};
use super::{ConcatError, ConcatResult};
use crate::config::{ConcatConfig, MasherConfig};
use crate::debug;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::fs;
use std::io::Write;

/// Builds URLs for combinable groups.
pub struct ReferenceEncoder<'a> {
    base: &'a str,
    concat: &'a ConcatConfig,
}

impl<'a> ReferenceEncoder<'a> {
    pub fn new(site_url: &'a str, concat: &'a ConcatConfig) -> Self {
        Self {
            base: site_url.trim_end_matches('/'),
            concat,
        }
    }

    pub fn from_config(config: &'a MasherConfig) -> Self {
        Self::new(&config.site.url, &config.concat)
    }

    /// URLs for one group, in order.
    ///
    /// One file yields its cache-busted URL. Several files yield a single
    /// combined URL, or per-file URLs when any file cannot be stat'ed.
    pub fn group_urls(&self, paths: &[String]) -> Vec<String> {
        match paths {
            [] => Vec::new(),
            [single] => vec![self.cache_bust(&self.local_url(single))],
            _ => match self.combined_url(paths) {
                Ok(url) => vec![url],
                Err(e) => {
                    debug!("concat"; "serving {} files separately: {}", paths.len(), e);
                    paths
                        .iter()
                        .map(|path| self.cache_bust(&self.local_url(path)))
                        .collect()
                }
            },
        }
    }

    /// Combined URL for a list of root-relative paths.
    pub fn combined_url(&self, paths: &[String]) -> ConcatResult<String> {
        let mut newest = 0;
        for path in paths {
            if path.contains([',', '?']) {
                return Err(ConcatError::protocol(format!(
                    "`{path}` cannot be listed in a combined URL"
                )));
            }
            let file = resolve_reference(&self.concat.root, path)?;
            let mtime = fs::metadata(&file)
                .and_then(|meta| mtime_secs(&meta))
                .map_err(|e| ConcatError::Io(file.clone(), e))?;
            newest = newest.max(mtime);
        }

        let plain = format!("{}?m={newest}", paths.join(","));
        let args = encode_args(&plain, self.concat.compress);
        Ok(format!("{}/{}/??{}", self.base, self.concat.slug, args))
    }

    /// Append `?m=<mtime>` to a local URL.
    ///
    /// An existing query is kept after the token, joined with `&amp;`.
    /// URLs that already carry a token, point elsewhere, or name a file
    /// that cannot be stat'ed come back unchanged.
    pub fn cache_bust(&self, url: &str) -> String {
        if url.contains("?m=") {
            return url.to_string();
        }

        let mtime = self
            .local_path(url)
            .and_then(|path| resolve_reference(&self.concat.root, &path).ok())
            .and_then(|file| fs::metadata(file).ok())
            .and_then(|meta| mtime_secs(&meta).ok())
            .filter(|&mtime| mtime > 0);
        let Some(mtime) = mtime else {
            return url.to_string();
        };

        match url.split_once('?') {
            None => format!("{url}?m={mtime}"),
            Some((base, "")) => format!("{base}?m={mtime}"),
            Some((base, query)) => format!("{base}?m={mtime}&amp;{query}"),
        }
    }

    fn local_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }

    /// Root-relative path of a URL on this site.
    fn local_path(&self, url: &str) -> Option<String> {
        let rest = if !self.base.is_empty() && url.starts_with(self.base) {
            &url[self.base.len()..]
        } else {
            url
        };
        if !rest.starts_with('/') || rest.starts_with("//") {
            return None;
        }

        let path = rest.split(['?', '#']).next()?;
        percent_decode_str(path)
            .decode_utf8()
            .ok()
            .map(std::borrow::Cow::into_owned)
    }
}

/// Bytes escaped in the plain argument form. `,` and `?` stay literal as
/// list and version separators; paths containing them never get here.
const ARG_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// Pick the shorter argument form.
///
/// The plain form is percent-escaped, the compressed form is
/// `-` + base64(raw-deflate(plain)) of the unescaped text. Compression is
/// used only when strictly shorter than the escaped plain form, prefix
/// included.
pub fn encode_args(plain: &str, compress: bool) -> String {
    let escaped = utf8_percent_encode(plain, ARG_ESCAPE).to_string();
    if compress
        && let Some(packed) = deflate_base64(plain)
        && packed.len() + 1 < escaped.len()
    {
        return format!("-{packed}");
    }
    escaped
}

fn deflate_base64(plain: &str) -> Option<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(plain.as_bytes()).ok()?;
    let packed = encoder.finish().ok()?;
    Some(STANDARD.encode(packed))
}
