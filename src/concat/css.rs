//! CSS rewriting for combined stylesheets.
//!
//! Files are served from a different URL than their own, so relative
//! references are made absolute against the file's directory. `@charset`
//! and `@import` must precede every other rule, so they are lifted out of
//! each file into a [`Preamble`] emitted ahead of the combined body.
//!
//! Stylesheets may be saved in any ASCII-compatible charset, so every pass
//! works on bytes and leaves bytes outside the matched syntax untouched.
//!
//! Patterns matched (ASCII case-insensitive):
//!
//! | Rule                                   | Pattern                                             |
//! |----------------------------------------|-----------------------------------------------------|
//! | `url(x)`, `url('x')`, `url( "x" )`     | `url\s*\(` quoted or bare target `\)`               |
//! | `Microsoft.AlphaImageLoader(src='x')`  | filter call with a `src=` argument                  |
//! | `@charset "x";`                        | `@charset` + quoted name + `;`                      |
//! | `@import url(x) media;`, `@import "x";`| `@import` + optional `url(` + target + tail to `;`  |

use regex::bytes::{Captures, Regex};
use std::sync::LazyLock;

const BOM: &[u8] = b"\xEF\xBB\xBF";

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)(url\s*\()\s*['"]?\s*([^'"\s)][^'")]*?)\s*['"]?\s*\)"#).unwrap()
});

static ALPHA_LOADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)(Microsoft\.AlphaImageLoader\s*\([^)]*?src\s*=\s*['"]?)([^)]*)\)"#).unwrap()
});

static CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i-u)@charset\s+['"][^'"]+['"]\s*;"#).unwrap());

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)(@import\s+(?:url\s*\(\s*)?['"]?)([^'"\s)]+)(['"]?\s*\)?[^;]*;)"#).unwrap()
});

/// Rules hoisted ahead of the combined stylesheet body.
///
/// At most one `@charset` (the first seen wins), followed by every `@import`
/// in discovery order.
#[derive(Debug, Default)]
pub struct Preamble {
    charset: Option<Vec<u8>>,
    imports: Vec<Vec<u8>>,
}

impl Preamble {
    fn offer_charset(&mut self, rule: &[u8]) {
        if self.charset.is_none() {
            self.charset = Some(rule.to_vec());
        }
    }

    /// Rendered preamble: one rule per line.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for rule in self.charset.iter().chain(&self.imports) {
            out.extend_from_slice(rule);
            out.push(b'\n');
        }
        out
    }
}

/// Apply every rewrite to one file whose directory (rooted at `/`) is `dir`.
///
/// Returns what remains of the file; hoisted rules land in `preamble`.
pub fn transform(css: &[u8], dir: &str, preamble: &mut Preamble) -> Vec<u8> {
    let css = css.strip_prefix(BOM).unwrap_or(css);
    let css = rewrite_urls(css, dir);
    let css = rewrite_alpha_loader(&css, dir);
    let css = hoist_charset(&css, preamble);
    hoist_imports(&css, dir, preamble)
}

/// `url(relative/file)` → `url(<dir>/relative/file)`.
///
/// `data:`, `http:`, `https:` and rooted targets are left as written.
pub fn rewrite_urls(css: &[u8], dir: &str) -> Vec<u8> {
    URL_RE
        .replace_all(css, |caps: &Captures| {
            let target = &caps[2];
            if is_relative(target) {
                [&caps[1], &absolutize(dir, target)[..], &b")"[..]].concat()
            } else {
                caps[0].to_vec()
            }
        })
        .into_owned()
}

/// Legacy IE filter: `AlphaImageLoader(src='relative')` → absolute `src`.
pub fn rewrite_alpha_loader(css: &[u8], dir: &str) -> Vec<u8> {
    ALPHA_LOADER_RE
        .replace_all(css, |caps: &Captures| {
            let target = &caps[2];
            let skip = target.is_empty()
                || matches!(target[0], b'/' | b'\'' | b'"')
                || target[0].is_ascii_whitespace()
                || has_prefix_ci(target, b"http:")
                || has_prefix_ci(target, b"https:");
            if skip {
                caps[0].to_vec()
            } else {
                [&caps[1], &absolutize(dir, target)[..], &b")"[..]].concat()
            }
        })
        .into_owned()
}

/// Lift a leading `@charset` into the preamble and strip every `@charset`.
pub fn hoist_charset(css: &[u8], preamble: &mut Preamble) -> Vec<u8> {
    if has_prefix_ci(css, b"@charset")
        && let Some(rule) = CHARSET_RE.find(css)
    {
        preamble.offer_charset(rule.as_bytes());
    }
    CHARSET_RE.replace_all(css, &b""[..]).into_owned()
}

/// Move every `@import` into the preamble, absolutizing relative targets.
pub fn hoist_imports(css: &[u8], dir: &str, preamble: &mut Preamble) -> Vec<u8> {
    IMPORT_RE
        .replace_all(css, |caps: &Captures| {
            let target = &caps[2];
            let rule = if has_prefix_ci(target, b"http") || target.starts_with(b"/") {
                caps[0].to_vec()
            } else {
                [&caps[1], &absolutize(dir, target)[..], &caps[3]].concat()
            };
            preamble.imports.push(rule);
            Vec::new()
        })
        .into_owned()
}

fn is_relative(target: &[u8]) -> bool {
    !target.starts_with(b"/")
        && !has_prefix_ci(target, b"data:")
        && !has_prefix_ci(target, b"http:")
        && !has_prefix_ci(target, b"https:")
}

fn absolutize(dir: &str, target: &[u8]) -> Vec<u8> {
    let dir = if dir == "/" { "" } else { dir };
    [dir.as_bytes(), b"/", target].concat()
}

fn has_prefix_ci(s: &[u8], prefix: &[u8]) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    fn urls(css: &str, dir: &str) -> String {
        text(rewrite_urls(css.as_bytes(), dir))
    }

    #[test]
    fn test_relative_url_made_absolute() {
        assert_eq!(
            urls("a{background:url(images/foo.png)}", "/theme/css"),
            "a{background:url(/theme/css/images/foo.png)}"
        );
        assert_eq!(
            urls("a{background:url(foo.png)}", "/"),
            "a{background:url(/foo.png)}"
        );
    }

    #[test]
    fn test_quotes_are_dropped_on_rewrite() {
        assert_eq!(
            urls(r#"a{background:url( "img/a b.png" )}"#, "/t"),
            "a{background:url(/t/img/a b.png)}"
        );
        assert_eq!(
            urls("a{background:URL('img/x.gif')}", "/t"),
            "a{background:URL(/t/img/x.gif)}"
        );
    }

    #[test]
    fn test_absolute_and_remote_urls_untouched() {
        for css in [
            "a{background:url(http://cdn.example.com/x.png)}",
            "a{background:url('https://cdn.example.com/x.png')}",
            "a{background:url(data:image/png;base64,AAA=)}",
            "a{background:url(/already/rooted.png)}",
            "a{background:url(//cdn.example.com/x.png)}",
        ] {
            assert_eq!(urls(css, "/theme/css"), css);
        }
    }

    #[test]
    fn test_alpha_loader_rewrite() {
        let css = "a{filter:progid:DXImageTransform.Microsoft.AlphaImageLoader(src='img/bg.png', sizingMethod='scale')}";
        assert_eq!(
            text(rewrite_alpha_loader(css.as_bytes(), "/theme")),
            "a{filter:progid:DXImageTransform.Microsoft.AlphaImageLoader(src='/theme/img/bg.png', sizingMethod='scale')}"
        );

        let remote = "a{filter:progid:DXImageTransform.Microsoft.AlphaImageLoader(src='http://x.com/bg.png')}";
        assert_eq!(text(rewrite_alpha_loader(remote.as_bytes(), "/theme")), remote);
    }

    #[test]
    fn test_charset_first_wins() {
        let mut preamble = Preamble::default();
        let a = hoist_charset(b"@charset \"utf-8\";body{color:red}", &mut preamble);
        let b = hoist_charset(b"@charset \"iso-8859-1\";p{margin:0}", &mut preamble);
        assert_eq!(text(a), "body{color:red}");
        assert_eq!(text(b), "p{margin:0}");
        assert_eq!(text(preamble.render()), "@charset \"utf-8\";\n");
    }

    #[test]
    fn test_charset_not_leading_is_stripped_not_hoisted() {
        let mut preamble = Preamble::default();
        let out = hoist_charset(b"p{margin:0}@charset \"utf-8\";", &mut preamble);
        assert_eq!(text(out), "p{margin:0}");
        assert!(preamble.render().is_empty());
    }

    #[test]
    fn test_imports_hoisted_in_order() {
        let mut preamble = Preamble::default();
        let css = "@import url(reset.css);\n@import \"print.css\" print;\nbody{color:red}\n@import url(http://fonts.example.com/f.css);";
        let out = hoist_imports(css.as_bytes(), "/theme", &mut preamble);

        assert_eq!(text(out).trim(), "body{color:red}");
        assert_eq!(
            text(preamble.render()),
            "@import url(/theme/reset.css);\n@import \"/theme/print.css\" print;\n@import url(http://fonts.example.com/f.css);\n"
        );
    }

    #[test]
    fn test_transform_orders_charset_before_imports() {
        let mut preamble = Preamble::default();
        let css = "@charset \"utf-8\";\nbody{color:red}\n@import url(other.css);";
        let rest = transform(css.as_bytes(), "/", &mut preamble);

        assert_eq!(text(rest).trim(), "body{color:red}");
        assert_eq!(
            text(preamble.render()),
            "@charset \"utf-8\";\n@import url(/other.css);\n"
        );
    }

    #[test]
    fn test_transform_strips_bom() {
        let mut preamble = Preamble::default();
        let rest = transform("\u{feff}@charset \"utf-8\";a{b:c}".as_bytes(), "/", &mut preamble);
        assert_eq!(text(rest), "a{b:c}");
        assert_eq!(text(preamble.render()), "@charset \"utf-8\";\n");
    }

    #[test]
    fn test_latin1_bytes_pass_through() {
        let mut preamble = Preamble::default();
        let css = b"@charset \"iso-8859-1\";a:before{content:\"caf\xE9\"}b{background:url(\xE9t\xE9.png)}";
        let rest = transform(css, "/img", &mut preamble);

        assert_eq!(
            rest,
            b"a:before{content:\"caf\xE9\"}b{background:url(/img/\xE9t\xE9.png)}".to_vec()
        );
        assert_eq!(preamble.render(), b"@charset \"iso-8859-1\";\n".to_vec());
    }
}
