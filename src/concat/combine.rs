//! The combiner: decoded reference list in, one response payload out.
//!
//! Each reference passes through the same gates in order (path safety,
//! existence, MIME type, stat, read) and the first failure ends the request.
//! Safety is checked for the whole list before any file is touched.

use super::css::{self, Preamble};
use super::mime::{self, Family};
use super::path::{check_reference, mtime_secs, reference_dir, resolve_reference};
use super::request;
use super::{ConcatError, ConcatResult};
use crate::config::ConcatConfig;
use crate::utils::date::http_date;
use std::fs;

/// A combined payload ready to be sent.
#[derive(Debug)]
pub struct CombinedResponse {
    pub content_type: String,
    /// Newest modification time across all files, in seconds since the epoch.
    pub last_modified: u64,
    pub body: Vec<u8>,
    pub file_count: usize,
}

impl CombinedResponse {
    pub fn last_modified_header(&self) -> String {
        http_date(self.last_modified)
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

/// Request-scoped combiner over one document root.
pub struct Combiner<'a> {
    settings: &'a ConcatConfig,
}

impl<'a> Combiner<'a> {
    pub fn new(settings: &'a ConcatConfig) -> Self {
        Self { settings }
    }

    /// Serve one request: decode the URI, then combine the listed files.
    pub fn handle(&self, method: &str, uri: &str) -> ConcatResult<CombinedResponse> {
        let refs = request::decode_request(method, uri, self.settings.max_files)?;
        self.combine(&refs)
    }

    /// Combine files in request order.
    pub fn combine(&self, refs: &[String]) -> ConcatResult<CombinedResponse> {
        if refs.is_empty() || refs.len() > self.settings.max_files {
            return Err(ConcatError::protocol(format!(
                "{} files requested, limit is {}",
                refs.len(),
                self.settings.max_files
            )));
        }
        for raw in refs {
            check_reference(raw)?;
        }

        let mut preamble = Preamble::default();
        let mut output = Vec::new();
        let mut last_modified = 0;
        let mut request_mime: Option<&str> = None;
        let mut last_mime = "";

        for raw in refs {
            let path = resolve_reference(&self.settings.root, raw)?;
            if !path.exists() {
                return Err(ConcatError::NotFound(path));
            }

            let mime = mime::lookup(&self.settings.types, &path)
                .ok_or_else(|| ConcatError::UnknownType(raw.clone()))?;
            if self.settings.unique_mime {
                let expected = *request_mime.get_or_insert(mime);
                if expected != mime {
                    return Err(ConcatError::MimeMismatch {
                        reference: raw.clone(),
                        expected: expected.to_string(),
                        found: mime.to_string(),
                    });
                }
            }
            last_mime = mime;

            let mtime = fs::metadata(&path)
                .and_then(|meta| mtime_secs(&meta))
                .map_err(|e| ConcatError::Io(path.clone(), e))?;
            last_modified = last_modified.max(mtime);

            let buf = fs::read(&path).map_err(|e| ConcatError::Io(path.clone(), e))?;

            match Family::of(mime) {
                Family::Css => {
                    let rest = css::transform(&buf, &reference_dir(raw), &mut preamble);
                    output.extend_from_slice(&self.finish_css(rest));
                }
                Family::Js => {
                    output.extend_from_slice(&self.finish_js(buf));
                    output.extend_from_slice(b";\n");
                }
                Family::Raw => output.extend_from_slice(&buf),
            }
        }

        let mut body = preamble.render();
        body.extend_from_slice(&output);

        Ok(CombinedResponse {
            content_type: request_mime.unwrap_or(last_mime).to_string(),
            last_modified,
            body,
            file_count: refs.len(),
        })
    }

    /// Minify a stylesheet body that is valid UTF-8; anything else is
    /// passed through byte for byte.
    fn finish_css(&self, rest: Vec<u8>) -> Vec<u8> {
        if !self.settings.minify_css {
            return rest;
        }
        let minified = std::str::from_utf8(&rest)
            .ok()
            .and_then(super::minify::minify_css);
        match minified {
            Some(code) => code.into_bytes(),
            None => rest,
        }
    }

    fn finish_js(&self, buf: Vec<u8>) -> Vec<u8> {
        if !self.settings.minify_js {
            return buf;
        }
        let minified = std::str::from_utf8(&buf)
            .ok()
            .and_then(super::minify::minify_js);
        match minified {
            Some(code) => code.trim_end().trim_end_matches(';').as_bytes().to_vec(),
            None => buf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concat::encode::encode_args;
    use std::path::Path;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>, mtime: u64) {
        let path = root.join(rel.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(mtime))
            .unwrap();
    }

    fn settings(root: &Path) -> ConcatConfig {
        ConcatConfig {
            root: root.to_path_buf(),
            ..ConcatConfig::default()
        }
    }

    fn status(result: ConcatResult<CombinedResponse>) -> u16 {
        match result {
            Ok(_) => 200,
            Err(e) => e.status(),
        }
    }

    #[test]
    fn test_css_scenario_hoists_import() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/a.css", "body{color:red}", 50);
        write(dir.path(), "/b.css", "@import url(c.css); p{color:blue}", 80);
        let settings = settings(dir.path());

        let res = Combiner::new(&settings)
            .handle("GET", "/s/??/a.css,/b.css?m=100")
            .unwrap();

        assert_eq!(res.content_type, "text/css");
        assert_eq!(res.last_modified, 80);
        assert_eq!(res.last_modified_header(), "Thu, 01 Jan 1970 00:01:20 GMT");
        assert_eq!(
            String::from_utf8(res.body.clone()).unwrap(),
            "@import url(/c.css);\nbody{color:red}p{color:#00f}"
        );
        assert_eq!(res.content_length(), res.body.len());
    }

    #[test]
    fn test_charset_then_import_then_body() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "/theme/main.css",
            "@charset \"utf-8\";\nbody{color:red}\n@import url(other.css);",
            10,
        );
        let settings = ConcatConfig {
            minify_css: false,
            ..settings(dir.path())
        };

        let res = Combiner::new(&settings)
            .combine(&["/theme/main.css".to_string()])
            .unwrap();
        let body = String::from_utf8(res.body).unwrap();

        assert!(body.starts_with("@charset \"utf-8\";\n@import url(/theme/other.css);\n"));
        assert!(body.ends_with("body{color:red}\n"));
        assert_eq!(body.matches("@charset").count(), 1);
    }

    #[test]
    fn test_charset_leads_across_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/a.css", "@import url(reset.css);\na{b:c}", 10);
        write(dir.path(), "/theme/b.css", "@charset \"utf-8\";\np{margin:0}", 20);
        write(dir.path(), "/c.css", "@charset \"iso-8859-1\";\nq{d:e}", 30);
        let settings = ConcatConfig {
            minify_css: false,
            ..settings(dir.path())
        };

        let res = Combiner::new(&settings)
            .handle("GET", "/s/??/a.css,/theme/b.css,/c.css")
            .unwrap();
        assert_eq!(
            String::from_utf8(res.body).unwrap(),
            "@charset \"utf-8\";\n@import url(/reset.css);\n\na{b:c}\np{margin:0}\nq{d:e}"
        );
    }

    #[test]
    fn test_latin1_stylesheet_bytes_preserved() {
        let dir = TempDir::new().unwrap();
        let css: &[u8] = b"@charset \"iso-8859-1\";a:before{content:\"caf\xE9\"}";
        write(dir.path(), "/a.css", css, 10);

        for minify_css in [false, true] {
            let settings = ConcatConfig {
                minify_css,
                ..settings(dir.path())
            };
            let res = Combiner::new(&settings).handle("GET", "/s/??/a.css").unwrap();
            assert_eq!(
                res.body,
                b"@charset \"iso-8859-1\";\na:before{content:\"caf\xE9\"}".to_vec()
            );
        }
    }

    #[test]
    fn test_css_with_charset_parameter_is_still_rewritten() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/theme/a.css", "@import url(x.css);a{b:c}", 10);
        let mut settings = ConcatConfig {
            minify_css: false,
            ..settings(dir.path())
        };
        settings
            .types
            .insert("css".into(), "text/css; charset=utf-8".into());

        let res = Combiner::new(&settings).handle("GET", "/s/??/theme/a.css").unwrap();
        assert_eq!(res.content_type, "text/css; charset=utf-8");
        assert_eq!(res.body, b"@import url(/theme/x.css);\na{b:c}".to_vec());
    }

    #[test]
    fn test_url_rewrite_relative_to_file_dir() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "/theme/css/site.css",
            "a{background:url(images/foo.png)}b{background:url(http://cdn.example.com/x.png)}",
            10,
        );
        let settings = ConcatConfig {
            minify_css: false,
            ..settings(dir.path())
        };

        let res = Combiner::new(&settings)
            .combine(&["/theme/css/site.css".to_string()])
            .unwrap();
        let body = String::from_utf8(res.body).unwrap();
        assert!(body.contains("url(/theme/css/images/foo.png)"));
        assert!(body.contains("url(http://cdn.example.com/x.png)"));
    }

    #[test]
    fn test_js_gets_statement_guard() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/a.js", "var a = 1", 5);
        write(dir.path(), "/lib/b.js", "var b = 2", 9);
        let settings = settings(dir.path());

        let res = Combiner::new(&settings)
            .handle("HEAD", "/s/??/a.js,/lib/b.js")
            .unwrap();
        assert_eq!(res.content_type, "application/x-javascript");
        assert_eq!(res.last_modified, 9);
        assert_eq!(res.body, b"var a = 1;\nvar b = 2;\n");
        assert_eq!(res.file_count, 2);
    }

    #[test]
    fn test_traversal_rejected_before_file_access() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());
        let combiner = Combiner::new(&settings);

        // /missing.css would be a 404 if it were looked at first
        for uri in [
            "/s/??../../etc/passwd",
            "/s/??/missing.css,/a/../../etc/passwd",
            "/s/??/missing.css,%2E%2E/etc/passwd",
        ] {
            let err = combiner.handle("GET", uri).unwrap_err();
            assert!(matches!(err, ConcatError::PathSafety(_)), "{uri}: {err}");
            assert_eq!(err.status(), 400);
        }
    }

    #[test]
    fn test_status_codes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/a.css", "a{b:c}", 1);
        write(dir.path(), "/a.js", "x()", 1);
        write(dir.path(), "/readme.txt", "hi", 1);
        let settings = settings(dir.path());
        let combiner = Combiner::new(&settings);

        assert_eq!(status(combiner.handle("GET", "/s/??/a.css")), 200);
        assert_eq!(status(combiner.handle("POST", "/s/??/a.css")), 400);
        assert_eq!(status(combiner.handle("GET", "/s/")), 400);
        assert_eq!(status(combiner.handle("GET", "/s/??")), 400);
        assert_eq!(status(combiner.handle("GET", "/s/??/a.css,")), 400);
        assert_eq!(status(combiner.handle("GET", "/s/??/nope.css")), 404);
        assert_eq!(status(combiner.handle("GET", "/s/??/readme.txt")), 400);
        assert_eq!(status(combiner.handle("GET", "/s/??/a.css,/a.js")), 400);
    }

    #[test]
    fn test_mixed_types_allowed_when_not_unique() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/a.css", "a{b:c}", 1);
        write(dir.path(), "/a.js", "x()", 2);
        let settings = ConcatConfig {
            unique_mime: false,
            minify_css: false,
            ..settings(dir.path())
        };

        let res = Combiner::new(&settings)
            .handle("GET", "/s/??/a.css,/a.js")
            .unwrap();
        assert_eq!(res.content_type, "application/x-javascript");
        assert_eq!(res.body, b"a{b:c}x();\n");
    }

    #[test]
    fn test_max_files_boundary() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "/a.js", "x()", 1);
        let settings = ConcatConfig {
            max_files: 3,
            ..settings(dir.path())
        };
        let combiner = Combiner::new(&settings);

        assert_eq!(status(combiner.handle("GET", "/s/??/a.js,/a.js,/a.js")), 200);
        assert_eq!(
            status(combiner.handle("GET", "/s/??/a.js,/a.js,/a.js,/a.js")),
            400
        );
    }

    #[test]
    fn test_directory_reference_is_server_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("styles.css")).unwrap();
        let settings = settings(dir.path());

        let err = Combiner::new(&settings)
            .handle("GET", "/s/??/styles.css")
            .unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_compressed_request_matches_plain() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..12 {
            let rel = format!("/wp-content/themes/twentyten/css/part-{i}.css");
            write(dir.path(), &rel, &format!(".c{i}{{margin:0}}"), 100 + i);
            paths.push(rel);
        }
        let settings = settings(dir.path());
        let combiner = Combiner::new(&settings);

        let plain = format!("{}?m=111", paths.join(","));
        let packed = encode_args(&plain, true);
        assert!(packed.starts_with('-'));

        let a = combiner.handle("GET", &format!("/s/??{plain}")).unwrap();
        let b = combiner.handle("GET", &format!("/s/??{packed}")).unwrap();
        assert_eq!(a.body, b.body);
        assert_eq!(a.last_modified, b.last_modified);
    }

    #[test]
    fn test_now_mtime_round_trips_through_header() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "a{b:c}").unwrap();
        let settings = settings(dir.path());

        let res = Combiner::new(&settings).handle("GET", "/s/??/a.css").unwrap();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        assert!(res.last_modified <= now);
        assert!(res.last_modified_header().ends_with(" GMT"));
    }
}
