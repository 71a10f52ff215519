//! Reference list decoding for incoming requests.
//!
//! ```text
//! /s/??/foo/bar.css,/foo1/bar/baz.css?m=293847
//! /s/??-<base64 of the deflated form above>
//! ```
//!
//! Everything after `??` is the argument string. A leading `-` marks the
//! compressed form: base64 of the raw-deflated plain form. A further `?`
//! starts the version token, which only exists to bust caches and is dropped.

use super::{ConcatError, ConcatResult};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use percent_encoding::percent_decode_str;
use std::io::Read;

/// Standard alphabet, tolerant of stripped `=` padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Upper bound for an inflated argument string.
const MAX_INFLATED_LEN: u64 = 64 * 1024;

/// Only GET and HEAD are served.
pub fn check_method(method: &str) -> ConcatResult<()> {
    match method {
        "GET" | "HEAD" => Ok(()),
        other => Err(ConcatError::protocol(format!("method {other} not allowed"))),
    }
}

/// Take the argument string: the part after the second `?` of the URI.
pub fn extract_args(uri: &str) -> ConcatResult<String> {
    let query = uri
        .split_once('?')
        .map(|(_, query)| query)
        .ok_or_else(|| ConcatError::protocol("missing query string"))?;
    let query = query.split('#').next().unwrap_or(query);

    let (_, args) = query
        .split_once('?')
        .ok_or_else(|| ConcatError::protocol("missing `??` marker"))?;

    percent_decode_str(args)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| ConcatError::protocol("argument string is not valid UTF-8"))
}

/// Decode an argument string into the ordered reference list.
pub fn decode_args(args: &str, max_files: usize) -> ConcatResult<Vec<String>> {
    let plain = match args.strip_prefix('-') {
        Some(packed) => inflate_args(packed)?,
        None => args.to_string(),
    };

    // Drop the version token
    let list = plain.split('?').next().unwrap_or_default();
    if list.is_empty() {
        return Err(ConcatError::protocol("empty file list"));
    }

    let refs: Vec<String> = list.split(',').map(str::to_string).collect();
    if refs.len() > max_files {
        return Err(ConcatError::protocol(format!(
            "{} files requested, limit is {max_files}",
            refs.len()
        )));
    }
    Ok(refs)
}

/// Full inbound decoding: method gate, argument extraction, list decoding.
pub fn decode_request(method: &str, uri: &str, max_files: usize) -> ConcatResult<Vec<String>> {
    check_method(method)?;
    let args = extract_args(uri)?;
    decode_args(&args, max_files)
}

/// base64 → inflate. Raw deflate first, zlib-wrapped payloads as fallback.
fn inflate_args(packed: &str) -> ConcatResult<String> {
    let bytes = LENIENT_BASE64
        .decode(packed.trim())
        .map_err(|e| ConcatError::protocol(format!("invalid base64 payload: {e}")))?;

    let inflated = read_bounded(DeflateDecoder::new(bytes.as_slice()))
        .or_else(|_| read_bounded(ZlibDecoder::new(bytes.as_slice())))
        .map_err(|e| ConcatError::protocol(format!("cannot decompress payload: {e}")))?;

    String::from_utf8(inflated)
        .map_err(|_| ConcatError::protocol("decompressed payload is not valid UTF-8"))
}

fn read_bounded(reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.take(MAX_INFLATED_LEN + 1).read_to_end(&mut out)?;
    if out.len() as u64 > MAX_INFLATED_LEN {
        return Err(std::io::Error::other("payload exceeds size limit"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    #[test]
    fn test_check_method() {
        assert!(check_method("GET").is_ok());
        assert!(check_method("HEAD").is_ok());
        assert!(check_method("POST").is_err());
        assert!(check_method("get").is_err());
    }

    #[test]
    fn test_extract_args() {
        assert_eq!(extract_args("/s/??/a.css,/b.css").unwrap(), "/a.css,/b.css");
        assert_eq!(
            extract_args("/s/??/a.css,/b.css?m=100").unwrap(),
            "/a.css,/b.css?m=100"
        );
        assert_eq!(extract_args("/s/??/a%20b.css").unwrap(), "/a b.css");
        assert!(extract_args("/s/").is_err());
        assert!(extract_args("/s/?a.css").is_err());
    }

    #[test]
    fn test_decode_plain_drops_version() {
        let refs = decode_args("/a.css,/b.css?m=100", 150).unwrap();
        assert_eq!(refs, vec!["/a.css", "/b.css"]);
    }

    #[test]
    fn test_decode_empty_list() {
        assert!(decode_args("", 150).is_err());
        assert!(decode_args("?m=1", 150).is_err());
    }

    #[test]
    fn test_max_files_boundary() {
        let at_limit = vec!["/a.css"; 3].join(",");
        assert_eq!(decode_args(&at_limit, 3).unwrap().len(), 3);

        let over = vec!["/a.css"; 4].join(",");
        let err = decode_args(&over, 3).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_decode_zlib_payload() {
        // Older URLs carry zlib framing
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"/a.css,/b.css?m=7").unwrap();
        let packed = base64::engine::general_purpose::STANDARD.encode(encoder.finish().unwrap());

        let refs = decode_args(&format!("-{packed}"), 150).unwrap();
        assert_eq!(refs, vec!["/a.css", "/b.css"]);
    }

    #[test]
    fn test_decode_garbage_payload_is_rejected() {
        let err = decode_args("-bm90IGRlZmxhdGVk", 150).unwrap_err();
        assert!(matches!(err, ConcatError::Protocol(_)));

        let err = decode_args("-***", 150).unwrap_err();
        assert!(matches!(err, ConcatError::Protocol(_)));
    }

    #[test]
    fn test_decode_request_gates() {
        assert!(decode_request("POST", "/s/??/a.css", 150).is_err());
        assert_eq!(
            decode_request("HEAD", "/s/??/a.css", 150).unwrap(),
            vec!["/a.css"]
        );
    }
}
