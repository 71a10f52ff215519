//! HTTP response handlers.

use crate::concat::CombinedResponse;
use anyhow::{Result, anyhow};
use tiny_http::{Header, Request, Response, StatusCode};

/// Respond with a combined payload.
///
/// tiny_http drops the body for HEAD requests and keeps the headers.
pub fn respond_combined(request: Request, combined: CombinedResponse) -> Result<()> {
    let last_modified = make_header("Last-Modified", &combined.last_modified_header())?;
    let content_type = make_header("Content-Type", &combined.content_type)?;
    let content_length = make_header("Content-Length", &combined.content_length().to_string())?;

    let response = Response::from_data(combined.body)
        .with_header(last_modified)
        .with_header(content_type)
        .with_header(content_length);
    request.respond(response)?;
    Ok(())
}

/// Respond with a bare status line and no body.
pub fn respond_status(request: Request, status: u16) -> Result<()> {
    request.respond(Response::empty(StatusCode(status)))?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_header() {
        let header = make_header("Content-Type", "text/css").unwrap();
        assert!(header.field.equiv("content-type"));
        assert_eq!(header.value.as_str(), "text/css");

        assert!(make_header("Content-Type", "café").is_err());
    }
}
