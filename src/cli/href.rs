//! `masher href` and `masher decode`: both directions of the URL format.

use crate::concat::{ConcatResult, ReferenceEncoder, request};
use crate::config::MasherConfig;
use anyhow::Result;

/// Print the URLs a page would embed for one group of paths.
pub fn print_href(paths: &[String], config: &MasherConfig) -> Result<()> {
    let encoder = ReferenceEncoder::from_config(config);
    for url in encoder.group_urls(paths) {
        println!("{url}");
    }
    Ok(())
}

/// Print the file list behind a combined URL or bare argument string.
pub fn print_decoded(query: &str, config: &MasherConfig) -> Result<()> {
    for reference in decode_query(query, config.concat.max_files)? {
        println!("{reference}");
    }
    Ok(())
}

fn decode_query(query: &str, max_files: usize) -> ConcatResult<Vec<String>> {
    let args = if query.contains("??") {
        request::extract_args(query)?
    } else {
        query.to_string()
    };
    request::decode_args(&args, max_files)
}
