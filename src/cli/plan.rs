//! `masher plan`: group a manifest's assets into page URLs.

use crate::concat::ReferenceEncoder;
use crate::config::MasherConfig;
use crate::debug;
use crate::queue::{AssetKind, ManifestQueue, PlanContext, plan, render};
use anyhow::Result;
use std::path::Path;

/// Plan `manifest` and print one `media<TAB>url` line per URL.
pub fn run_plan(manifest: &Path, kind: AssetKind, footer: bool, config: &MasherConfig) -> Result<()> {
    let mut queue = ManifestQueue::load(manifest)?;
    let host = config.site.host();
    let ctx = PlanContext {
        root: &config.concat.root,
        site_host: host.as_deref(),
        rtl: config.concat.rtl,
        footer,
        filter: None,
    };

    let emissions = plan(&mut queue, &ctx, kind);
    let encoder = ReferenceEncoder::from_config(config);
    for rendered in render(&emissions, &encoder) {
        debug!("plan"; "{}", rendered.handles.join(", "));
        println!("{}\t{}", rendered.media, rendered.url);
    }
    Ok(())
}
