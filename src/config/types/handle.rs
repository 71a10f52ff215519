//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from request handler threads.

use crate::config::MasherConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<MasherConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(MasherConfig::default()));

#[inline]
pub fn cfg() -> Arc<MasherConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: MasherConfig) -> Arc<MasherConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
