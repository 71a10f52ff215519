//! TOML-backed asset queue.
//!
//! ```toml
//! [[asset]]
//! handle = "theme"
//! src = "/wp-content/themes/twentyten/style.css"
//! media = "screen"
//!
//! [[asset]]
//! handle = "ie-fixes"
//! src = "/wp-content/themes/twentyten/ie.css"
//! conditional = "lt IE 8"
//! ```

use super::{AssetEntry, AssetQueue};
use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default, rename = "asset")]
    assets: Vec<AssetEntry>,
}

/// Queue over a fixed, ordered list of entries.
#[derive(Debug, Default)]
pub struct ManifestQueue {
    entries: Vec<AssetEntry>,
    done: FxHashSet<String>,
}

impl ManifestQueue {
    pub fn new(entries: Vec<AssetEntry>) -> Self {
        Self {
            entries,
            done: FxHashSet::default(),
        }
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(Self::new(manifest.assets))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_str(&content).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn is_done(&self, handle: &str) -> bool {
        self.done.contains(handle)
    }
}

impl AssetQueue for ManifestQueue {
    fn pending(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !self.is_done(&e.handle))
            .map(|e| e.handle.clone())
            .collect()
    }

    fn entry(&self, handle: &str) -> Option<&AssetEntry> {
        self.entries.iter().find(|e| e.handle == handle)
    }

    fn mark_done(&mut self, handle: &str) {
        self.done.insert(handle.to_string());
    }
}
