//! `[site]` section configuration.
//!
//! ```toml
//! [site]
//! url = "https://example.com"   # prefix for generated asset URLs
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site base URL. Empty means root-relative URLs (`/s/??...`).
    pub url: String,
}

impl SiteConfig {
    /// Host part of `url`, used to tell local assets from external ones.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}
