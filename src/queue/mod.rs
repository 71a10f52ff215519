//! Asset queue and combination planning.
//!
//! A page's asset queue is seen through [`AssetQueue`]: enumerate what is
//! still pending, look up an entry, mark it done. [`plan`] walks the queue
//! and splits it into runs of combinable files and assets that must be
//! served alone; [`render`] turns that plan into URLs.

mod manifest;
mod plan;

pub use manifest::ManifestQueue;
pub use plan::{AssetKind, PlanContext, plan, render};

use serde::{Deserialize, Serialize};

/// One registered stylesheet or script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetEntry {
    pub handle: String,

    /// Source URL: site-relative (`/theme/a.css`) or absolute. An empty
    /// source marks a pure grouping handle with nothing to load.
    pub src: String,

    /// Media attribute for stylesheets; `all` when absent.
    pub media: Option<String>,

    /// Conditional-comment expression (e.g. `lt IE 9`). Such assets are
    /// never combined.
    pub conditional: Option<String>,

    /// Has a right-to-left variant.
    pub rtl: bool,

    /// Script placed in the page footer.
    pub footer: bool,
}

/// Capability the planner needs from a page's asset registry.
pub trait AssetQueue {
    /// Handles not yet emitted, in enqueue order.
    fn pending(&self) -> Vec<String>;

    fn entry(&self, handle: &str) -> Option<&AssetEntry>;

    fn mark_done(&mut self, handle: &str);
}
