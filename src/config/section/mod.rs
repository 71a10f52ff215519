//! Configuration sections of `masher.toml`.

mod concat;
mod serve;
mod site;

pub use concat::ConcatConfig;
pub use serve::ServeConfig;
pub use site::SiteConfig;
