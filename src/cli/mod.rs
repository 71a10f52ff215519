//! Command-line interface module.

mod args;
pub mod href;
pub mod plan;
pub mod serve;

pub use args::{Cli, Commands};
