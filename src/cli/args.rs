//! Command-line interface definitions.

use crate::queue::AssetKind;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Combine static CSS and JS files into single responses
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: masher.toml)
    #[arg(short = 'C', long, default_value = "masher.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve combined assets over HTTP
    #[command(visible_alias = "s")]
    Serve {
        /// Document root (relative to current directory)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        root: Option<PathBuf>,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Number of request handler threads
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Print the URLs for a group of root-relative asset paths
    #[command(visible_alias = "h")]
    Href {
        /// Paths in page order (e.g., /theme/a.css /theme/b.css)
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// Decode a combined query into its file list
    #[command(visible_alias = "d")]
    Decode {
        /// `??` argument string or a full combined URL
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Group an asset manifest into combined URLs
    #[command(visible_alias = "p")]
    Plan {
        /// TOML manifest with `[[asset]]` entries
        #[arg(value_hint = clap::ValueHint::FilePath)]
        manifest: PathBuf,

        /// Asset family to plan
        #[arg(short, long, value_enum, default_value = "css")]
        kind: AssetKind,

        /// Plan footer scripts instead of header scripts
        #[arg(short, long)]
        footer: bool,
    },
}
