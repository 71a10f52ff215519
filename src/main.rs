//! Masher - combine static CSS and JS files into single HTTP responses.

mod cli;
mod concat;
mod config;
mod core;
mod logger;
mod queue;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{MasherConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(MasherConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::bind_server()?.run(),
        Commands::Href { paths } => cli::href::print_href(paths, &config),
        Commands::Decode { query } => cli::href::print_decoded(query, &config),
        Commands::Plan {
            manifest,
            kind,
            footer,
        } => cli::plan::run_plan(manifest, *kind, *footer, &config),
    }
}
