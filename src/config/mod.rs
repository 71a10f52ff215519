//! Configuration management for `masher.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── concat     # [concat]
//! │   ├── serve      # [serve]
//! │   └── site       # [site]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, diagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # MasherConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `[site]`    | Base URL for generated asset URLs                  |
//! | `[serve]`   | HTTP endpoint (interface, port, workers)           |
//! | `[concat]`  | Document root, slug, limits, MIME table, minifiers |

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_against};

pub use section::{ConcatConfig, ServeConfig, SiteConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing masher.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasherConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub concat: ConcatConfig,
}

impl MasherConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. A missing file is not
    /// an error: defaults apply, rooted at the current directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone());

        config.config_path = config_path;
        config.root = root;
        config.normalize_paths();
        config.apply_command_options(cli, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Make relative paths relative to the config file's directory.
    fn normalize_paths(&mut self) {
        self.concat.root = resolve_against(&self.root, &self.concat.root);
    }

    /// Apply command-line overrides. CLI paths are relative to cwd.
    fn apply_command_options(&mut self, cli: &Cli, cwd: &Path) {
        if let Commands::Serve {
            root,
            interface,
            port,
            workers,
        } = &cli.command
        {
            if let Some(root) = root {
                self.concat.root = resolve_against(cwd, root);
            }
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
            if let Some(workers) = workers {
                self.serve.workers = *workers;
            }
        }
    }

    /// Check field values that serde alone cannot.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        let slug = &self.concat.slug;
        if slug.is_empty() {
            diag.error(FieldPath::new("concat.slug"), "must not be empty");
        } else if slug.contains(['/', '?', '#', ',']) {
            diag.error_with_hint(
                FieldPath::new("concat.slug"),
                format!("`{slug}` is not a single path segment"),
                "use a plain name such as \"s\" or \"_static\"",
            );
        }

        if self.concat.max_files == 0 {
            diag.error_with_hint(
                FieldPath::new("concat.max_files"),
                "must be at least 1",
                "the default is 150",
            );
        }

        if self.concat.types.is_empty() {
            diag.error(FieldPath::new("concat.types"), "no file types configured");
        }
        for (ext, mime) in &self.concat.types {
            if ext.is_empty() || mime.trim().is_empty() {
                diag.error(
                    FieldPath::new("concat.types"),
                    format!("invalid entry `{ext}` = `{mime}`"),
                );
            }
        }

        if self.serve.workers == 0 {
            diag.error(FieldPath::new("serve.workers"), "must be at least 1");
        }

        diag.into_result()
            .map_err(|d| ConfigError::Diagnostics(d).into())
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> MasherConfig {
    MasherConfig::from_str(content).expect("test config should parse")
}
