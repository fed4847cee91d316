//! # Sticker CLI
//!
//! Command-line host for the sticker editor. Composes a photo with an
//! overlay from an asset directory and writes the exported PNG.
//!
//! ## Usage
//!
//! ```bash
//! sticker compose photo.jpg --overlay asset03.png --assets-dir public --scale 1.2
//! sticker catalog --json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Editor and share settings, optionally loaded from JSON
//! - `FsAssetFetcher` - Serves overlay assets from a directory
//! - `FileStorage` - Keeps the anonymous client id between runs
//! - `run_compose` - Drives the editor and redraw pipeline once

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod compose;
mod fetcher;
mod storage;

pub use compose::{catalog_rows, run_compose, ComposeReport, TracingSink};
pub use fetcher::FsAssetFetcher;
pub use storage::FileStorage;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sticker_core::{EditorConfig, DEFAULT_OVERLAY};
use sticker_renderer::ShareConfig;

/// Command-line arguments for the sticker tool.
#[derive(Debug, Clone, Parser)]
#[command(name = "sticker")]
#[command(about = "Decorate a profile photo with a sticker overlay")]
#[command(version)]
pub struct CliArgs {
    /// JSON file with `editor` and `share` settings
    #[arg(long, global = true, env = "STICKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compose a photo with an overlay and write the PNG
    Compose(ComposeArgs),
    /// List the overlay catalog
    Catalog {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for `compose`.
#[derive(Debug, Clone, Args)]
pub struct ComposeArgs {
    /// Source photo (PNG, JPEG or WebP)
    pub photo: PathBuf,

    /// Overlay id from the catalog
    #[arg(long, default_value = DEFAULT_OVERLAY)]
    pub overlay: String,

    /// Directory the overlay assets are served from
    #[arg(long, env = "STICKER_ASSETS_DIR", default_value = "public")]
    pub assets_dir: PathBuf,

    /// Sticker scale (clamped to the configured range)
    #[arg(long)]
    pub scale: Option<f32>,

    /// Sticker rotation in degrees
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub rotation: i32,

    /// Sticker left edge in canvas pixels
    #[arg(long, allow_negative_numbers = true)]
    pub x: Option<f32>,

    /// Sticker top edge in canvas pixels
    #[arg(long, allow_negative_numbers = true)]
    pub y: Option<f32>,

    /// Background zoom
    #[arg(long)]
    pub bg_scale: Option<f32>,

    /// Background horizontal pan in canvas pixels
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub bg_offset_x: f32,

    /// Background vertical pan in canvas pixels
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub bg_offset_y: f32,

    /// Output file (defaults to the configured download file name)
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Also print the PNG as a data URI
    #[arg(long)]
    pub data_uri: bool,

    /// JSON file that keeps the anonymous client id between runs; a fresh
    /// id is used for every run when unset
    #[arg(long, env = "STICKER_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Editor limits and steps.
    pub editor: EditorConfig,
    /// Download and share text.
    pub share: ShareConfig,
}

impl AppConfig {
    /// Load from a JSON file, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.editor.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_args_parse() {
        let args = CliArgs::try_parse_from([
            "sticker",
            "compose",
            "me.jpg",
            "--overlay",
            "asset05.png",
            "--rotation",
            "-30",
            "--bg-offset-x",
            "-10",
            "--scale",
            "2",
        ])
        .expect("parse");
        let Command::Compose(compose) = args.command else {
            panic!("expected compose");
        };
        assert_eq!(compose.photo, PathBuf::from("me.jpg"));
        assert_eq!(compose.overlay, "asset05.png");
        assert_eq!(compose.rotation, -30);
        assert_eq!(compose.scale, Some(2.0));
        assert!((compose.bg_offset_x + 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn overlay_defaults_to_first_asset() {
        let args = CliArgs::try_parse_from(["sticker", "compose", "me.jpg"]).expect("parse");
        let Command::Compose(compose) = args.command else {
            panic!("expected compose");
        };
        assert_eq!(compose.overlay, DEFAULT_OVERLAY);
        assert!(compose.out.is_none());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"editor":{"export_size":360}}"#).expect("json");
        assert_eq!(config.editor.export_size, 360);
        assert!((config.editor.max_scale - 3.0).abs() < f32::EPSILON);
        assert_eq!(config.share.filename, "rainbowaction-profile.png");
    }

    #[test]
    fn missing_config_path_means_defaults() {
        assert_eq!(AppConfig::load(None).expect("defaults"), AppConfig::default());
    }
}
