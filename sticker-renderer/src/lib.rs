//! # Sticker Canvas Renderer
//!
//! CPU compositor for the sticker editor, built on tiny-skia.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SourceSlot (photo + handle)  AssetFetcher  │
//! ├─────────────────────────────────────────────┤
//! │  Preview: generation-tagged async redraws   │
//! ├─────────────────────────────────────────────┤
//! │  Compositor: crop background, draw overlay  │
//! ├─────────────────────────────────────────────┤
//! │  RenderedArtifact ──► Exporter (download,   │
//! │                       native share)         │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod compositor;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod share;
pub mod source;

pub use cache::{CacheStats, OverlayCache};
pub use compositor::{background_placement, BackgroundPlacement, Compositor, RenderedArtifact};
pub use error::{RenderError, RenderResult};
pub use image::{load_image_from_bytes, load_image_from_data_uri, DecodedImage, ImageFormat};
pub use pipeline::{
    load_assets, AssetFetcher, Generation, LoadedAssets, Preview, RedrawRequest,
    RedrawStatus,
};
pub use share::{
    download_link, share_payload, DownloadLink, Exporter, ShareConfig, ShareError, ShareOutcome,
    SharePayload, ShareTarget,
};
pub use source::{HandleRegistry, MemoryHandleRegistry, SourceHandle, SourceImage, SourceSlot};
