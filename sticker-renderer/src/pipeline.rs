//! Redraw pipeline.
//!
//! A redraw loads the background photo, then the overlay asset, then
//! composes them. Loads suspend, so several redraws can overlap; each one is
//! tagged with a [`Generation`] and only the latest is allowed to publish an
//! artifact. Completion always composes with the editor state current at
//! completion time.
//!
//! ```text
//! begin_redraw ──► load_assets (async) ──► finish_redraw
//!      │                                       │
//!  generation N                      N == latest ? publish : discard
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sticker_core::catalog::asset_path;
use sticker_core::{lookup, EditorConfig, EditorState};
use tiny_skia::Pixmap;

use crate::cache::OverlayCache;
use crate::compositor::{Compositor, RenderedArtifact};
use crate::error::RenderResult;
use crate::image::load_image_from_bytes;
use crate::source::{HandleRegistry, SourceHandle, SourceImage, SourceSlot};

/// Monotonic redraw counter value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Fetches overlay asset bytes by path, e.g. `/asset01.png`.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the asset served at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be read.
    async fn fetch(&self, path: &str) -> RenderResult<Vec<u8>>;
}

/// Inputs captured when a redraw begins.
#[derive(Debug, Clone)]
pub struct RedrawRequest {
    /// Generation assigned to this redraw.
    pub generation: Generation,
    /// Photo to use as the background.
    pub background: SourceImage,
    /// Overlay selected when the redraw began.
    pub overlay_id: String,
    /// Path the overlay is served from.
    pub overlay_path: String,
    cached_overlay: Option<Arc<Pixmap>>,
}

/// Decoded inputs for a redraw.
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    /// Generation the assets were loaded for.
    pub generation: Generation,
    /// Decoded background photo.
    pub background: Pixmap,
    /// Overlay the assets were loaded for.
    pub overlay_id: String,
    overlay_path: String,
    overlay: Arc<Pixmap>,
}

/// Decode the background, then fetch and decode the overlay.
///
/// # Errors
///
/// Returns the first fetch or decode error; nothing is composed in that case.
pub async fn load_assets(
    fetcher: &dyn AssetFetcher,
    request: &RedrawRequest,
) -> RenderResult<LoadedAssets> {
    let background = load_image_from_bytes(request.background.bytes())?.pixmap;
    let overlay = if let Some(cached) = &request.cached_overlay {
        Arc::clone(cached)
    } else {
        let bytes = fetcher.fetch(&request.overlay_path).await?;
        Arc::new(load_image_from_bytes(&bytes)?.pixmap)
    };
    Ok(LoadedAssets {
        generation: request.generation,
        background,
        overlay_id: request.overlay_id.clone(),
        overlay_path: request.overlay_path.clone(),
        overlay,
    })
}

/// Result of completing a redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedrawStatus {
    /// A new artifact was published.
    Applied(Generation),
    /// A newer redraw was requested; the result was discarded.
    Stale,
    /// Loading or compositing failed; the artifact was cleared.
    Failed(String),
    /// No source photo is set.
    NothingToRender,
}

/// Owns the source photo, the latest artifact and the redraw generations.
#[derive(Debug)]
pub struct Preview {
    compositor: Compositor,
    source: SourceSlot,
    latest: Generation,
    artifact: Option<RenderedArtifact>,
    overlays: OverlayCache,
}

impl Preview {
    /// Create an empty preview.
    #[must_use]
    pub fn new(config: EditorConfig, registry: Box<dyn HandleRegistry>) -> Self {
        Self {
            compositor: Compositor::new(config),
            source: SourceSlot::new(registry),
            latest: Generation::default(),
            artifact: None,
            overlays: OverlayCache::default(),
        }
    }

    /// Replace the source photo, revoking the previous handle.
    ///
    /// Redraws begun for the previous photo become stale.
    pub fn set_source(&mut self, image: SourceImage) -> SourceHandle {
        self.latest = self.latest.next();
        self.artifact = None;
        self.source.replace(image).clone()
    }

    /// Latest published artifact, current or not.
    #[must_use]
    pub fn artifact(&self) -> Option<&RenderedArtifact> {
        self.artifact.as_ref()
    }

    /// The artifact, only if it still matches the editor's composition.
    #[must_use]
    pub fn current_artifact(&self, editor: &EditorState) -> Option<&RenderedArtifact> {
        self.artifact.as_ref().filter(|artifact| {
            artifact.revision == editor.composition().revision()
                && artifact.overlay_id == editor.overlay_id()
        })
    }

    /// Decoded overlay cache.
    #[must_use]
    pub fn overlay_cache(&self) -> &OverlayCache {
        &self.overlays
    }

    /// Start a redraw for the editor's current selection.
    ///
    /// Every call supersedes earlier requests. Returns `None` and clears the
    /// artifact when there is no photo.
    pub fn begin_redraw(&mut self, editor: &EditorState) -> Option<RedrawRequest> {
        self.latest = self.latest.next();
        let Some(background) = self.source.image().cloned() else {
            self.artifact = None;
            return None;
        };
        let overlay_path = asset_path(editor.overlay_id());
        let cached_overlay = self.overlays.get(&overlay_path);
        tracing::debug!(
            generation = self.latest.value(),
            overlay = editor.overlay_id(),
            cached = cached_overlay.is_some(),
            "Redraw requested"
        );
        Some(RedrawRequest {
            generation: self.latest,
            background,
            overlay_id: editor.overlay_id().to_string(),
            overlay_path,
            cached_overlay,
        })
    }

    /// Complete a redraw with the result of [`load_assets`].
    pub fn finish_redraw(
        &mut self,
        generation: Generation,
        loaded: RenderResult<LoadedAssets>,
        editor: &EditorState,
    ) -> RedrawStatus {
        if generation != self.latest {
            tracing::debug!(
                generation = generation.value(),
                latest = self.latest.value(),
                "Discarding stale redraw"
            );
            return RedrawStatus::Stale;
        }

        let assets = match loaded {
            Ok(assets) => assets,
            Err(e) => return self.fail(generation, &e.to_string()),
        };
        if assets.overlay_id != editor.overlay_id() {
            return RedrawStatus::Stale;
        }
        self.overlays
            .insert(assets.overlay_path.clone(), Arc::clone(&assets.overlay));

        match self.compositor.render_artifact(
            &assets.background,
            &assets.overlay,
            editor.overlay_id(),
            lookup(editor.overlay_id()),
            editor.composition(),
            generation,
        ) {
            Ok(artifact) => {
                self.artifact = Some(artifact);
                RedrawStatus::Applied(generation)
            }
            Err(e) => self.fail(generation, &e.to_string()),
        }
    }

    /// Run a whole redraw: begin, load and finish.
    pub async fn redraw(&mut self, fetcher: &dyn AssetFetcher, editor: &EditorState) -> RedrawStatus {
        let Some(request) = self.begin_redraw(editor) else {
            return RedrawStatus::NothingToRender;
        };
        let loaded = load_assets(fetcher, &request).await;
        self.finish_redraw(request.generation, loaded, editor)
    }

    /// Release the photo handle and decoded overlays, and invalidate
    /// in-flight redraws.
    pub fn teardown(&mut self) {
        self.latest = self.latest.next();
        self.artifact = None;
        self.overlays.clear();
        self.source.clear();
    }

    fn fail(&mut self, generation: Generation, reason: &str) -> RedrawStatus {
        tracing::warn!(generation = generation.value(), "Redraw failed: {reason}");
        self.artifact = None;
        RedrawStatus::Failed(reason.to_string())
    }
}
