//! Compositing of the background photo and the selected overlay.
//!
//! The background is center-cropped to a square and scaled to cover the
//! export canvas, then zoomed and panned. Stickers are drawn at
//! `scale * export * footprint_ratio`, rotated about their own center.
//! Full-bleed overlays are stretched across the whole canvas.

use sticker_core::{CompositionState, EditorConfig, Placement};
use tiny_skia::{
    FilterQuality, Paint, Pattern, Pixmap, PixmapPaint, Rect, SpreadMode, Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::image::{encode_png, png_data_uri};
use crate::pipeline::Generation;

/// Where the background crop lands on the export canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundPlacement {
    /// Left edge of the square crop in source pixels.
    pub crop_x: f32,
    /// Top edge of the square crop in source pixels.
    pub crop_y: f32,
    /// Side of the square crop in source pixels.
    pub crop_side: f32,
    /// Left edge of the drawn crop on the canvas.
    pub dest_x: f32,
    /// Top edge of the drawn crop on the canvas.
    pub dest_y: f32,
    /// Side of the drawn crop on the canvas.
    pub dest_size: f32,
}

/// Compute the background crop and its destination.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn background_placement(
    width: u32,
    height: u32,
    export_size: f32,
    state: &CompositionState,
) -> BackgroundPlacement {
    let (w, h) = (width as f32, height as f32);
    let side = w.min(h);
    let dest_size = export_size * state.background_scale();
    let offset = state.background_offset();
    BackgroundPlacement {
        crop_x: (w - side) / 2.0,
        crop_y: (h - side) / 2.0,
        crop_side: side,
        dest_x: (export_size - dest_size) / 2.0 + offset.x,
        dest_y: (export_size - dest_size) / 2.0 + offset.y,
        dest_size,
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    /// Encoded PNG.
    pub png: Vec<u8>,
    /// `data:image/png;base64,...` form of [`RenderedArtifact::png`].
    pub data_uri: String,
    /// Overlay drawn into this artifact.
    pub overlay_id: String,
    /// Composition revision the artifact was drawn from.
    pub revision: u64,
    /// Redraw generation that produced it.
    pub generation: Generation,
}

/// Draws compositions onto a square export canvas.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    config: EditorConfig,
}

impl Compositor {
    /// Create a compositor for the given editor configuration.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    /// Editor configuration used for sizing.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Draw the background and overlay into a fresh canvas.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the canvas cannot be allocated.
    pub fn compose(
        &self,
        background: &Pixmap,
        overlay: &Pixmap,
        placement: Placement,
        state: &CompositionState,
    ) -> RenderResult<Pixmap> {
        let size = self.config.export_size;
        let mut canvas = Pixmap::new(size, size)
            .ok_or_else(|| RenderError::Surface(format!("cannot allocate {size}x{size} canvas")))?;

        self.draw_background(&mut canvas, background, state);
        if placement.full_bleed {
            self.draw_full_bleed(&mut canvas, overlay);
        } else {
            self.draw_sticker(&mut canvas, overlay, state);
        }
        Ok(canvas)
    }

    /// Compose and encode into a [`RenderedArtifact`].
    ///
    /// # Errors
    ///
    /// Returns an error if compositing or PNG encoding fails.
    pub fn render_artifact(
        &self,
        background: &Pixmap,
        overlay: &Pixmap,
        overlay_id: &str,
        placement: Placement,
        state: &CompositionState,
        generation: Generation,
    ) -> RenderResult<RenderedArtifact> {
        let canvas = self.compose(background, overlay, placement, state)?;
        let png = encode_png(&canvas)?;
        let data_uri = png_data_uri(&png);
        tracing::debug!(
            overlay = overlay_id,
            revision = state.revision(),
            generation = generation.value(),
            bytes = png.len(),
            "Artifact rendered"
        );
        Ok(RenderedArtifact {
            png,
            data_uri,
            overlay_id: overlay_id.to_string(),
            revision: state.revision(),
            generation,
        })
    }

    fn draw_background(&self, canvas: &mut Pixmap, background: &Pixmap, state: &CompositionState) {
        let bg = background_placement(
            background.width(),
            background.height(),
            self.config.export_size_f32(),
            state,
        );
        let Some(dest) = Rect::from_xywh(bg.dest_x, bg.dest_y, bg.dest_size, bg.dest_size) else {
            tracing::warn!(?bg, "Background destination is degenerate, skipping");
            return;
        };

        let s = bg.dest_size / bg.crop_side;
        let paint = Paint {
            shader: Pattern::new(
                background.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Bilinear,
                1.0,
                Transform::from_row(s, 0.0, 0.0, s, bg.dest_x - bg.crop_x * s, bg.dest_y - bg.crop_y * s),
            ),
            ..Paint::default()
        };
        canvas.fill_rect(dest, &paint, Transform::identity(), None);
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_sticker(&self, canvas: &mut Pixmap, overlay: &Pixmap, state: &CompositionState) {
        let size = state.overlay_draw_size(&self.config);
        let center = state.overlay_rect(&self.config).center();
        let half = size / 2.0;

        let transform = Transform::from_translate(center.x, center.y)
            .pre_concat(Transform::from_rotate(f32::from(state.rotation_degrees())))
            .pre_translate(-half, -half)
            .pre_scale(size / overlay.width() as f32, size / overlay.height() as f32);

        canvas.draw_pixmap(0, 0, overlay.as_ref(), &bilinear(), transform, None);
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_full_bleed(&self, canvas: &mut Pixmap, overlay: &Pixmap) {
        let export = self.config.export_size_f32();
        let transform = Transform::from_scale(
            export / overlay.width() as f32,
            export / overlay.height() as f32,
        );
        canvas.draw_pixmap(0, 0, overlay.as_ref(), &bilinear(), transform, None);
    }
}

fn bilinear() -> PixmapPaint {
    PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    }
}
