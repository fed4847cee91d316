//! Editor state: the selected overlay, its composition and the drag machine.

use crate::catalog::{lookup, Placement, DEFAULT_OVERLAY};
use crate::composition::{CompositionState, EditorConfig};
use crate::error::CoreResult;
use crate::event::{PointerEvent, Surface};
use crate::geometry::Point;
use crate::interaction::{
    DragContext, DragController, DragPhaseKind, InputOutcome, ScrollLock, Scheduler, TimerId,
};
use crate::lifecycle::{LifecycleRecorder, LifecycleStage};

/// The complete editor state for one photo.
#[derive(Debug)]
pub struct EditorState {
    config: EditorConfig,
    overlay_id: String,
    placement: Placement,
    composition: CompositionState,
    surface: Surface,
    drag: DragController,
    recorder: Option<LifecycleRecorder>,
}

impl EditorState {
    /// Create an editor showing [`DEFAULT_OVERLAY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is inconsistent.
    pub fn new(
        config: EditorConfig,
        scheduler: Box<dyn Scheduler>,
        scroll_lock: Box<dyn ScrollLock>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let placement = lookup(DEFAULT_OVERLAY);
        let composition = CompositionState::new(&config, placement);
        let surface = Surface::unscaled(config.export_size_f32());
        let drag = DragController::new(config.long_press_ms, scheduler, scroll_lock);
        Ok(Self {
            config,
            overlay_id: DEFAULT_OVERLAY.to_string(),
            placement,
            composition,
            surface,
            drag,
            recorder: None,
        })
    }

    /// Attach a lifecycle recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: LifecycleRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Editor configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Currently selected overlay id.
    #[must_use]
    pub fn overlay_id(&self) -> &str {
        &self.overlay_id
    }

    /// Whether the selected overlay covers the whole canvas.
    #[must_use]
    pub fn is_full_bleed(&self) -> bool {
        self.placement.full_bleed
    }

    /// Current composition.
    #[must_use]
    pub fn composition(&self) -> &CompositionState {
        &self.composition
    }

    /// Current drag phase.
    #[must_use]
    pub fn drag_phase(&self) -> DragPhaseKind {
        self.drag.phase()
    }

    /// Select an overlay.
    ///
    /// Switching to a different overlay ends any drag in progress and moves
    /// the sticker to the new overlay's initial position. Re-selecting the
    /// current overlay changes nothing.
    pub fn select_overlay(&mut self, id: &str) {
        if self.overlay_id == id {
            return;
        }
        self.drag.teardown();
        self.placement = lookup(id);
        self.overlay_id = id.to_string();
        self.composition.reseed(self.placement);
        tracing::debug!(overlay = id, full_bleed = self.placement.full_bleed, "Overlay selected");
        self.record(LifecycleStage::Selected);
    }

    /// Update where the canvas is displayed on screen.
    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    /// Whether a canvas-space point grabs the sticker.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> bool {
        !self.placement.full_bleed
            && self
                .composition
                .overlay_rect(&self.config)
                .contains_point(point.x, point.y)
    }

    /// Process a pointer event.
    pub fn process_event(&mut self, event: &PointerEvent) -> InputOutcome {
        self.drag.handle(
            event,
            DragContext {
                config: &self.config,
                surface: &self.surface,
                full_bleed: self.placement.full_bleed,
                composition: &mut self.composition,
            },
        )
    }

    /// Deliver a fired long-press timer.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        self.drag.on_timer(id)
    }

    /// Set the sticker scale (clamped).
    pub fn set_scale(&mut self, scale: f32) {
        self.composition.set_scale(scale, &self.config);
    }

    /// Rotate the sticker one step clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.composition.rotate_clockwise(&self.config);
    }

    /// Rotate the sticker one step counter-clockwise.
    pub fn rotate_counter_clockwise(&mut self) {
        self.composition.rotate_counter_clockwise(&self.config);
    }

    /// Set the sticker rotation in degrees; any integer is accepted.
    pub fn set_rotation(&mut self, degrees: i32) {
        self.composition.set_rotation(degrees);
    }

    /// Reset the sticker rotation.
    pub fn reset_rotation(&mut self) {
        self.composition.set_rotation(0);
    }

    /// Set the background zoom (clamped).
    pub fn set_background_scale(&mut self, scale: f32) {
        self.composition.set_background_scale(scale, &self.config);
    }

    /// Set the background pan offset in canvas pixels.
    pub fn set_background_offset(&mut self, offset: Point) {
        self.composition.set_background_offset(offset);
    }

    /// Zoom the background in one step.
    pub fn zoom_background_in(&mut self) {
        self.composition.zoom_background_in(&self.config);
    }

    /// Zoom the background out one step.
    pub fn zoom_background_out(&mut self) {
        self.composition.zoom_background_out(&self.config);
    }

    /// Pan the background by whole steps.
    pub fn pan_background(&mut self, steps_x: i32, steps_y: i32) {
        self.composition.pan_background(steps_x, steps_y, &self.config);
    }

    /// Reset background zoom and pan.
    pub fn reset_background(&mut self) {
        self.composition.reset_background(&self.config);
    }

    /// Move the sticker directly (clamped to drag bounds).
    pub fn set_overlay_position(&mut self, position: Point) {
        self.composition
            .set_overlay_position(position, &self.config);
    }

    /// Report a lifecycle milestone for the current overlay.
    pub fn record(&self, stage: LifecycleStage) {
        if let Some(recorder) = &self.recorder {
            recorder.record(stage, &self.overlay_id);
        }
    }

    /// End any interaction, cancelling timers and restoring page scroll.
    pub fn teardown(&mut self) {
        self.drag.teardown();
    }
}
