//! Composition state and editor configuration.
//!
//! [`CompositionState`] is the view-model every redraw reads. Each mutation
//! that changes a value bumps a revision counter so derived artifacts can tell
//! whether they are still current.

use serde::{Deserialize, Serialize};

use crate::catalog::Placement;
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Point, Rect};

/// Tunable limits and steps for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Side of the exported square image in pixels.
    pub export_size: u32,
    /// Sticker side as a fraction of the export size at scale 1.0.
    pub footprint_ratio: f32,
    /// Smallest sticker scale.
    pub min_scale: f32,
    /// Largest sticker scale.
    pub max_scale: f32,
    /// Scale applied when the editor opens.
    pub default_scale: f32,
    /// Smallest background zoom.
    pub min_background_scale: f32,
    /// Largest background zoom.
    pub max_background_scale: f32,
    /// Zoom change per zoom-in/zoom-out step.
    pub background_scale_step: f32,
    /// Pan distance per step, in canvas pixels.
    pub background_pan_step: f32,
    /// Rotation change per rotate step, in degrees.
    pub rotation_step_degrees: i32,
    /// How far past each canvas edge a sticker may be dragged, as a fraction
    /// of its own size.
    pub drag_allowance_ratio: f32,
    /// Hold time before a touch starts dragging.
    pub long_press_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            export_size: 720,
            footprint_ratio: 0.3,
            min_scale: 0.5,
            max_scale: 3.0,
            default_scale: 1.8,
            min_background_scale: 1.0,
            max_background_scale: 2.5,
            background_scale_step: 0.1,
            background_pan_step: 10.0,
            rotation_step_degrees: 10,
            drag_allowance_ratio: 0.25,
            long_press_ms: 400,
        }
    }
}

impl EditorConfig {
    /// Check the configuration for inconsistent bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.export_size == 0 {
            return Err(CoreError::InvalidConfig("export_size must be > 0".into()));
        }
        if !(self.footprint_ratio > 0.0 && self.footprint_ratio.is_finite()) {
            return Err(CoreError::InvalidConfig(
                "footprint_ratio must be positive".into(),
            ));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(CoreError::InvalidConfig(format!(
                "scale range {}..={} is invalid",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.min_background_scale > 0.0
            && self.min_background_scale <= self.max_background_scale)
        {
            return Err(CoreError::InvalidConfig(format!(
                "background scale range {}..={} is invalid",
                self.min_background_scale, self.max_background_scale
            )));
        }
        if self.drag_allowance_ratio < 0.0 {
            return Err(CoreError::InvalidConfig(
                "drag_allowance_ratio must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Clamp a sticker scale into the configured range.
    ///
    /// NaN maps to the lower bound.
    #[must_use]
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        clamp_or_min(scale, self.min_scale, self.max_scale)
    }

    /// Clamp a background zoom into the configured range.
    #[must_use]
    pub fn clamp_background_scale(&self, scale: f32) -> f32 {
        clamp_or_min(scale, self.min_background_scale, self.max_background_scale)
    }

    /// Export size as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn export_size_f32(&self) -> f32 {
        self.export_size as f32
    }

    /// Sticker side length on the export canvas for a given scale.
    #[must_use]
    pub fn overlay_draw_size(&self, scale: f32) -> f32 {
        self.clamp_scale(scale) * self.export_size_f32() * self.footprint_ratio
    }

    /// Clamp a sticker top-left so it can overshoot each canvas edge by at
    /// most the drag allowance.
    #[must_use]
    pub fn clamp_position(&self, position: Point, size: f32) -> Point {
        let allowance = size * self.drag_allowance_ratio;
        let min = -allowance;
        let max = (self.export_size_f32() - size + allowance).max(min);
        Point::new(position.x.clamp(min, max), position.y.clamp(min, max))
    }
}

fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// The user-adjustable composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionState {
    overlay_position: Point,
    scale: f32,
    rotation_degrees: u16,
    background_scale: f32,
    background_offset: Point,
    revision: u64,
}

impl CompositionState {
    /// Fresh state for the given placement.
    #[must_use]
    pub fn new(config: &EditorConfig, placement: Placement) -> Self {
        Self {
            overlay_position: placement.initial_position,
            scale: config.clamp_scale(config.default_scale),
            rotation_degrees: 0,
            background_scale: config.clamp_background_scale(1.0),
            background_offset: Point::zero(),
            revision: 0,
        }
    }

    /// Sticker top-left in canvas pixels.
    #[must_use]
    pub fn overlay_position(&self) -> Point {
        self.overlay_position
    }

    /// Sticker scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Sticker rotation in whole degrees, `0..360`.
    #[must_use]
    pub fn rotation_degrees(&self) -> u16 {
        self.rotation_degrees
    }

    /// Background zoom.
    #[must_use]
    pub fn background_scale(&self) -> f32 {
        self.background_scale
    }

    /// Background pan.
    #[must_use]
    pub fn background_offset(&self) -> Point {
        self.background_offset
    }

    /// Monotonic counter bumped by every effective mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sticker side length on the export canvas.
    #[must_use]
    pub fn overlay_draw_size(&self, config: &EditorConfig) -> f32 {
        config.overlay_draw_size(self.scale)
    }

    /// Unrotated sticker bounding box.
    #[must_use]
    pub fn overlay_rect(&self, config: &EditorConfig) -> Rect {
        Rect::square(self.overlay_position, self.overlay_draw_size(config))
    }

    /// Re-seed the sticker position after the overlay selection changed.
    pub fn reseed(&mut self, placement: Placement) {
        self.set_position_raw(placement.initial_position);
    }

    /// Move the sticker, clamped to the drag bounds.
    pub fn set_overlay_position(&mut self, position: Point, config: &EditorConfig) {
        let size = self.overlay_draw_size(config);
        self.set_position_raw(config.clamp_position(position, size));
    }

    fn set_position_raw(&mut self, position: Point) {
        if self.overlay_position != position {
            self.overlay_position = position;
            self.touch();
        }
    }

    /// Set the sticker scale, clamped to the configured range.
    pub fn set_scale(&mut self, scale: f32, config: &EditorConfig) {
        let clamped = config.clamp_scale(scale);
        if (self.scale - clamped).abs() > f32::EPSILON {
            self.scale = clamped;
            self.touch();
        }
    }

    /// Set the rotation; any integer is normalised into `0..360`.
    pub fn set_rotation(&mut self, degrees: i32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let normalized = degrees.rem_euclid(360) as u16;
        if self.rotation_degrees != normalized {
            self.rotation_degrees = normalized;
            self.touch();
        }
    }

    /// Rotate by a signed number of degrees.
    pub fn rotate_by(&mut self, delta: i32) {
        self.set_rotation(i32::from(self.rotation_degrees) + delta);
    }

    /// Rotate clockwise by one configured step.
    pub fn rotate_clockwise(&mut self, config: &EditorConfig) {
        self.rotate_by(config.rotation_step_degrees);
    }

    /// Rotate counter-clockwise by one configured step.
    pub fn rotate_counter_clockwise(&mut self, config: &EditorConfig) {
        self.rotate_by(-config.rotation_step_degrees);
    }

    /// Set the background zoom, clamped to the configured range.
    pub fn set_background_scale(&mut self, scale: f32, config: &EditorConfig) {
        let clamped = config.clamp_background_scale(scale);
        if (self.background_scale - clamped).abs() > f32::EPSILON {
            self.background_scale = clamped;
            self.touch();
        }
    }

    /// Zoom the background in by one step.
    pub fn zoom_background_in(&mut self, config: &EditorConfig) {
        self.set_background_scale(self.background_scale + config.background_scale_step, config);
    }

    /// Zoom the background out by one step.
    pub fn zoom_background_out(&mut self, config: &EditorConfig) {
        self.set_background_scale(self.background_scale - config.background_scale_step, config);
    }

    /// Set the background pan offset.
    pub fn set_background_offset(&mut self, offset: Point) {
        if !(offset.x.is_finite() && offset.y.is_finite()) {
            return;
        }
        if self.background_offset != offset {
            self.background_offset = offset;
            self.touch();
        }
    }

    /// Pan the background by whole steps in each direction.
    #[allow(clippy::cast_precision_loss)]
    pub fn pan_background(&mut self, steps_x: i32, steps_y: i32, config: &EditorConfig) {
        let delta = Point::new(
            steps_x as f32 * config.background_pan_step,
            steps_y as f32 * config.background_pan_step,
        );
        self.set_background_offset(self.background_offset.add(delta));
    }

    /// Restore background zoom and pan to their neutral values.
    pub fn reset_background(&mut self, config: &EditorConfig) {
        self.set_background_scale(1.0, config);
        self.set_background_offset(Point::zero());
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
