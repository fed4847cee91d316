//! Pointer input and screen-to-canvas coordinate conversion.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Input device that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Mouse or pen; drags start immediately.
    Mouse,
    /// Touch screen; drags start after a long press.
    Touch,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed or finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released or finger lifted.
    Up,
    /// Interaction cancelled by the platform (e.g., palm rejection).
    Cancel,
}

/// A pointer event in client (CSS pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Device class.
    pub kind: PointerKind,
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in client coordinates.
    pub client_x: f32,
    /// Y position in client coordinates.
    pub client_y: f32,
    /// Timestamp in milliseconds on a monotonic clock.
    pub timestamp_ms: u64,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub fn new(
        kind: PointerKind,
        phase: PointerPhase,
        client_x: f32,
        client_y: f32,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            kind,
            phase,
            client_x,
            client_y,
            timestamp_ms,
        }
    }

    /// Mouse event shorthand.
    #[must_use]
    pub fn mouse(phase: PointerPhase, client_x: f32, client_y: f32, timestamp_ms: u64) -> Self {
        Self::new(PointerKind::Mouse, phase, client_x, client_y, timestamp_ms)
    }

    /// Touch event shorthand.
    #[must_use]
    pub fn touch(phase: PointerPhase, client_x: f32, client_y: f32, timestamp_ms: u64) -> Self {
        Self::new(PointerKind::Touch, phase, client_x, client_y, timestamp_ms)
    }

    /// Whether this event ends the interaction.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, PointerPhase::Up | PointerPhase::Cancel)
    }
}

/// Where the canvas is displayed on screen and its backing-store size.
///
/// The backing store (export resolution) usually differs from the displayed
/// CSS size, so client coordinates must be rescaled per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Left edge of the displayed canvas in client coordinates.
    pub left: f32,
    /// Top edge of the displayed canvas in client coordinates.
    pub top: f32,
    /// Displayed width in CSS pixels.
    pub display_width: f32,
    /// Displayed height in CSS pixels.
    pub display_height: f32,
    /// Backing-store width in canvas pixels.
    pub canvas_width: f32,
    /// Backing-store height in canvas pixels.
    pub canvas_height: f32,
}

impl Surface {
    /// A surface displayed 1:1 at the origin.
    #[must_use]
    pub fn unscaled(size: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            display_width: size,
            display_height: size,
            canvas_width: size,
            canvas_height: size,
        }
    }

    /// Convert client coordinates to canvas pixel coordinates.
    ///
    /// A collapsed (zero-sized) display falls back to a 1:1 ratio.
    #[must_use]
    pub fn to_canvas(&self, client_x: f32, client_y: f32) -> Point {
        let ratio_x = ratio(self.canvas_width, self.display_width);
        let ratio_y = ratio(self.canvas_height, self.display_height);
        Point::new(
            (client_x - self.left) * ratio_x,
            (client_y - self.top) * ratio_y,
        )
    }
}

fn ratio(canvas: f32, display: f32) -> f32 {
    if display > 0.0 && display.is_finite() {
        canvas / display
    } else {
        1.0
    }
}
