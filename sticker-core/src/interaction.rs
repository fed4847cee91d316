//! Drag interaction state machine.
//!
//! ```text
//!            down inside hit-box
//!   Idle ─────────────────────────► Pending ──(long press / mouse)──► Dragging
//!    ▲                                 │                                 │
//!    └──────────── up / cancel ────────┴──────────── up / cancel ────────┘
//! ```
//!
//! Hit-testing always uses the unrotated sticker bounding box. Touch streams
//! that start inside the box suppress the platform's default scrolling until
//! they end; streams that start outside are never touched.
//!
//! The long-press timer and the page scroll lock are injected capabilities
//! ([`Scheduler`] and [`ScrollLock`]) so the machine runs without a browser.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::composition::{CompositionState, EditorConfig};
use crate::event::{PointerEvent, PointerKind, PointerPhase, Surface};
use crate::geometry::Point;

/// Handle for a scheduled long-press timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(
    /// Raw id assigned by the scheduler.
    pub u64,
);

/// Schedules and cancels one-shot timers on behalf of the drag machine.
///
/// When a timer fires, the host calls [`DragController::on_timer`] with its id.
pub trait Scheduler {
    /// Schedule a timer `delay_ms` after `now_ms`.
    fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> TimerId;

    /// Cancel a timer. Cancelling an unknown or already fired id is a no-op.
    fn cancel(&mut self, id: TimerId);
}

/// Value of the page scroll setting captured before locking it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollSnapshot(
    /// Previous setting, `None` if it could not be read.
    pub Option<String>,
);

/// Page-level scroll suppression used while a finger drags the sticker.
pub trait ScrollLock {
    /// Lock page scrolling and return the value to restore afterwards.
    fn acquire(&mut self) -> ScrollSnapshot;

    /// Restore the value captured by [`ScrollLock::acquire`].
    fn release(&mut self, previous: ScrollSnapshot);
}

/// Scroll lock for hosts without a scrollable page.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScrollLock;

impl ScrollLock for NoScrollLock {
    fn acquire(&mut self) -> ScrollSnapshot {
        ScrollSnapshot::default()
    }

    fn release(&mut self, _previous: ScrollSnapshot) {}
}

#[derive(Debug, Default)]
struct ManualTimers {
    next_id: u64,
    pending: Vec<(TimerId, u64)>,
}

/// Deterministic scheduler for hosts that drive time themselves.
///
/// Clones share the same timer list: keep one clone to poll
/// [`ManualScheduler::take_due`] and hand the other to the editor.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualTimers>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every timer due at or before `now_ms`.
    #[must_use]
    pub fn take_due(&self, now_ms: u64) -> Vec<TimerId> {
        let mut timers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut timers.pending)
            .into_iter()
            .partition(|(_, at)| *at <= now_ms);
        timers.pending = rest;
        due.into_iter().map(|(id, _)| id).collect()
    }

    /// Number of timers not yet fired or cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, now_ms: u64, delay_ms: u64) -> TimerId {
        let mut timers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        timers.next_id += 1;
        let id = TimerId(timers.next_id);
        timers.pending.push((id, now_ms.saturating_add(delay_ms)));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .retain(|(pending, _)| *pending != id);
    }
}

/// Observable phase of the drag machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhaseKind {
    /// No interaction in progress.
    Idle,
    /// Pressed inside the sticker; waiting for the long press.
    Pending,
    /// Sticker follows the pointer.
    Dragging,
}

#[derive(Debug)]
enum DragPhase {
    Idle,
    Pending {
        grab_offset: Point,
        pressed_at: u64,
        timer: TimerId,
    },
    Dragging {
        kind: PointerKind,
        grab_offset: Point,
        scroll: Option<ScrollSnapshot>,
    },
}

impl DragPhase {
    fn kind(&self) -> DragPhaseKind {
        match self {
            Self::Idle => DragPhaseKind::Idle,
            Self::Pending { .. } => DragPhaseKind::Pending,
            Self::Dragging { .. } => DragPhaseKind::Dragging,
        }
    }

    fn pointer_kind(&self) -> Option<PointerKind> {
        match self {
            Self::Idle => None,
            Self::Pending { .. } => Some(PointerKind::Touch),
            Self::Dragging { kind, .. } => Some(*kind),
        }
    }
}

/// What the host should do after an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOutcome {
    /// Suppress the platform's default handling (scroll, zoom, selection).
    pub prevent_default: bool,
    /// The composition changed and needs a redraw.
    pub changed: bool,
}

impl InputOutcome {
    const IGNORED: Self = Self {
        prevent_default: false,
        changed: false,
    };

    const CONSUMED: Self = Self {
        prevent_default: true,
        changed: false,
    };
}

/// Everything a pointer event needs to know about the current composition.
pub struct DragContext<'a> {
    /// Editor limits.
    pub config: &'a EditorConfig,
    /// Screen placement of the canvas.
    pub surface: &'a Surface,
    /// Whether the current overlay is full-bleed (never draggable).
    pub full_bleed: bool,
    /// Composition to update.
    pub composition: &'a mut CompositionState,
}

/// Converts pointer events into sticker position updates.
pub struct DragController {
    phase: DragPhase,
    long_press_ms: u64,
    scheduler: Box<dyn Scheduler>,
    scroll_lock: Box<dyn ScrollLock>,
}

impl std::fmt::Debug for DragController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragController")
            .field("phase", &self.phase)
            .field("long_press_ms", &self.long_press_ms)
            .finish_non_exhaustive()
    }
}

impl DragController {
    /// Create a controller with the given capabilities.
    #[must_use]
    pub fn new(
        long_press_ms: u64,
        scheduler: Box<dyn Scheduler>,
        scroll_lock: Box<dyn ScrollLock>,
    ) -> Self {
        Self {
            phase: DragPhase::Idle,
            long_press_ms,
            scheduler,
            scroll_lock,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> DragPhaseKind {
        self.phase.kind()
    }

    /// Handle a pointer event.
    pub fn handle(&mut self, event: &PointerEvent, ctx: DragContext<'_>) -> InputOutcome {
        if event.phase == PointerPhase::Down {
            return self.press(event, ctx);
        }

        // Events from another device class (e.g. emulated mouse events after
        // a touch) never steer the active session.
        if self.phase.pointer_kind() != Some(event.kind) {
            return InputOutcome::IGNORED;
        }

        if event.is_terminal() {
            self.finish();
            return InputOutcome::CONSUMED;
        }

        let pointer = ctx.surface.to_canvas(event.client_x, event.client_y);

        if let DragPhase::Pending {
            grab_offset,
            pressed_at,
            timer,
        } = self.phase
        {
            if event.timestamp_ms.saturating_sub(pressed_at) < self.long_press_ms {
                return InputOutcome::CONSUMED;
            }
            // The hold time has elapsed even if the host timer has not been
            // delivered yet.
            self.scheduler.cancel(timer);
            self.start_dragging(PointerKind::Touch, grab_offset);
        }

        match self.phase {
            DragPhase::Dragging { grab_offset, .. } => {
                let before = ctx.composition.revision();
                ctx.composition
                    .set_overlay_position(pointer.sub(grab_offset), ctx.config);
                tracing::trace!(
                    x = ctx.composition.overlay_position().x,
                    y = ctx.composition.overlay_position().y,
                    "Sticker moved"
                );
                InputOutcome {
                    prevent_default: true,
                    changed: ctx.composition.revision() != before,
                }
            }
            _ => InputOutcome::CONSUMED,
        }
    }

    /// Deliver a fired long-press timer. Returns `true` if dragging started.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        match self.phase {
            DragPhase::Pending {
                grab_offset, timer, ..
            } if timer == id => {
                self.start_dragging(PointerKind::Touch, grab_offset);
                true
            }
            _ => {
                tracing::trace!(timer = id.0, "Ignoring stale long-press timer");
                false
            }
        }
    }

    /// Abandon any interaction: cancel timers and release the scroll lock.
    ///
    /// Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.finish();
    }

    fn press(&mut self, event: &PointerEvent, ctx: DragContext<'_>) -> InputOutcome {
        // A new press always ends the previous session first so its scroll
        // snapshot is restored before anything else is captured.
        self.finish();

        if ctx.full_bleed {
            return InputOutcome::IGNORED;
        }

        let pointer = ctx.surface.to_canvas(event.client_x, event.client_y);
        let hit_box = ctx.composition.overlay_rect(ctx.config);
        if !hit_box.contains_point(pointer.x, pointer.y) {
            return InputOutcome::IGNORED;
        }

        let grab_offset = pointer.sub(ctx.composition.overlay_position());
        match event.kind {
            PointerKind::Mouse => self.start_dragging(PointerKind::Mouse, grab_offset),
            PointerKind::Touch => {
                let timer = self
                    .scheduler
                    .schedule(event.timestamp_ms, self.long_press_ms);
                tracing::debug!(timer = timer.0, "Touch pressed on sticker, awaiting long press");
                self.phase = DragPhase::Pending {
                    grab_offset,
                    pressed_at: event.timestamp_ms,
                    timer,
                };
            }
        }
        InputOutcome::CONSUMED
    }

    fn start_dragging(&mut self, kind: PointerKind, grab_offset: Point) {
        let scroll = match kind {
            PointerKind::Touch => Some(self.scroll_lock.acquire()),
            PointerKind::Mouse => None,
        };
        tracing::debug!(?kind, "Drag started");
        self.phase = DragPhase::Dragging {
            kind,
            grab_offset,
            scroll,
        };
    }

    fn finish(&mut self) {
        match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => {}
            DragPhase::Pending { timer, .. } => {
                self.scheduler.cancel(timer);
                tracing::debug!(timer = timer.0, "Long press cancelled");
            }
            DragPhase::Dragging { scroll, .. } => {
                if let Some(previous) = scroll {
                    self.scroll_lock.release(previous);
                }
                tracing::debug!("Drag ended");
            }
        }
    }
}

impl Drop for DragController {
    fn drop(&mut self) {
        self.finish();
    }
}
