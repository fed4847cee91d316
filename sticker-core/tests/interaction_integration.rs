//! Drag interaction integration tests.
//!
//! Drives an [`EditorState`] through mouse and touch streams on a canvas
//! displayed at half its backing-store size.

use std::sync::{Arc, Mutex};

use sticker_core::{
    DragPhaseKind, EditorConfig, EditorState, ManualScheduler, Point, PointerEvent, PointerPhase,
    ScrollLock, ScrollSnapshot, Surface,
};

/// Scroll lock that records calls and pretends the page had `overflow: scroll`.
#[derive(Clone, Default)]
struct FakeBody {
    overflow: Arc<Mutex<String>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl ScrollLock for FakeBody {
    fn acquire(&mut self) -> ScrollSnapshot {
        self.calls.lock().unwrap().push("acquire");
        let mut overflow = self.overflow.lock().unwrap();
        let previous = overflow.clone();
        *overflow = "hidden".to_string();
        ScrollSnapshot(Some(previous))
    }

    fn release(&mut self, previous: ScrollSnapshot) {
        self.calls.lock().unwrap().push("release");
        *self.overflow.lock().unwrap() = previous.0.unwrap_or_default();
    }
}

struct Harness {
    editor: EditorState,
    timers: ManualScheduler,
    body: FakeBody,
}

impl Harness {
    fn new() -> Self {
        let timers = ManualScheduler::new();
        let body = FakeBody::default();
        *body.overflow.lock().unwrap() = "scroll".to_string();
        let mut editor = EditorState::new(
            EditorConfig::default(),
            Box::new(timers.clone()),
            Box::new(body.clone()),
        )
        .expect("editor");
        // 720px canvas shown at 360x360 CSS pixels, 10px from the page origin.
        editor.set_surface(Surface {
            left: 10.0,
            top: 10.0,
            display_width: 360.0,
            display_height: 360.0,
            canvas_width: 720.0,
            canvas_height: 720.0,
        });
        editor.select_overlay("asset02.png");
        Self {
            editor,
            timers,
            body,
        }
    }

    /// Client coordinates for a canvas-space point.
    fn client(canvas_x: f32, canvas_y: f32) -> (f32, f32) {
        (canvas_x / 2.0 + 10.0, canvas_y / 2.0 + 10.0)
    }

    fn mouse(&mut self, phase: PointerPhase, canvas_x: f32, canvas_y: f32, t: u64) -> bool {
        let (x, y) = Self::client(canvas_x, canvas_y);
        self.editor
            .process_event(&PointerEvent::mouse(phase, x, y, t))
            .prevent_default
    }

    fn touch(&mut self, phase: PointerPhase, canvas_x: f32, canvas_y: f32, t: u64) -> bool {
        let (x, y) = Self::client(canvas_x, canvas_y);
        self.editor
            .process_event(&PointerEvent::touch(phase, x, y, t))
            .prevent_default
    }

    fn fire_timers(&mut self, now: u64) -> usize {
        let due = self.timers.take_due(now);
        let count = due.len();
        for id in due {
            self.editor.on_timer(id);
        }
        count
    }

    fn position(&self) -> Point {
        self.editor.composition().overlay_position()
    }
}

// ==========================================================================
// Hit-testing
// ==========================================================================

#[test]
fn test_hit_box_boundary() {
    let harness = Harness::new();
    let pos = harness.position();
    let size = harness
        .editor
        .composition()
        .overlay_draw_size(harness.editor.config());

    assert!(harness.editor.hit_test(pos));
    assert!(harness.editor.hit_test(Point::new(pos.x + size, pos.y + size)));
    assert!(!harness
        .editor
        .hit_test(Point::new(pos.x + size + 1.0, pos.y + size + 1.0)));
}

#[test]
fn test_hit_box_ignores_rotation() {
    let mut harness = Harness::new();
    let pos = harness.position();
    for _ in 0..4 {
        harness.editor.rotate_clockwise();
    }
    // The corner of the axis-aligned box stays grabbable at 40 degrees.
    assert!(harness.editor.hit_test(Point::new(pos.x + 1.0, pos.y + 1.0)));
}

// ==========================================================================
// Mouse
// ==========================================================================

#[test]
fn test_mouse_drag_moves_by_exact_delta() {
    let mut harness = Harness::new();
    let start = harness.position();

    assert!(harness.mouse(PointerPhase::Down, 300.0, 300.0, 0));
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Dragging);
    harness.mouse(PointerPhase::Move, 340.0, 320.0, 16);
    harness.mouse(PointerPhase::Up, 340.0, 320.0, 32);

    assert_eq!(harness.position(), Point::new(start.x + 40.0, start.y + 20.0));
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Idle);
}

#[test]
fn test_moves_after_release_are_ignored() {
    let mut harness = Harness::new();
    harness.mouse(PointerPhase::Down, 300.0, 300.0, 0);
    harness.mouse(PointerPhase::Up, 300.0, 300.0, 10);
    let after_release = harness.position();
    assert!(!harness.mouse(PointerPhase::Move, 500.0, 500.0, 20));
    assert_eq!(harness.position(), after_release);
}

#[test]
fn test_drag_is_clamped_past_canvas_edges() {
    let mut harness = Harness::new();
    let size = harness
        .editor
        .composition()
        .overlay_draw_size(harness.editor.config());

    harness.mouse(PointerPhase::Down, 300.0, 300.0, 0);
    harness.mouse(PointerPhase::Move, -2000.0, -2000.0, 16);
    let pos = harness.position();
    assert!((pos.x + size * 0.25).abs() < 1e-3, "x = {}", pos.x);
    assert!((pos.y + size * 0.25).abs() < 1e-3, "y = {}", pos.y);

    harness.mouse(PointerPhase::Move, 5000.0, 5000.0, 32);
    let pos = harness.position();
    let max = 720.0 - size + size * 0.25;
    assert!((pos.x - max).abs() < 1e-3);
    assert!((pos.y - max).abs() < 1e-3);
}

// ==========================================================================
// Touch
// ==========================================================================

#[test]
fn test_short_touch_never_drags() {
    let mut harness = Harness::new();
    let start = harness.position();

    assert!(harness.touch(PointerPhase::Down, 300.0, 300.0, 0));
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Pending);
    harness.touch(PointerPhase::Move, 320.0, 320.0, 100);
    assert!(harness.touch(PointerPhase::Up, 320.0, 320.0, 250));

    assert_eq!(harness.fire_timers(10_000), 0, "timer should be cancelled");
    assert_eq!(harness.position(), start);
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Idle);
    assert!(harness.body.calls.lock().unwrap().is_empty());
}

#[test]
fn test_long_press_then_move_drags() {
    let mut harness = Harness::new();
    let start = harness.position();

    harness.touch(PointerPhase::Down, 300.0, 300.0, 0);
    assert_eq!(harness.fire_timers(399), 0);
    assert_eq!(harness.fire_timers(400), 1);
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Dragging);
    assert_eq!(harness.body.overflow.lock().unwrap().as_str(), "hidden");

    assert!(harness.touch(PointerPhase::Move, 280.0, 350.0, 450));
    assert_eq!(harness.position(), Point::new(start.x - 20.0, start.y + 50.0));

    harness.touch(PointerPhase::Up, 280.0, 350.0, 500);
    assert_eq!(harness.body.overflow.lock().unwrap().as_str(), "scroll");
    assert_eq!(*harness.body.calls.lock().unwrap(), vec!["acquire", "release"]);
}

#[test]
fn test_touch_cancel_restores_scroll() {
    let mut harness = Harness::new();
    harness.touch(PointerPhase::Down, 300.0, 300.0, 0);
    harness.fire_timers(400);
    assert!(harness.touch(PointerPhase::Cancel, 300.0, 300.0, 450));
    assert_eq!(harness.body.overflow.lock().unwrap().as_str(), "scroll");
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Idle);
}

#[test]
fn test_touch_outside_keeps_default_scrolling() {
    let mut harness = Harness::new();
    assert!(!harness.touch(PointerPhase::Down, 20.0, 700.0, 0));
    assert!(!harness.touch(PointerPhase::Move, 20.0, 500.0, 450));
    assert!(!harness.touch(PointerPhase::Up, 20.0, 400.0, 600));
    assert_eq!(harness.timers.pending_count(), 0);
}

#[test]
fn test_touch_inside_suppresses_scrolling_until_end() {
    let mut harness = Harness::new();
    assert!(harness.touch(PointerPhase::Down, 300.0, 300.0, 0));
    assert!(harness.touch(PointerPhase::Move, 300.0, 200.0, 50));
    assert!(harness.touch(PointerPhase::Up, 300.0, 200.0, 100));
    assert!(!harness.touch(PointerPhase::Move, 300.0, 100.0, 150));
}

// ==========================================================================
// Full-bleed and teardown
// ==========================================================================

#[test]
fn test_full_bleed_overlay_never_moves() {
    let mut harness = Harness::new();
    harness.editor.select_overlay("asset09.png");
    let before = harness.editor.composition().clone();

    harness.mouse(PointerPhase::Down, 360.0, 360.0, 0);
    harness.mouse(PointerPhase::Move, 100.0, 100.0, 10);
    harness.mouse(PointerPhase::Up, 100.0, 100.0, 20);
    harness.touch(PointerPhase::Down, 360.0, 360.0, 100);
    harness.fire_timers(1_000);
    harness.touch(PointerPhase::Move, 100.0, 100.0, 1_100);
    harness.touch(PointerPhase::Up, 100.0, 100.0, 1_200);

    assert_eq!(harness.editor.composition(), &before);
    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Idle);
}

#[test]
fn test_switching_overlay_mid_drag_ends_session() {
    let mut harness = Harness::new();
    harness.touch(PointerPhase::Down, 300.0, 300.0, 0);
    harness.fire_timers(400);
    harness.editor.select_overlay("asset06.png");

    assert_eq!(harness.editor.drag_phase(), DragPhaseKind::Idle);
    assert_eq!(harness.body.overflow.lock().unwrap().as_str(), "scroll");
    assert_eq!(harness.position(), Point::new(240.0, 240.0));
}

#[test]
fn test_teardown_mid_press_leaves_no_timer() {
    let mut harness = Harness::new();
    harness.touch(PointerPhase::Down, 300.0, 300.0, 0);
    assert_eq!(harness.timers.pending_count(), 1);
    harness.editor.teardown();
    assert_eq!(harness.timers.pending_count(), 0);
    harness.editor.teardown();
    assert!(harness.body.calls.lock().unwrap().is_empty());
}

#[test]
fn test_drop_releases_active_drag() {
    let harness = {
        let mut harness = Harness::new();
        harness.touch(PointerPhase::Down, 300.0, 300.0, 0);
        harness.fire_timers(400);
        harness
    };
    let body = harness.body.clone();
    let timers = harness.timers.clone();
    drop(harness);
    assert_eq!(body.overflow.lock().unwrap().as_str(), "scroll");
    assert_eq!(timers.pending_count(), 0);
}
