//! WebAssembly bindings for sticker-core.
//!
//! This module provides JavaScript-callable functions when compiled to WASM.
//! Page scroll locking goes through the `<body>` inline `overflow` style and
//! the anonymous id lives in `localStorage`.

use wasm_bindgen::prelude::*;

use crate::catalog::catalog;
use crate::error::{CoreError, CoreResult};
use crate::event::{PointerEvent, PointerKind, PointerPhase, Surface};
use crate::interaction::{ManualScheduler, ScrollLock, ScrollSnapshot};
use crate::lifecycle::{AnonymousId, ClientStorage};
use crate::{EditorConfig, EditorState};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

fn body_style() -> Option<web_sys::CssStyleDeclaration> {
    web_sys::window()?
        .document()?
        .body()
        .map(|body| body.style())
}

/// Log a failed style write; returns whether it applied.
fn style_applied<E: std::fmt::Debug>(result: Result<(), E>, action: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(action, "Body overflow style not updated: {e:?}");
            false
        }
    }
}

/// Locks page scrolling via `document.body.style.overflow`.
#[derive(Debug, Default)]
struct BodyScrollLock;

impl ScrollLock for BodyScrollLock {
    fn acquire(&mut self) -> ScrollSnapshot {
        let Some(style) = body_style() else {
            tracing::warn!("No document body, page scroll not locked");
            return ScrollSnapshot(None);
        };
        let previous = style.get_property_value("overflow").ok();
        style_applied(style.set_property("overflow", "hidden"), "lock");
        ScrollSnapshot(previous)
    }

    fn release(&mut self, previous: ScrollSnapshot) {
        let Some(style) = body_style() else {
            tracing::warn!("No document body, page scroll not restored");
            return;
        };
        match previous.0.as_deref() {
            Some(value) if !value.is_empty() => {
                style_applied(style.set_property("overflow", value), "restore");
            }
            _ => {
                style_applied(style.remove_property("overflow").map(drop), "restore");
            }
        }
    }
}

/// `window.localStorage`.
struct LocalStorage(web_sys::Storage);

impl LocalStorage {
    fn open() -> Option<Self> {
        web_sys::window()?.local_storage().ok().flatten().map(Self)
    }
}

impl ClientStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.0
            .set_item(key, value)
            .map_err(|e| CoreError::Collaborator(format!("localStorage write failed: {e:?}")))
    }
}

fn parse_kind(kind: &str) -> Result<PointerKind, String> {
    match kind {
        "mouse" | "pen" => Ok(PointerKind::Mouse),
        "touch" => Ok(PointerKind::Touch),
        other => Err(format!("unknown pointer kind: {other}")),
    }
}

fn parse_phase(phase: &str) -> Result<PointerPhase, String> {
    match phase {
        "down" | "start" => Ok(PointerPhase::Down),
        "move" => Ok(PointerPhase::Move),
        "up" | "end" => Ok(PointerPhase::Up),
        "cancel" => Ok(PointerPhase::Cancel),
        other => Err(format!("unknown pointer phase: {other}")),
    }
}

/// Sticker editor instance for WASM.
#[wasm_bindgen]
pub struct WasmEditor {
    editor: EditorState,
    timers: ManualScheduler,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create a new editor with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error string if the configuration is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmEditor, String> {
        let timers = ManualScheduler::new();
        let editor = EditorState::new(
            EditorConfig::default(),
            Box::new(timers.clone()),
            Box::new(BodyScrollLock),
        )
        .map_err(|e| e.to_string())?;
        Ok(Self { editor, timers })
    }

    /// Anonymous visitor id from `localStorage`, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an error string if storage is unavailable.
    #[wasm_bindgen(js_name = anonymousId)]
    pub fn anonymous_id() -> Result<String, String> {
        let storage = LocalStorage::open().ok_or_else(|| "localStorage unavailable".to_string())?;
        AnonymousId::load_or_create(&storage)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Catalog entries as JSON.
    #[wasm_bindgen(js_name = catalogJson)]
    #[must_use]
    pub fn catalog_json() -> String {
        serde_json::to_string(catalog()).unwrap_or_default()
    }

    /// Select an overlay by id.
    #[wasm_bindgen(js_name = selectOverlay)]
    pub fn select_overlay(&mut self, id: &str) {
        self.editor.select_overlay(id);
    }

    /// Report the canvas' on-screen rectangle.
    #[wasm_bindgen(js_name = setSurface)]
    pub fn set_surface(&mut self, left: f32, top: f32, width: f32, height: f32) {
        let size = self.editor.config().export_size_f32();
        self.editor.set_surface(Surface {
            left,
            top,
            display_width: width,
            display_height: height,
            canvas_width: size,
            canvas_height: size,
        });
    }

    /// Feed a pointer event. Returns `true` when the caller should call
    /// `preventDefault()`.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown kinds or phases.
    #[wasm_bindgen(js_name = pointer)]
    pub fn pointer(
        &mut self,
        kind: &str,
        phase: &str,
        client_x: f32,
        client_y: f32,
        timestamp_ms: f64,
    ) -> Result<bool, String> {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let event = PointerEvent::new(
            parse_kind(kind)?,
            parse_phase(phase)?,
            client_x,
            client_y,
            timestamp_ms.max(0.0) as u64,
        );
        Ok(self.editor.process_event(&event).prevent_default)
    }

    /// Deliver due long-press timers. Returns `true` if a drag started.
    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self, now_ms: f64) -> bool {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let due = self.timers.take_due(now_ms.max(0.0) as u64);
        due.into_iter()
            .fold(false, |started, id| self.editor.on_timer(id) || started)
    }

    /// Set the sticker scale.
    #[wasm_bindgen(js_name = setScale)]
    pub fn set_scale(&mut self, scale: f32) {
        self.editor.set_scale(scale);
    }

    /// Rotate the sticker one step; negative direction rotates left.
    #[wasm_bindgen(js_name = rotate)]
    pub fn rotate(&mut self, direction: i32) {
        if direction < 0 {
            self.editor.rotate_counter_clockwise();
        } else {
            self.editor.rotate_clockwise();
        }
    }

    /// Zoom the background one step in (`true`) or out.
    #[wasm_bindgen(js_name = zoomBackground)]
    pub fn zoom_background(&mut self, zoom_in: bool) {
        if zoom_in {
            self.editor.zoom_background_in();
        } else {
            self.editor.zoom_background_out();
        }
    }

    /// Pan the background by whole steps.
    #[wasm_bindgen(js_name = panBackground)]
    pub fn pan_background(&mut self, steps_x: i32, steps_y: i32) {
        self.editor.pan_background(steps_x, steps_y);
    }

    /// Reset background zoom and pan.
    #[wasm_bindgen(js_name = resetBackground)]
    pub fn reset_background(&mut self) {
        self.editor.reset_background();
    }

    /// Current composition as JSON.
    #[wasm_bindgen(js_name = getCompositionJson)]
    #[must_use]
    pub fn get_composition_json(&self) -> String {
        serde_json::to_string(self.editor.composition()).unwrap_or_default()
    }

    /// Release timers and the scroll lock; call when the preview unmounts.
    #[wasm_bindgen(js_name = teardown)]
    pub fn teardown(&mut self) {
        self.editor.teardown();
    }
}
