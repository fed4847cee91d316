//! # Sticker Canvas Core
//!
//! Editor logic for decorating a profile photo with a sticker overlay.
//! Compiles to WASM so the browser host and native tools share one
//! implementation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              sticker-core.wasm              │
//! ├─────────────────────────────────────────────┤
//! │  Catalog         │  Interaction             │
//! │  - Overlay ids   │  - Pointer/touch events  │
//! │  - Placement     │  - Hit-testing           │
//! │  - Full-bleed    │  - Long-press drag       │
//! ├─────────────────────────────────────────────┤
//! │  Composition     │  Collaborators           │
//! │  - Scale/rotate  │  - Scroll lock, timers   │
//! │  - Background    │  - Lifecycle, messages   │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod composition;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interaction;
pub mod lifecycle;
pub mod message;
pub mod state;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use catalog::{catalog, lookup, OverlaySpec, Placement, DEFAULT_OVERLAY};
pub use composition::{CompositionState, EditorConfig};
pub use error::{CoreError, CoreResult};
pub use event::{PointerEvent, PointerKind, PointerPhase, Surface};
pub use geometry::{Point, Rect};
pub use interaction::{
    DragPhaseKind, InputOutcome, ManualScheduler, NoScrollLock, ScrollLock, ScrollSnapshot,
    Scheduler, TimerId,
};
pub use lifecycle::{
    AnonymousId, ClientStorage, LifecycleEvent, LifecycleRecorder, LifecycleSink, LifecycleStage,
    MemorySink, MemoryStorage,
};
pub use message::{InMemoryMessageBoard, MessageBoard, MessageDraft, SupportMessage};
pub use state::EditorState;

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
