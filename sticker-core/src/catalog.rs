//! Static overlay catalog.
//!
//! Maps an overlay id (the asset file name) to its initial placement and
//! behaviour class. Unknown ids resolve to a sticker at the default position
//! so that a stale selection never breaks the editor.

use serde::Serialize;

use crate::geometry::Point;

/// Overlay selected when a new photo is chosen.
pub const DEFAULT_OVERLAY: &str = "asset01.png";

/// Initial position for every sticker without its own entry.
pub const DEFAULT_POSITION: Point = Point::new(240.0, 240.0);

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlaySpec {
    /// Asset file name, also the overlay identifier.
    pub id: &'static str,
    /// Gallery label.
    pub label: &'static str,
    /// Top-left of the sticker in canvas pixels when first selected.
    pub initial_position: Point,
    /// Covers the whole canvas; position, scale and rotation are inert.
    pub full_bleed: bool,
}

impl OverlaySpec {
    const fn sticker(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            initial_position: DEFAULT_POSITION,
            full_bleed: false,
        }
    }

    const fn full_bleed(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            initial_position: DEFAULT_POSITION,
            full_bleed: true,
        }
    }

    /// Path the asset is served from.
    #[must_use]
    pub fn asset_path(&self) -> String {
        asset_path(self.id)
    }
}

/// Path an overlay asset is served from, rooted exactly once.
#[must_use]
pub fn asset_path(overlay_id: &str) -> String {
    format!("/{}", overlay_id.trim_start_matches('/'))
}

/// All overlays in gallery order.
pub const OVERLAY_CATALOG: &[OverlaySpec] = &[
    OverlaySpec {
        id: DEFAULT_OVERLAY,
        label: "Rainbow headband",
        initial_position: Point::new(240.0, 30.0),
        full_bleed: false,
    },
    OverlaySpec::sticker("asset02.png", "Struggle headband"),
    OverlaySpec::sticker("asset03.png", "Comrade headband"),
    OverlaySpec::sticker("asset04.png", "Equality headband"),
    OverlaySpec::sticker("asset05.png", "Rainbow hand flag"),
    OverlaySpec::sticker("asset06.png", "Trans hand flag"),
    OverlaySpec::sticker("asset07.png", "Guardian button"),
    OverlaySpec::full_bleed("asset08.png", "Rainbow sparkles"),
    OverlaySpec::full_bleed("asset09.png", "Queers defending democracy"),
    OverlaySpec::full_bleed("asset10.png", "Democracy defending queers"),
];

/// All catalog entries.
#[must_use]
pub fn catalog() -> &'static [OverlaySpec] {
    OVERLAY_CATALOG
}

/// Find a known catalog entry.
#[must_use]
pub fn find(id: &str) -> Option<&'static OverlaySpec> {
    let trimmed = id.trim().trim_start_matches('/');
    OVERLAY_CATALOG.iter().find(|entry| entry.id == trimmed)
}

/// Resolve placement for any overlay id.
///
/// Unknown ids are treated as movable stickers at [`DEFAULT_POSITION`].
#[must_use]
pub fn lookup(id: &str) -> Placement {
    find(id).map_or(
        Placement {
            initial_position: DEFAULT_POSITION,
            full_bleed: false,
        },
        |entry| Placement {
            initial_position: entry.initial_position,
            full_bleed: entry.full_bleed,
        },
    )
}

/// Placement data returned by [`lookup`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Initial top-left in canvas pixels.
    pub initial_position: Point,
    /// Whether the overlay covers the full canvas.
    pub full_bleed: bool,
}
