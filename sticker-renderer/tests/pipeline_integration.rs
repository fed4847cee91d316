//! Integration tests for the redraw pipeline (sticker-renderer).
//!
//! Covers generation ordering, failure handling and source handle cleanup.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use sticker_core::{EditorConfig, EditorState, ManualScheduler, NoScrollLock};
use sticker_renderer::{
    load_assets, AssetFetcher, MemoryHandleRegistry, Preview, RedrawStatus, RenderError,
    RenderResult, SourceImage,
};

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Serves overlay bytes from memory and counts fetches.
#[derive(Default)]
struct MapFetcher {
    assets: HashMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
}

impl MapFetcher {
    fn with_catalog() -> Self {
        let assets = (1..=10)
            .map(|i| (format!("/asset{i:02}.png"), png_bytes(8, 8, [255, 0, 0, 255])))
            .collect();
        Self {
            assets,
            fetched: Mutex::new(Vec::new()),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetFetcher for MapFetcher {
    async fn fetch(&self, path: &str) -> RenderResult<Vec<u8>> {
        self.fetched.lock().unwrap().push(path.to_string());
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| RenderError::Resource(format!("{path} not found")))
    }
}

fn editor() -> EditorState {
    EditorState::new(
        EditorConfig::default(),
        Box::new(ManualScheduler::new()),
        Box::new(NoScrollLock),
    )
    .expect("editor")
}

fn preview_with_photo() -> (Preview, MemoryHandleRegistry) {
    let registry = MemoryHandleRegistry::new();
    let mut preview = Preview::new(EditorConfig::default(), Box::new(registry.clone()));
    preview.set_source(SourceImage::new(png_bytes(64, 48, [0, 255, 0, 255])));
    (preview, registry)
}

// ==========================================================================
// Basic redraws
// ==========================================================================

#[tokio::test]
async fn test_no_photo_renders_nothing() {
    let mut preview = Preview::new(EditorConfig::default(), Box::new(MemoryHandleRegistry::new()));
    let status = preview.redraw(&MapFetcher::with_catalog(), &editor()).await;
    assert_eq!(status, RedrawStatus::NothingToRender);
    assert!(preview.artifact().is_none());
}

#[tokio::test]
async fn test_redraw_publishes_current_artifact() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let mut editor = editor();

    let status = preview.redraw(&fetcher, &editor).await;
    assert!(matches!(status, RedrawStatus::Applied(_)));
    let artifact = preview.current_artifact(&editor).expect("current artifact");
    assert!(artifact.data_uri.starts_with("data:image/png;base64,"));
    assert_eq!(artifact.overlay_id, "asset01.png");

    // Any mutation makes the artifact out of date until the next redraw.
    editor.rotate_clockwise();
    assert!(preview.current_artifact(&editor).is_none());
    preview.redraw(&fetcher, &editor).await;
    assert!(preview.current_artifact(&editor).is_some());
}

#[tokio::test]
async fn test_overlays_are_fetched_once() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let mut editor = editor();

    preview.redraw(&fetcher, &editor).await;
    editor.set_scale(1.0);
    preview.redraw(&fetcher, &editor).await;
    assert_eq!(fetcher.fetch_count(), 1);

    editor.select_overlay("asset09.png");
    preview.redraw(&fetcher, &editor).await;
    assert_eq!(fetcher.fetch_count(), 2);
    assert_eq!(preview.overlay_cache().len(), 2);

    preview.teardown();
    assert!(preview.overlay_cache().is_empty());
}

// ==========================================================================
// Ordering
// ==========================================================================

#[tokio::test]
async fn test_older_completion_is_discarded() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let mut editor = editor();

    let first = preview.begin_redraw(&editor).expect("request");
    editor.select_overlay("asset05.png");
    let second = preview.begin_redraw(&editor).expect("request");

    let second_loaded = load_assets(&fetcher, &second).await;
    let first_loaded = load_assets(&fetcher, &first).await;

    let status = preview.finish_redraw(second.generation, second_loaded, &editor);
    assert_eq!(status, RedrawStatus::Applied(second.generation));
    let status = preview.finish_redraw(first.generation, first_loaded, &editor);
    assert_eq!(status, RedrawStatus::Stale);

    let artifact = preview.artifact().expect("artifact");
    assert_eq!(artifact.overlay_id, "asset05.png");
    assert_eq!(artifact.generation, second.generation);
}

#[tokio::test]
async fn test_completion_uses_state_at_completion_time() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let mut editor = editor();

    let request = preview.begin_redraw(&editor).expect("request");
    let loaded = load_assets(&fetcher, &request).await;
    editor.rotate_clockwise();
    editor.set_scale(2.5);

    preview.finish_redraw(request.generation, loaded, &editor);
    let artifact = preview.artifact().expect("artifact");
    assert_eq!(artifact.revision, editor.composition().revision());
}

#[tokio::test]
async fn test_replacing_photo_invalidates_pending_redraw() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let editor = editor();

    let request = preview.begin_redraw(&editor).expect("request");
    preview.set_source(SourceImage::new(png_bytes(64, 48, [0, 0, 255, 255])));
    let loaded = load_assets(&fetcher, &request).await;

    assert_eq!(
        preview.finish_redraw(request.generation, loaded, &editor),
        RedrawStatus::Stale
    );
    assert!(preview.current_artifact(&editor).is_none());

    preview.redraw(&fetcher, &editor).await;
    let artifact = preview.current_artifact(&editor).expect("current artifact");
    let decoded = image::load_from_memory(&artifact.png)
        .expect("decode artifact")
        .to_rgba8();
    // Bottom-right corner lies outside the sticker.
    assert_eq!(decoded.get_pixel(700, 700).0, [0, 0, 255, 255]);
}

// ==========================================================================
// Failures and cleanup
// ==========================================================================

#[tokio::test]
async fn test_undecodable_photo_clears_artifact() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let editor = editor();

    preview.redraw(&fetcher, &editor).await;
    assert!(preview.artifact().is_some());

    preview.set_source(SourceImage::new(b"not an image".to_vec()));
    let status = preview.redraw(&fetcher, &editor).await;
    assert!(matches!(status, RedrawStatus::Failed(_)));
    assert!(preview.artifact().is_none());
}

#[tokio::test]
async fn test_missing_overlay_fails_without_artifact() {
    let (mut preview, _registry) = preview_with_photo();
    let fetcher = MapFetcher::default();
    let status = preview.redraw(&fetcher, &editor()).await;
    assert!(matches!(status, RedrawStatus::Failed(reason) if reason.contains("not found")));
    assert!(preview.artifact().is_none());
}

#[tokio::test]
async fn test_teardown_mid_decode() {
    let (mut preview, registry) = preview_with_photo();
    let fetcher = MapFetcher::with_catalog();
    let editor = editor();

    let request = preview.begin_redraw(&editor).expect("request");
    preview.teardown();
    let loaded = load_assets(&fetcher, &request).await;

    assert_eq!(
        preview.finish_redraw(request.generation, loaded, &editor),
        RedrawStatus::Stale
    );
    assert!(preview.artifact().is_none());
    assert!(registry.outstanding().is_empty());
    assert_eq!(registry.revoked().len(), 1);
}

#[test]
fn test_each_photo_handle_is_revoked_exactly_once() {
    let registry = MemoryHandleRegistry::new();
    {
        let mut preview = Preview::new(EditorConfig::default(), Box::new(registry.clone()));
        let first = preview.set_source(SourceImage::new(vec![1]));
        let second = preview.set_source(SourceImage::new(vec![2]));
        let third = preview.set_source(SourceImage::new(vec![3]));
        assert_eq!(registry.revoked(), vec![first, second]);
        assert_eq!(registry.outstanding(), vec![third]);
        preview.teardown();
        preview.teardown();
    }
    assert_eq!(registry.revoked().len(), 3);
    assert!(registry.outstanding().is_empty());
}
