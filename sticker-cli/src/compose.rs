//! The `compose` and `catalog` commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use sticker_core::catalog::find;
use sticker_core::{
    catalog, AnonymousId, CoreResult, EditorState, LifecycleEvent, LifecycleRecorder,
    LifecycleSink, LifecycleStage, ManualScheduler, NoScrollLock, Point,
};
use sticker_renderer::{Exporter, MemoryHandleRegistry, Preview, RedrawStatus, SourceImage};

use crate::{AppConfig, ComposeArgs, FileStorage, FsAssetFetcher};

/// Lifecycle sink that writes records to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LifecycleSink for TracingSink {
    fn record(&self, event: &LifecycleEvent) -> CoreResult<()> {
        let line = serde_json::to_string(event)?;
        tracing::debug!(target: "sticker::lifecycle", "{line}");
        Ok(())
    }
}

/// What `compose` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeReport {
    /// File the PNG was written to.
    pub output: PathBuf,
    /// Overlay drawn.
    pub overlay: String,
    /// Composition revision drawn.
    pub revision: u64,
    /// Encoded size in bytes.
    pub bytes: usize,
    /// Data URI, when requested.
    pub data_uri: Option<String>,
    /// Anonymous client id the run was recorded under.
    pub anonymous_id: AnonymousId,
}

/// Compose a photo with an overlay and write the PNG.
///
/// # Errors
///
/// Returns an error if the photo or overlay cannot be read or decoded, or
/// the output cannot be written.
pub async fn run_compose(args: &ComposeArgs, config: &AppConfig) -> anyhow::Result<ComposeReport> {
    let photo = tokio::fs::read(&args.photo)
        .await
        .with_context(|| format!("reading photo {}", args.photo.display()))?;

    let anonymous_id = match &args.state_file {
        Some(path) => AnonymousId::load_or_create(&FileStorage::new(path))?,
        None => AnonymousId::new(),
    };
    let recorder = LifecycleRecorder::new(
        Arc::new(TracingSink),
        anonymous_id,
        concat!("sticker-cli/", env!("CARGO_PKG_VERSION")),
    );

    let mut editor = EditorState::new(
        config.editor.clone(),
        Box::new(ManualScheduler::new()),
        Box::new(NoScrollLock),
    )?
    .with_recorder(recorder.clone());
    editor.record(LifecycleStage::Started);

    if find(&args.overlay).is_none() {
        tracing::warn!(overlay = %args.overlay, "Overlay not in catalog, using sticker defaults");
    }
    editor.select_overlay(&args.overlay);
    apply_adjustments(&mut editor, args);

    let mut preview = Preview::new(config.editor.clone(), Box::new(MemoryHandleRegistry::new()));
    preview.set_source(SourceImage::new(photo));

    let fetcher = FsAssetFetcher::new(&args.assets_dir);
    match preview.redraw(&fetcher, &editor).await {
        RedrawStatus::Applied(generation) => {
            tracing::debug!(generation = generation.value(), "Redraw applied");
        }
        RedrawStatus::Failed(reason) => bail!("rendering failed: {reason}"),
        status @ (RedrawStatus::Stale | RedrawStatus::NothingToRender) => {
            bail!("nothing was rendered ({status:?})")
        }
    }

    let artifact = preview
        .current_artifact(&editor)
        .context("rendered image is out of date")?;
    let exporter = Exporter::new(config.share.clone()).with_recorder(recorder);
    let link = exporter
        .download(Some(artifact))
        .context("no image to download")?;

    let output = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&link.filename));
    tokio::fs::write(&output, &artifact.png)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    let report = ComposeReport {
        output,
        overlay: editor.overlay_id().to_string(),
        revision: artifact.revision,
        bytes: artifact.png.len(),
        data_uri: args.data_uri.then_some(link.href),
        anonymous_id,
    };

    editor.record(LifecycleStage::Final);
    preview.teardown();
    editor.teardown();
    Ok(report)
}

fn apply_adjustments(editor: &mut EditorState, args: &ComposeArgs) {
    if let Some(scale) = args.scale {
        editor.set_scale(scale);
    }
    editor.set_rotation(args.rotation);
    if args.x.is_some() || args.y.is_some() {
        let current = editor.composition().overlay_position();
        editor.set_overlay_position(Point::new(
            args.x.unwrap_or(current.x),
            args.y.unwrap_or(current.y),
        ));
    }
    if let Some(bg_scale) = args.bg_scale {
        editor.set_background_scale(bg_scale);
    }
    editor.set_background_offset(Point::new(args.bg_offset_x, args.bg_offset_y));
}

/// Catalog as printable table rows.
#[must_use]
pub fn catalog_rows() -> Vec<String> {
    catalog()
        .iter()
        .map(|entry| {
            let kind = if entry.full_bleed { "full-bleed" } else { "sticker" };
            format!(
                "{:<12} {:<10} ({:>3}, {:>3})  {}",
                entry.id, kind, entry.initial_position.x, entry.initial_position.y, entry.label
            )
        })
        .collect()
}
