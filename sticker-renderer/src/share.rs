//! Export and share adapter.
//!
//! Turns the rendered artifact into a download link or hands it to a native
//! share capability. Only one share may be in flight at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sticker_core::{LifecycleRecorder, LifecycleStage};
use thiserror::Error;

use crate::compositor::RenderedArtifact;
use crate::image::ImageFormat;

/// Text and file name attached to exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// File name offered for download and attached to shares.
    pub filename: String,
    /// Share sheet title.
    pub title: String,
    /// Share sheet text.
    pub text: String,
    /// Link included in shares.
    pub url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            filename: "rainbowaction-profile.png".to_string(),
            title: "Rainbow Action profile".to_string(),
            text: "I made a new profile picture.".to_string(),
            url: "https://profile.rainbowaction.kr/".to_string(),
        }
    }
}

/// An anchor-style download target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    /// `data:image/png;base64,...` URI.
    pub href: String,
    /// Suggested file name.
    pub filename: String,
}

/// Everything handed to a share target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    /// Attachment file name.
    pub file_name: String,
    /// Attachment MIME type.
    pub mime_type: &'static str,
    /// Attachment bytes.
    pub bytes: Vec<u8>,
    /// Share title.
    pub title: String,
    /// Share text.
    pub text: String,
    /// Share URL.
    pub url: String,
}

/// Why a share target did not share.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    /// The user dismissed the share sheet.
    #[error("share cancelled")]
    Cancelled,

    /// The platform rejected the share.
    #[error("share failed: {0}")]
    Failed(String),
}

/// A native share capability.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether the platform can share this payload (file shares included).
    fn is_supported(&self, payload: &SharePayload) -> bool;

    /// Present the share sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Cancelled`] on user dismissal, otherwise
    /// [`ShareError::Failed`].
    async fn share(&self, payload: SharePayload) -> Result<(), ShareError>;
}

/// Result of a share attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The payload was shared.
    Shared,
    /// The user cancelled; say nothing.
    Cancelled,
    /// Sharing is not available on this device.
    Unsupported,
    /// Sharing failed.
    Failed(String),
    /// Another share is still in flight.
    Busy,
    /// Nothing has been rendered yet.
    NoArtifact,
}

impl ShareOutcome {
    /// Notice to show the user, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::Unsupported => Some("Sharing is not supported on this device."),
            Self::Failed(_) => Some("Sharing failed this time. Please try again."),
            Self::NoArtifact => Some("The image is not ready yet."),
            Self::Shared | Self::Cancelled | Self::Busy => None,
        }
    }
}

/// Clears the in-flight flag when the share attempt ends.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Download and share entry point.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ShareConfig,
    in_flight: Arc<AtomicBool>,
    recorder: Option<LifecycleRecorder>,
}

impl Exporter {
    /// Create an exporter.
    #[must_use]
    pub fn new(config: ShareConfig) -> Self {
        Self {
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
            recorder: None,
        }
    }

    /// Report downloads and shares to a lifecycle recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: LifecycleRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Export configuration.
    #[must_use]
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Whether a share is in flight.
    #[must_use]
    pub fn is_sharing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Download link for the artifact. Records a `downloaded` milestone.
    #[must_use]
    pub fn download(&self, artifact: Option<&RenderedArtifact>) -> Option<DownloadLink> {
        let artifact = artifact?;
        self.record(LifecycleStage::Downloaded, &artifact.overlay_id);
        Some(download_link(artifact, &self.config))
    }

    /// Share the artifact through `target`.
    pub async fn share(
        &self,
        artifact: Option<&RenderedArtifact>,
        target: &dyn ShareTarget,
    ) -> ShareOutcome {
        let Some(artifact) = artifact else {
            return ShareOutcome::NoArtifact;
        };
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!("Share already in flight");
            return ShareOutcome::Busy;
        };

        let payload = share_payload(artifact, &self.config);
        if !target.is_supported(&payload) {
            tracing::info!("Share target does not support file shares");
            return ShareOutcome::Unsupported;
        }

        match target.share(payload).await {
            Ok(()) => {
                self.record(LifecycleStage::Shared, &artifact.overlay_id);
                ShareOutcome::Shared
            }
            Err(ShareError::Cancelled) => {
                tracing::debug!("Share cancelled by user");
                ShareOutcome::Cancelled
            }
            Err(ShareError::Failed(reason)) => {
                tracing::warn!("Share failed: {reason}");
                ShareOutcome::Failed(reason)
            }
        }
    }

    fn record(&self, stage: LifecycleStage, asset: &str) {
        if let Some(recorder) = &self.recorder {
            recorder.record(stage, asset);
        }
    }
}

/// Build a download link for an artifact.
#[must_use]
pub fn download_link(artifact: &RenderedArtifact, config: &ShareConfig) -> DownloadLink {
    DownloadLink {
        href: artifact.data_uri.clone(),
        filename: config.filename.clone(),
    }
}

/// Build the share payload for an artifact.
#[must_use]
pub fn share_payload(artifact: &RenderedArtifact, config: &ShareConfig) -> SharePayload {
    SharePayload {
        file_name: config.filename.clone(),
        mime_type: ImageFormat::Png.mime_type(),
        bytes: artifact.png.clone(),
        title: config.title.clone(),
        text: config.text.clone(),
        url: config.url.clone(),
    }
}
