//! Lifecycle hooks for usage records.
//!
//! The editor reports a handful of milestones (`started`, `selected`,
//! `shared`, `downloaded`, `final`) keyed by an anonymous id kept in the
//! client's local storage. Where the records go is up to the host's
//! [`LifecycleSink`]; failures are logged and never reach the editor.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;

/// Storage key for the anonymous client id.
pub const ANONYMOUS_ID_KEY: &str = "anonymous_id";

/// Current time in milliseconds since epoch.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Timestamps won't exceed u64 for billions of years
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Milestones in a visitor's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStage {
    /// Photo chosen and editing started.
    Started,
    /// An overlay was selected.
    Selected,
    /// The image was shared.
    Shared,
    /// The image was downloaded.
    Downloaded,
    /// The visitor finished the flow.
    Final,
}

impl LifecycleStage {
    /// Wire name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Selected => "selected",
            Self::Shared => "shared",
            Self::Downloaded => "downloaded",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anonymous, client-generated visitor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnonymousId(Uuid);

impl AnonymousId {
    /// Generate a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Read the id from storage, creating and storing one when absent or
    /// unparsable.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage rejects the write.
    pub fn load_or_create(storage: &dyn ClientStorage) -> CoreResult<Self> {
        if let Some(existing) = storage
            .get(ANONYMOUS_ID_KEY)
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        {
            return Ok(Self(existing));
        }
        let id = Self::new();
        storage.set(ANONYMOUS_ID_KEY, &id.to_string())?;
        tracing::debug!(%id, "Created anonymous client id");
        Ok(id)
    }
}

impl Default for AnonymousId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnonymousId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Browser-local persistent key/value storage.
pub trait ClientStorage {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage is unavailable or full.
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
}

/// In-memory [`ClientStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A single usage record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Milestone reached.
    pub stage: LifecycleStage,
    /// Overlay selected at the time.
    pub asset: String,
    /// Visitor id.
    pub anonymous_id: AnonymousId,
    /// Client user agent string.
    pub user_agent: String,
    /// Milliseconds since epoch.
    pub timestamp_ms: u64,
}

/// Receives usage records (the external record-insert call).
pub trait LifecycleSink: Send + Sync {
    /// Store one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be stored.
    fn record(&self, event: &LifecycleEvent) -> CoreResult<()>;
}

/// Sink that keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<LifecycleEvent>>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events in order.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stages recorded so far, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<LifecycleStage> {
        self.events().into_iter().map(|e| e.stage).collect()
    }
}

impl LifecycleSink for MemorySink {
    fn record(&self, event: &LifecycleEvent) -> CoreResult<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Stamps records with the visitor id and forwards them to a sink.
#[derive(Clone)]
pub struct LifecycleRecorder {
    sink: Arc<dyn LifecycleSink>,
    anonymous_id: AnonymousId,
    user_agent: String,
}

impl fmt::Debug for LifecycleRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleRecorder")
            .field("anonymous_id", &self.anonymous_id)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl LifecycleRecorder {
    /// Create a recorder.
    #[must_use]
    pub fn new(
        sink: Arc<dyn LifecycleSink>,
        anonymous_id: AnonymousId,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            anonymous_id,
            user_agent: user_agent.into(),
        }
    }

    /// Visitor id attached to every record.
    #[must_use]
    pub fn anonymous_id(&self) -> AnonymousId {
        self.anonymous_id
    }

    /// Report a milestone. Sink failures are logged and swallowed.
    ///
    /// Returns `true` if the sink accepted the record.
    pub fn record(&self, stage: LifecycleStage, asset: &str) -> bool {
        let event = LifecycleEvent {
            stage,
            asset: asset.to_string(),
            anonymous_id: self.anonymous_id,
            user_agent: self.user_agent.clone(),
            timestamp_ms: current_timestamp_ms(),
        };
        match self.sink.record(&event) {
            Ok(()) => {
                tracing::info!(%stage, asset, "Lifecycle recorded");
                true
            }
            Err(e) => {
                tracing::warn!(%stage, asset, "Failed to record lifecycle event: {e}");
                false
            }
        }
    }
}
