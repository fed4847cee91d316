//! The user's source photo and its temporary display handle.
//!
//! Viewing a photo issues a handle (an object-URL in the browser). Handles
//! are released exactly once: when the photo is replaced, when the slot is
//! cleared and when the slot is dropped.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::image::ImageFormat;

/// Raw bytes of the user's photo.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
    format: ImageFormat,
}

impl SourceImage {
    /// Wrap photo bytes, sniffing the format.
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let format = ImageFormat::from_magic_bytes(&bytes);
        Self { bytes, format }
    }

    /// Photo bytes.
    #[must_use]
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Sniffed format.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

/// Opaque handle under which a source photo is viewable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceHandle(
    /// Handle URL, e.g. `blob:...`.
    pub String,
);

/// Issues and revokes source handles.
pub trait HandleRegistry {
    /// Issue a handle for the photo.
    fn create(&mut self, image: &SourceImage) -> SourceHandle;

    /// Revoke a handle issued by [`HandleRegistry::create`].
    fn revoke(&mut self, handle: SourceHandle);
}

#[derive(Debug, Default)]
struct IssuedHandles {
    next: u64,
    live: Vec<SourceHandle>,
    revoked: Vec<SourceHandle>,
}

/// In-memory registry; clones share state so tests can observe revocations.
#[derive(Debug, Default, Clone)]
pub struct MemoryHandleRegistry {
    inner: Arc<Mutex<IssuedHandles>>,
}

impl MemoryHandleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles issued and not yet revoked.
    #[must_use]
    pub fn outstanding(&self) -> Vec<SourceHandle> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .clone()
    }

    /// Every revoked handle, in revocation order.
    #[must_use]
    pub fn revoked(&self) -> Vec<SourceHandle> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .revoked
            .clone()
    }
}

impl HandleRegistry for MemoryHandleRegistry {
    fn create(&mut self, image: &SourceImage) -> SourceHandle {
        let mut issued = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        issued.next += 1;
        let handle = SourceHandle(format!("blob:sticker/{}", issued.next));
        tracing::trace!(handle = %handle.0, format = ?image.format(), "Source handle issued");
        issued.live.push(handle.clone());
        handle
    }

    fn revoke(&mut self, handle: SourceHandle) {
        let mut issued = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        issued.live.retain(|live| *live != handle);
        issued.revoked.push(handle);
    }
}

/// Holds the active photo and the handle issued for it.
pub struct SourceSlot {
    registry: Box<dyn HandleRegistry>,
    current: Option<(SourceImage, SourceHandle)>,
}

impl fmt::Debug for SourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSlot")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl SourceSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new(registry: Box<dyn HandleRegistry>) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// Active photo, if any.
    #[must_use]
    pub fn image(&self) -> Option<&SourceImage> {
        self.current.as_ref().map(|(image, _)| image)
    }

    /// Make `image` the active photo, revoking the previous handle.
    pub fn replace(&mut self, image: SourceImage) -> &SourceHandle {
        self.clear();
        let handle = self.registry.create(&image);
        &self.current.insert((image, handle)).1
    }

    /// Drop the active photo and revoke its handle. Safe to call repeatedly.
    pub fn clear(&mut self) {
        if let Some((_, handle)) = self.current.take() {
            tracing::debug!(handle = %handle.0, "Source handle revoked");
            self.registry.revoke(handle);
        }
    }
}

impl Drop for SourceSlot {
    fn drop(&mut self) {
        self.clear();
    }
}
