//! Overlay assets served from a local directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sticker_renderer::{AssetFetcher, RenderError, RenderResult};

/// Resolves `/<asset>` paths under a root directory.
#[derive(Debug, Clone)]
pub struct FsAssetFetcher {
    root: PathBuf,
}

impl FsAssetFetcher {
    /// Serve assets from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an asset path onto the filesystem, refusing to leave the root.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Resource`] for empty paths or paths with
    /// parent or absolute components.
    pub fn resolve(&self, path: &str) -> RenderResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if relative.as_os_str().is_empty() || escapes {
            return Err(RenderError::Resource(format!("invalid asset path: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetFetcher for FsAssetFetcher {
    async fn fetch(&self, path: &str) -> RenderResult<Vec<u8>> {
        let file = self.resolve(path)?;
        tracing::debug!(path = %file.display(), "Reading overlay asset");
        tokio::fs::read(&file)
            .await
            .map_err(|e| RenderError::Resource(format!("{}: {e}", file.display())))
    }
}
