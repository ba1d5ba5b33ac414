//! Storage for the summary artifact.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::errors::ArtifactError;
use crate::ports::ArtifactStore;

/// Keeps the artifact on disk and swaps it in with a rename.
pub struct FileArtifactStore {
    path: PathBuf,
}

impl FileArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifact".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn replace(&self, bytes: Vec<u8>) -> Result<(), ArtifactError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::debug!(path = %self.path.display(), size = bytes.len(), "Summary artifact replaced");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<u8>>, ArtifactError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local artifact slot.
#[derive(Default)]
pub struct MemoryArtifactStore {
    current: RwLock<Option<Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn replace(&self, bytes: Vec<u8>) -> Result<(), ArtifactError> {
        *self.current.write().await = Some(bytes);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<u8>>, ArtifactError> {
        Ok(self.current.read().await.clone())
    }
}
