//! Filesystem-backed blob store for offline use and tests.

use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{normalize_object_key, BlobStore};

const FILE_URL_PREFIX: &str = "file://";

/// Stores objects as files below a root directory and hands out `file://` URLs.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Use `root` as the storage directory. It is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(normalize_object_key(key)?))
    }

    fn url_prefix(&self) -> String {
        format!("{FILE_URL_PREFIX}{}/", self.root.display())
    }
}

impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: Option<&str>) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "stored blob");
        Ok(format!("{FILE_URL_PREFIX}{}", path.display()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.url_prefix())
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
    }
}
