//! [`FsObjectStorage`] — uploaded files kept in a local directory tree.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use parley_core::storage::{ObjectStorage, StoredObject, normalize_object_path};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{Error, Result};

/// A bucket rooted at a directory. Object paths map to files below it.
#[derive(Debug, Clone)]
pub struct FsObjectStorage {
  root: PathBuf,
}

impl FsObjectStorage {
  /// Use (and create, if needed) `root` as the bucket directory.
  pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
    tokio::fs::create_dir_all(root.as_ref()).await?;
    let root = tokio::fs::canonicalize(root.as_ref()).await?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  fn resolve(&self, path: &str) -> Result<(String, PathBuf)> {
    let normalized = normalize_object_path(path)?;
    let file = self.root.join(&normalized);
    Ok((normalized, file))
  }

  fn url_for(file: &Path) -> String {
    format!("file://{}", file.display())
  }
}

/// SHA-256 hex digest of `data`.
pub fn content_hash(data: &[u8]) -> String { hex::encode(Sha256::digest(data)) }

impl ObjectStorage for FsObjectStorage {
  type Error = Error;

  async fn upload(
    &self,
    path:         &str,
    data:         Bytes,
    content_type: &str,
  ) -> Result<StoredObject> {
    let (normalized, file) = self.resolve(path)?;
    if let Some(parent) = file.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&file, &data).await?;

    let object = StoredObject {
      path:         normalized,
      content_type: content_type.to_owned(),
      size:         data.len() as u64,
      content_hash: content_hash(&data),
      download_url: Self::url_for(&file),
    };
    debug!(path = %object.path, size = object.size, "stored object");
    Ok(object)
  }

  async fn download_url(&self, path: &str) -> Result<String> {
    let (normalized, file) = self.resolve(path)?;
    if !tokio::fs::try_exists(&file).await? {
      return Err(Error::ObjectNotFound(normalized));
    }
    Ok(Self::url_for(&file))
  }
}
