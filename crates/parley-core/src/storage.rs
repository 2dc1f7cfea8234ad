//! Object storage for uploaded files.

use std::future::Future;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Metadata of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
  /// Path inside the bucket, e.g. `uid/message-id/cat.png`.
  pub path:         String,
  pub content_type: String,
  pub size:         u64,
  /// SHA-256 hex digest of the content.
  pub content_hash: String,
  pub download_url: String,
}

/// Abstraction over a file bucket.
pub trait ObjectStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `data` at `path`, replacing any existing object.
  fn upload<'a>(
    &'a self,
    path: &'a str,
    data: Bytes,
    content_type: &'a str,
  ) -> impl Future<Output = Result<StoredObject, Self::Error>> + Send + 'a;

  /// A URL from which the object at `path` can be fetched.
  fn download_url<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}

/// Check an object path and return its normalised form: relative, no empty,
/// `.` or `..` segments.
pub fn normalize_object_path(path: &str) -> Result<String> {
  let trimmed = path.trim_matches('/');
  let valid = !trimmed.is_empty()
    && trimmed
      .split('/')
      .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains('\\'));
  if valid {
    Ok(trimmed.to_owned())
  } else {
    Err(Error::InvalidObjectPath(path.to_owned()))
  }
}
