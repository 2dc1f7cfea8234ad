//! Error types for `parley-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid document path: {0:?}")]
  InvalidDocumentPath(String),

  #[error("invalid collection path: {0:?}")]
  InvalidCollectionPath(String),

  #[error("invalid object path: {0:?}")]
  InvalidObjectPath(String),

  #[error("document data must be a JSON object")]
  NotAnObject,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
