//! Error type for `parley-local`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] parley_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("message not found: {0}")]
  MessageNotFound(uuid::Uuid),

  #[error("object not found: {0}")]
  ObjectNotFound(String),

  /// The `messages` collection is only written through the message API.
  #[error("collection {0:?} is read-only through the document API")]
  ReadOnlyCollection(String),

  #[error("sign-in cancelled: no local profile configured")]
  SignInCancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
