//! Error type for `parley-chat`.
//!
//! Backend errors are boxed so the service error does not depend on which
//! backend is plugged in.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The interactive sign-in was cancelled, denied or failed.
  #[error("sign-in failed: {0}")]
  SignIn(#[source] BoxError),

  #[error("sign-out failed: {0}")]
  SignOut(#[source] BoxError),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("storage error: {0}")]
  Storage(#[source] BoxError),

  #[error("messaging error: {0}")]
  Messaging(#[source] BoxError),

  #[error("invalid input: {0}")]
  Core(#[from] parley_core::Error),
}

impl Error {
  pub(crate) fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn storage<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Storage(Box::new(e))
  }

  pub(crate) fn messaging<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Messaging(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
