//! The `IdentityProvider` trait.

use std::future::Future;

use tokio::sync::watch;

use crate::identity::{Identity, UserCredential};

/// Abstraction over an authentication backend.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run the provider's interactive sign-in flow.
  ///
  /// Fails when the user closes or denies the flow.
  fn sign_in_with_popup(
    &self,
  ) -> impl Future<Output = Result<UserCredential, Self::Error>> + Send + '_;

  /// End the provider session.
  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Auth state as reported by the provider. The receiver's current value is
  /// the provider's current user.
  fn auth_state(&self) -> watch::Receiver<Option<Identity>>;
}
