//! Composition of the backend clients a [`crate::ChatService`] uses.

use std::sync::Arc;

use parley_core::{
  auth::IdentityProvider,
  messaging::PushMessaging,
  navigation::Navigator,
  storage::ObjectStorage,
  store::{DocumentStore, MessageStore},
};

/// Names the concrete client type for every boundary.
///
/// Implemented by a zero-sized marker type in the application's composition
/// root.
pub trait Backend: Send + Sync + 'static {
  type Auth: IdentityProvider + 'static;
  type Store: MessageStore + DocumentStore + 'static;
  type Storage: ObjectStorage + 'static;
  type Messaging: PushMessaging + 'static;
  type Navigator: Navigator + 'static;
}

/// The client instances handed to [`crate::ChatService::new`].
pub struct Providers<B: Backend> {
  pub auth:      Arc<B::Auth>,
  pub store:     Arc<B::Store>,
  pub storage:   Arc<B::Storage>,
  pub messaging: Arc<B::Messaging>,
  pub navigator: Arc<B::Navigator>,
}

impl<B: Backend> Clone for Providers<B> {
  fn clone(&self) -> Self {
    Self {
      auth:      Arc::clone(&self.auth),
      store:     Arc::clone(&self.store),
      storage:   Arc::clone(&self.storage),
      messaging: Arc::clone(&self.messaging),
      navigator: Arc::clone(&self.navigator),
    }
  }
}
