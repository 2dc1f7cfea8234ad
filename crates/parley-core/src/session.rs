//! The session holder — the one owner of "who is signed in right now".
//!
//! Readers get an immutable snapshot ([`SessionHolder::current`]) or a change
//! stream ([`SessionHolder::changes`]). The only way to mutate the session is
//! [`SessionHolder::set`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::{identity::Identity, live::IdentityChanges};

/// Cheap to clone; all clones share the same state.
#[derive(Clone, Debug)]
pub struct SessionHolder {
  tx: Arc<watch::Sender<Option<Identity>>>,
}

impl SessionHolder {
  pub fn new(initial: Option<Identity>) -> Self {
    let (tx, _) = watch::channel(initial);
    Self { tx: Arc::new(tx) }
  }

  /// The last known identity, if any.
  pub fn current(&self) -> Option<Identity> { self.tx.borrow().clone() }

  /// A fresh change stream. Each call starts over from the current value.
  pub fn changes(&self) -> IdentityChanges { IdentityChanges::new(self.tx.subscribe()) }

  /// Replace the held identity. Subscribers are notified only when the
  /// value actually changes.
  ///
  /// Returns `true` if the identity changed.
  pub fn set(&self, identity: Option<Identity>) -> bool {
    self.tx.send_if_modified(|held| {
      if *held == identity {
        false
      } else {
        *held = identity;
        true
      }
    })
  }
}

impl Default for SessionHolder {
  fn default() -> Self { Self::new(None) }
}
