//! Push-based views over a value that changes over time.
//!
//! A [`Live`] wraps a `tokio::sync::watch` receiver. The first call to
//! [`Live::next`] yields the current value immediately; later calls wait for
//! the next change. Intermediate values may be coalesced: a slow reader only
//! ever sees the most recent state.

use tokio::sync::watch;

use crate::{identity::Identity, message::ChatMessage};

/// A continuously updated value.
#[derive(Debug)]
pub struct Live<T> {
  rx:     watch::Receiver<T>,
  primed: bool,
}

/// The live ordered result set of a query.
pub type LiveView<T> = Live<Vec<T>>;

/// The most recent chat messages, newest first.
pub type RecentMessages = LiveView<ChatMessage>;

/// Identity-or-none as reported by the session.
pub type IdentityChanges = Live<Option<Identity>>;

impl<T: Clone> Live<T> {
  pub fn new(rx: watch::Receiver<T>) -> Self { Self { rx, primed: false } }

  /// The latest value without waiting.
  pub fn snapshot(&self) -> T { self.rx.borrow().clone() }

  /// Yield the current value on first call, then each subsequent change.
  ///
  /// Returns `None` once the producer has gone away.
  pub async fn next(&mut self) -> Option<T> {
    if !self.primed {
      self.primed = true;
      return Some(self.rx.borrow_and_update().clone());
    }
    self.rx.changed().await.ok()?;
    Some(self.rx.borrow_and_update().clone())
  }

  /// Stop receiving updates. The producer notices on its next send.
  pub fn cancel(self) {}
}
