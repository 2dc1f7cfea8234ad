//! Chat orchestration for Parley.
//!
//! [`ChatService`] composes the session holder, the message store and the
//! other backend clients into sign-in, sign-out, send and observe operations.
//! Which concrete clients it talks to is decided once, by a [`Backend`].
//!
//! ```rust,ignore
//! let chat = ChatService::new(providers);
//! chat.sign_in().await?;
//! chat.send_text("hello").await?;
//! let mut recent = chat.observe_recent().await?;
//! while let Some(messages) = recent.next().await { /* render */ }
//! ```

pub mod backend;
pub mod error;
pub mod service;

pub use backend::{Backend, Providers};
pub use error::{Error, Result};
pub use service::{ChatService, SendOutcome, SkipReason};

#[cfg(test)]
mod tests;
