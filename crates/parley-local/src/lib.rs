//! Local backend for the Parley chat client.
//!
//! Implements every boundary trait from `parley-core` without a hosted
//! service:
//!
//! - [`SqliteStore`]: messages and documents in one SQLite file, wrapped in
//!   [`tokio_rusqlite`] so database access never blocks the async runtime.
//! - [`FsObjectStorage`]: uploaded files in a directory tree.
//! - [`LocalAuth`]: signs in as a configured profile.
//! - [`LocalMessaging`]: notification permission and a device token.

mod encode;
mod schema;

pub mod auth;
pub mod error;
pub mod fs;
pub mod messaging;
pub mod store;

pub use auth::{LocalAuth, Profile};
pub use error::{Error, Result};
pub use fs::FsObjectStorage;
pub use messaging::LocalMessaging;
pub use store::SqliteStore;
