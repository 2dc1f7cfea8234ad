//! Core types and trait definitions for the Parley chat client.
//!
//! Every external collaborator (identity provider, message store, object
//! storage, push messaging, navigation) is a trait here. This crate holds no
//! database or network code; backends live in other crates.

pub mod auth;
pub mod document;
pub mod error;
pub mod identity;
pub mod live;
pub mod message;
pub mod messaging;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
