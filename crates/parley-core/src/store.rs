//! Storage traits for chat messages and generic documents.
//!
//! Both are implemented by storage backends (e.g. `parley-local`). The chat
//! service depends on these abstractions, never on a concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  document::{CollectionPath, DocPath, Document, Fields},
  live::RecentMessages,
  message::{ChatMessage, MessageRef, NewMessage},
};

// ─── Messages ────────────────────────────────────────────────────────────────

/// The shared, append-only message collection.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append a message. The store assigns `id` and a timestamp strictly
  /// greater than every timestamp it assigned before.
  fn append_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<MessageRef, Self::Error>> + Send + '_;

  /// Replace the image of an existing message once its upload finished.
  fn patch_image(
    &self,
    id: Uuid,
    image_url: String,
    storage_uri: String,
  ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + '_;

  /// Retrieve a message by id. Returns `None` if not found.
  fn get_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ChatMessage>, Self::Error>> + Send + '_;

  /// Live view of the `limit` most recent messages, newest first.
  ///
  /// The view's first value is the result at subscription time; it updates
  /// whenever the collection changes until the view is cancelled or dropped.
  fn watch_recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<RecentMessages, Self::Error>> + Send + '_;
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Generic path-addressed document access.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a document. Returns `None` if not found.
  fn get_document<'a>(
    &'a self,
    path: &'a DocPath,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + 'a;

  /// All documents directly inside `path`, ordered by id.
  fn list_collection<'a>(
    &'a self,
    path: &'a CollectionPath,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;

  /// Merge `data` into the document at `path`, creating it if absent.
  fn merge_document<'a>(
    &'a self,
    path: &'a DocPath,
    data: Fields,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + 'a;

  /// Delete a document. Returns `true` if one was removed.
  fn delete_document<'a>(
    &'a self,
    path: &'a DocPath,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
