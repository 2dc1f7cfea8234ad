//! Chat messages — the only records the chat client writes.
//!
//! A message is appended once and, apart from the image-upload patch that
//! swaps the loading placeholder for the real download URL, never changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

/// Name of the shared collection every client appends to.
pub const MESSAGES_COLLECTION: &str = "messages";

/// How many messages the live chat view keeps.
pub const RECENT_MESSAGE_LIMIT: usize = 12;

/// Placeholder image shown while an image message is still uploading.
pub const LOADING_IMAGE_URL: &str = "https://www.google.com/images/spin-32.gif?a";

// ─── ChatMessage ─────────────────────────────────────────────────────────────

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
  pub id:              Uuid,
  pub name:            Option<String>,
  pub profile_pic_url: Option<String>,
  pub uid:             Option<String>,
  /// Server-assigned; strictly increasing across all writes to a store.
  pub timestamp:       DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text:            Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image_url:       Option<String>,
  /// Object-storage path of an uploaded image.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub storage_uri:     Option<String>,
}

impl ChatMessage {
  pub fn reference(&self) -> MessageRef { MessageRef::new(self.id) }
}

// ─── NewMessage ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::MessageStore::append_message`].
/// `id` and `timestamp` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
  pub name:            Option<String>,
  pub profile_pic_url: Option<String>,
  pub uid:             Option<String>,
  pub text:            Option<String>,
  pub image_url:       Option<String>,
}

impl NewMessage {
  /// Stamp the sender's current profile onto a message.
  pub fn from_sender(
    sender: &Identity,
    text: Option<String>,
    image_url: Option<String>,
  ) -> Self {
    Self {
      name: sender.display_name.clone(),
      profile_pic_url: sender.photo_url.clone(),
      uid: Some(sender.uid.clone()),
      text,
      image_url,
    }
  }

  /// True when there is neither text nor an image to send.
  pub fn is_empty(&self) -> bool {
    self.text.is_none() && self.image_url.is_none()
  }
}

// ─── MessageRef ──────────────────────────────────────────────────────────────

/// Reference to a message returned from a successful append.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
  pub id:   Uuid,
  /// Document path, e.g. `messages/6f1c…`.
  pub path: String,
}

impl MessageRef {
  pub fn new(id: Uuid) -> Self {
    Self { id, path: format!("{MESSAGES_COLLECTION}/{id}") }
  }
}
