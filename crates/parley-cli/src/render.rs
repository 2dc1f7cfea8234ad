//! Plain-text rendering of chat messages.

use chrono::Local;
use parley_core::message::{ChatMessage, LOADING_IMAGE_URL};

pub fn render_message(message: &ChatMessage) -> String {
  let time = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
  let sender = message.name.as_deref().unwrap_or("anonymous");
  let body = match (&message.text, &message.image_url) {
    (Some(text), _) => text.clone(),
    (None, Some(url)) if url == LOADING_IMAGE_URL => "[image uploading…]".to_owned(),
    (None, Some(url)) => format!("[image] {url}"),
    (None, None) => String::new(),
  };
  format!("[{time}] {sender}: {body}")
}

/// Guess a MIME type from a file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
  let ext = file_name
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}
