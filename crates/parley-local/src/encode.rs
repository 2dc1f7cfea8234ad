//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Message timestamps are integer microseconds so ordering is numeric.
//! Document timestamps are RFC 3339 strings. UUIDs are hyphenated lowercase.

use chrono::{DateTime, Utc};
use parley_core::{
  document::{Document, Fields, fields_from_value},
  message::ChatMessage,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_micros(micros: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros)
    .ok_or_else(|| Error::DateParse(format!("timestamp out of range: {micros}")))
}

/// The next server timestamp: now, or one microsecond past the newest
/// stored timestamp if the clock has not moved past it.
pub fn next_timestamp_micros(now: DateTime<Utc>, newest: Option<i64>) -> i64 {
  let now = now.timestamp_micros();
  match newest {
    Some(newest) if newest >= now => newest + 1,
    _ => now,
  }
}

// ─── Fields ───────────────────────────────────────────────────────────────────

pub fn encode_fields(fields: &Fields) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<Fields> {
  Ok(fields_from_value(serde_json::from_str(s)?)?)
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// Raw `messages` row before decoding.
pub struct RawMessage {
  pub message_id:      String,
  pub name:            Option<String>,
  pub profile_pic_url: Option<String>,
  pub uid:             Option<String>,
  pub timestamp:       i64,
  pub text:            Option<String>,
  pub image_url:       Option<String>,
  pub storage_uri:     Option<String>,
}

/// Column list matching [`RawMessage::from_row`].
pub const MESSAGE_COLUMNS: &str =
  "message_id, name, profile_pic_url, uid, timestamp, text, image_url, storage_uri";

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:      row.get(0)?,
      name:            row.get(1)?,
      profile_pic_url: row.get(2)?,
      uid:             row.get(3)?,
      timestamp:       row.get(4)?,
      text:            row.get(5)?,
      image_url:       row.get(6)?,
      storage_uri:     row.get(7)?,
    })
  }

  pub fn into_message(self) -> Result<ChatMessage> {
    Ok(ChatMessage {
      id:              decode_uuid(&self.message_id)?,
      name:            self.name,
      profile_pic_url: self.profile_pic_url,
      uid:             self.uid,
      timestamp:       decode_micros(self.timestamp)?,
      text:            self.text,
      image_url:       self.image_url,
      storage_uri:     self.storage_uri,
    })
  }
}

/// Raw `documents` row before decoding.
pub struct RawDocument {
  pub path:       String,
  pub data:       String,
  pub updated_at: String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      path:       row.get(0)?,
      data:       row.get(1)?,
      updated_at: row.get(2)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      data:       decode_fields(&self.data)?,
      updated_at: decode_dt(&self.updated_at)?,
      path:       self.path,
    })
  }
}

/// Present a chat message through the generic document API.
pub fn message_document(message: &ChatMessage) -> Result<Document> {
  let data = fields_from_value(serde_json::to_value(message)?)?;
  Ok(Document {
    path: message.reference().path,
    data,
    updated_at: message.timestamp,
  })
}
