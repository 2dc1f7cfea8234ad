//! Path-addressed documents for the generic read/update/delete surface.
//!
//! Paths alternate collection and document segments:
//! `collection/doc[/collection/doc…]`. A document path therefore has an even
//! number of segments and a collection path an odd number.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

fn segments(path: &str) -> Option<Vec<&str>> {
  let trimmed = path.trim_matches('/');
  if trimmed.is_empty() {
    return None;
  }
  let parts: Vec<&str> = trimmed.split('/').collect();
  if parts.iter().any(|p| p.is_empty() || *p == "." || *p == "..") {
    return None;
  }
  Some(parts)
}

// ─── Paths ───────────────────────────────────────────────────────────────────

/// A validated collection path, e.g. `fcmTokens` or `rooms/abc/members`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
  pub fn parse(path: &str) -> Result<Self> {
    match segments(path) {
      Some(parts) if parts.len() % 2 == 1 => Ok(Self(parts.join("/"))),
      _ => Err(Error::InvalidCollectionPath(path.to_owned())),
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The document `id` inside this collection.
  pub fn doc(&self, id: &str) -> Result<DocPath> {
    DocPath::parse(&format!("{}/{id}", self.0))
  }
}

impl fmt::Display for CollectionPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A validated document path, split into its parent collection and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
  collection: CollectionPath,
  id:         String,
}

impl DocPath {
  pub fn parse(path: &str) -> Result<Self> {
    let parts = match segments(path) {
      Some(parts) if parts.len() % 2 == 0 => parts,
      _ => return Err(Error::InvalidDocumentPath(path.to_owned())),
    };
    let (id, parent) = parts
      .split_last()
      .ok_or_else(|| Error::InvalidDocumentPath(path.to_owned()))?;
    Ok(Self {
      collection: CollectionPath(parent.join("/")),
      id:         (*id).to_owned(),
    })
  }

  pub fn collection(&self) -> &CollectionPath { &self.collection }

  pub fn id(&self) -> &str { &self.id }
}

impl fmt::Display for DocPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.collection, self.id)
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub path:       String,
  pub data:       Fields,
  pub updated_at: DateTime<Utc>,
}

/// Convert an arbitrary JSON value into document fields.
pub fn fields_from_value(value: Value) -> Result<Fields> {
  match value {
    Value::Object(map) => Ok(map),
    _ => Err(Error::NotAnObject),
  }
}

/// Overlay `patch` onto `base` at the top level; keys absent from `patch`
/// keep their existing value.
pub fn merge_fields(base: &mut Fields, patch: Fields) {
  for (key, value) in patch {
    base.insert(key, value);
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn doc_path_splits_parent_and_id() {
    let p = DocPath::parse("rooms/abc/members/bob").unwrap();
    assert_eq!(p.collection().as_str(), "rooms/abc/members");
    assert_eq!(p.id(), "bob");
    assert_eq!(p.to_string(), "rooms/abc/members/bob");
  }

  #[test]
  fn surrounding_slashes_are_ignored() {
    let p = DocPath::parse("/fcmTokens/tok/").unwrap();
    assert_eq!(p.to_string(), "fcmTokens/tok");
  }

  #[test]
  fn odd_segment_count_is_not_a_document() {
    assert!(matches!(
      DocPath::parse("messages"),
      Err(Error::InvalidDocumentPath(_))
    ));
    assert!(DocPath::parse("a/b/c").is_err());
  }

  #[test]
  fn even_segment_count_is_not_a_collection() {
    assert!(CollectionPath::parse("messages").is_ok());
    assert!(matches!(
      CollectionPath::parse("messages/abc"),
      Err(Error::InvalidCollectionPath(_))
    ));
  }

  #[test]
  fn empty_and_dot_segments_rejected() {
    assert!(DocPath::parse("").is_err());
    assert!(DocPath::parse("a//b").is_err());
    assert!(DocPath::parse("../b").is_err());
    assert!(CollectionPath::parse("/").is_err());
  }

  #[test]
  fn merge_keeps_untouched_fields() {
    let mut base = fields_from_value(json!({ "a": 1, "b": 2 })).unwrap();
    merge_fields(&mut base, fields_from_value(json!({ "b": 3, "c": 4 })).unwrap());
    assert_eq!(Value::Object(base), json!({ "a": 1, "b": 3, "c": 4 }));
  }

  #[test]
  fn non_object_rejected() {
    assert!(matches!(fields_from_value(json!([1, 2])), Err(Error::NotAnObject)));
  }
}
