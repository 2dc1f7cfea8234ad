//! [`SqliteStore`] — the SQLite implementation of [`MessageStore`] and
//! [`DocumentStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use parley_core::{
  document::{CollectionPath, DocPath, Document, Fields, merge_fields},
  live::RecentMessages,
  message::{ChatMessage, MESSAGES_COLLECTION, MessageRef, NewMessage},
  store::{DocumentStore, MessageStore},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tokio::{
  sync::watch,
  time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    MESSAGE_COLUMNS, RawDocument, RawMessage, decode_fields, encode_dt,
    encode_fields, encode_uuid, message_document, next_timestamp_micros,
  },
  schema::SCHEMA,
};

/// How often a live view checks for commits made through other connections.
const CHANGE_POLL_INTERVAL: Duration = Duration::from_millis(200);

// ─── Store ───────────────────────────────────────────────────────────────────

/// Messages and documents backed by a single SQLite file.
///
/// Cloning is cheap — the connection and change notifier are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  /// Bumped after every write to the `messages` table through this store.
  revision:   Arc<watch::Sender<u64>>,
  /// Number of live view tasks still running.
  live_views: Arc<AtomicUsize>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    let (revision, _) = watch::channel(0);
    Ok(Self {
      conn,
      revision: Arc::new(revision),
      live_views: Arc::new(AtomicUsize::new(0)),
    })
  }

  fn notify_messages_changed(&self) {
    self.revision.send_modify(|rev| *rev += 1);
  }

  /// The `limit` newest messages, newest first.
  pub async fn recent_messages(&self, limit: usize) -> Result<Vec<ChatMessage>> {
    query_recent(&self.conn, limit).await
  }

  /// Every message, oldest first.
  pub async fn all_messages(&self) -> Result<Vec<ChatMessage>> {
    let raws: Vec<RawMessage> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY timestamp ASC"
        ))?;
        let rows = stmt
          .query_map([], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  pub async fn message_count(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |r| r.get(0))?)
      })
      .await?;
    Ok(u64::try_from(count).unwrap_or_default())
  }

  /// Live views whose refresh task has not yet exited.
  pub fn live_view_count(&self) -> usize { self.live_views.load(Ordering::SeqCst) }
}

async fn query_recent(
  conn: &tokio_rusqlite::Connection,
  limit: usize,
) -> Result<Vec<ChatMessage>> {
  let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

  let raws: Vec<RawMessage> = conn
    .call(move |conn| {
      let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY timestamp DESC LIMIT ?1"
      ))?;
      let rows = stmt
        .query_map(rusqlite::params![limit_val], RawMessage::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await?;

  raws.into_iter().map(RawMessage::into_message).collect()
}

/// SQLite's `data_version`: changes whenever another connection commits.
async fn data_version(conn: &tokio_rusqlite::Connection) -> Result<i64> {
  Ok(
    conn
      .call(|conn| Ok(conn.query_row("PRAGMA data_version", [], |r| r.get(0))?))
      .await?,
  )
}

/// Keeps [`SqliteStore::live_view_count`] in step with running view tasks.
struct LiveViewGuard(Arc<AtomicUsize>);

impl LiveViewGuard {
  fn new(count: Arc<AtomicUsize>) -> Self {
    count.fetch_add(1, Ordering::SeqCst);
    Self(count)
  }
}

impl Drop for LiveViewGuard {
  fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}

fn is_messages(collection: &CollectionPath) -> bool {
  collection.as_str() == MESSAGES_COLLECTION
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  type Error = Error;

  async fn append_message(&self, input: NewMessage) -> Result<MessageRef> {
    let id     = Uuid::new_v4();
    let id_str = encode_uuid(id);
    let now    = Utc::now();

    let timestamp: i64 = self
      .conn
      .call(move |conn| {
        // Take the write lock up front so concurrent writers wait on the busy
        // timeout instead of failing to upgrade a read lock.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let newest: Option<i64> =
          tx.query_row("SELECT MAX(timestamp) FROM messages", [], |r| r.get(0))?;
        let timestamp = next_timestamp_micros(now, newest);
        tx.execute(
          "INSERT INTO messages (
             message_id, name, profile_pic_url, uid, timestamp,
             text, image_url, storage_uri
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
          rusqlite::params![
            id_str,
            input.name,
            input.profile_pic_url,
            input.uid,
            timestamp,
            input.text,
            input.image_url,
          ],
        )?;
        tx.commit()?;
        Ok(timestamp)
      })
      .await?;

    debug!(message_id = %id, timestamp_micros = timestamp, "appended message");
    self.notify_messages_changed();
    Ok(MessageRef::new(id))
  }

  async fn patch_image(
    &self,
    id:          Uuid,
    image_url:   String,
    storage_uri: String,
  ) -> Result<ChatMessage> {
    let id_str = encode_uuid(id);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE messages SET image_url = ?2, storage_uri = ?3 WHERE message_id = ?1",
          rusqlite::params![id_str, image_url, storage_uri],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::MessageNotFound(id));
    }
    self.notify_messages_changed();

    self.get_message(id).await?.ok_or(Error::MessageNotFound(id))
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<ChatMessage>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMessage> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
            rusqlite::params![id_str],
            RawMessage::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMessage::into_message).transpose()
  }

  async fn watch_recent(&self, limit: usize) -> Result<RecentMessages> {
    // Subscribe and sample `data_version` before the first query so no write
    // can slip in between.
    let mut revisions = self.revision.subscribe();
    revisions.borrow_and_update();
    let mut seen_version = data_version(&self.conn).await?;

    let initial = query_recent(&self.conn, limit).await?;
    let (tx, rx) = watch::channel(initial);

    // The task holds the connection and a receiver only: once every handle to
    // the store is gone the revision sender drops and the task ends.
    let conn = self.conn.clone();
    let guard = LiveViewGuard::new(Arc::clone(&self.live_views));

    tokio::spawn(async move {
      let _guard = guard;
      let mut poll = time::interval(CHANGE_POLL_INTERVAL);
      poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
      debug!(limit, "live message view started");

      loop {
        tokio::select! {
          _ = tx.closed() => break,
          changed = revisions.changed() => {
            if changed.is_err() {
              break;
            }
          }
          _ = poll.tick() => {
            match data_version(&conn).await {
              Ok(version) if version != seen_version => seen_version = version,
              Ok(_) => continue,
              Err(e) => {
                warn!(error = %e, "failed to poll for external changes");
                continue;
              }
            }
          }
        }

        match query_recent(&conn, limit).await {
          Ok(messages) => {
            tx.send_if_modified(|current| {
              if *current == messages {
                return false;
              }
              *current = messages;
              true
            });
          }
          Err(e) => warn!(error = %e, "failed to refresh live message view"),
        }
      }
      debug!(limit, "live message view stopped");
    });

    Ok(RecentMessages::new(rx))
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn get_document(&self, path: &DocPath) -> Result<Option<Document>> {
    if is_messages(path.collection()) {
      let Ok(id) = Uuid::parse_str(path.id()) else {
        return Ok(None);
      };
      return self
        .get_message(id)
        .await?
        .as_ref()
        .map(message_document)
        .transpose();
    }

    let path_str = path.to_string();
    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT path, data, updated_at FROM documents WHERE path = ?1",
            rusqlite::params![path_str],
            RawDocument::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_collection(&self, path: &CollectionPath) -> Result<Vec<Document>> {
    if is_messages(path) {
      return self.all_messages().await?.iter().map(message_document).collect();
    }

    let collection = path.as_str().to_owned();
    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT path, data, updated_at FROM documents
           WHERE collection = ?1
           ORDER BY doc_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![collection], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn merge_document(&self, path: &DocPath, data: Fields) -> Result<Document> {
    if is_messages(path.collection()) {
      return Err(Error::ReadOnlyCollection(MESSAGES_COLLECTION.to_owned()));
    }

    let path_str   = path.to_string();
    let collection = path.collection().as_str().to_owned();
    let doc_id     = path.id().to_owned();
    let now        = Utc::now();
    let now_str    = encode_dt(now);

    // Read-modify-write inside one transaction on the connection thread.
    let stored: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
          .query_row(
            "SELECT data FROM documents WHERE path = ?1",
            rusqlite::params![path_str],
            |r| r.get(0),
          )
          .optional()?;

        let mut fields = match existing.as_deref().map(decode_fields) {
          Some(Ok(fields)) => fields,
          Some(Err(e)) => return Err(tokio_rusqlite::Error::Other(Box::new(e))),
          None => Fields::new(),
        };
        merge_fields(&mut fields, data);
        let encoded =
          encode_fields(&fields).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

        tx.execute(
          "INSERT INTO documents (path, collection, doc_id, data, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(path) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
          rusqlite::params![path_str, collection, doc_id, encoded, now_str],
        )?;
        tx.commit()?;
        Ok(encoded)
      })
      .await?;

    Ok(Document {
      path:       path.to_string(),
      data:       decode_fields(&stored)?,
      updated_at: now,
    })
  }

  async fn delete_document(&self, path: &DocPath) -> Result<bool> {
    if is_messages(path.collection()) {
      return Err(Error::ReadOnlyCollection(MESSAGES_COLLECTION.to_owned()));
    }

    let path_str = path.to_string();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE path = ?1",
          rusqlite::params![path_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}
