//! SQL schema for the Parley SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Messages are append-only apart from the image patch.
CREATE TABLE IF NOT EXISTS messages (
    message_id      TEXT PRIMARY KEY,
    name            TEXT,
    profile_pic_url TEXT,
    uid             TEXT,
    timestamp       INTEGER NOT NULL UNIQUE,  -- microseconds since epoch; server-assigned
    text            TEXT,
    image_url       TEXT,
    storage_uri     TEXT
);

CREATE TABLE IF NOT EXISTS documents (
    path        TEXT PRIMARY KEY,
    collection  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    data        TEXT NOT NULL,   -- JSON object
    updated_at  TEXT NOT NULL    -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS messages_timestamp_idx  ON messages(timestamp);
CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents(collection, doc_id);

PRAGMA user_version = 1;
";
