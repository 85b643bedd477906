//! SQL schema for the pixeltrack SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS email_tracks (
    id              TEXT PRIMARY KEY,
    tracking_id     TEXT NOT NULL UNIQUE,
    email_subject   TEXT NOT NULL,
    recipient_email TEXT NOT NULL,
    sender_email    TEXT NOT NULL,
    sent_at         TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    opened_at       TEXT,            -- first open; written once
    last_opened_at  TEXT,
    is_opened       INTEGER NOT NULL DEFAULT 0,
    open_count      INTEGER NOT NULL DEFAULT 0,
    user_agent      TEXT,
    ip_address      TEXT
);

CREATE TABLE IF NOT EXISTS status_checks (
    id          TEXT PRIMARY KEY,
    client_name TEXT NOT NULL,
    timestamp   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS email_tracks_sender_idx  ON email_tracks(sender_email);
CREATE INDEX IF NOT EXISTS email_tracks_sent_at_idx ON email_tracks(sent_at);

PRAGMA user_version = 1;
";
