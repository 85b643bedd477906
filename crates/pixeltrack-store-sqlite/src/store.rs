//! [`SqliteStore`] — the SQLite implementation of [`TrackingStore`].

use std::path::Path;

use pixeltrack_core::{
  email::{EmailTrack, EmailTrackUpdate, TrackingId},
  status::StatusCheck,
  store::{EmailTrackQuery, MAX_LIST_LIMIT, TrackingStore},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{
    EMAIL_TRACK_COLUMNS, RawEmailTrack, RawStatusCheck, encode_dt, encode_tracking_id,
    encode_update, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A pixeltrack store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are executed one at a time on the connection's worker thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TrackingStore impl ──────────────────────────────────────────────────────

impl TrackingStore for SqliteStore {
  type Error = crate::Error;

  // ── Tracked emails ────────────────────────────────────────────────────────

  async fn insert_email_track(&self, track: &EmailTrack) -> Result<()> {
    let id_str          = encode_uuid(track.id);
    let tracking_id_str = encode_tracking_id(track.tracking_id);
    let subject         = track.email_subject.clone();
    let recipient       = track.recipient_email.clone();
    let sender          = track.sender_email.clone();
    let sent_at_str     = encode_dt(track.sent_at);
    let opened_at_str   = track.opened_at.map(encode_dt);
    let last_opened_str = track.last_opened_at.map(encode_dt);
    let is_opened       = track.is_opened;
    let open_count      = track.open_count;
    let user_agent      = track.user_agent.clone();
    let ip_address      = track.ip_address.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO email_tracks ({EMAIL_TRACK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
          ),
          rusqlite::params![
            id_str,
            tracking_id_str,
            subject,
            recipient,
            sender,
            sent_at_str,
            opened_at_str,
            last_opened_str,
            is_opened,
            open_count,
            user_agent,
            ip_address,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_email_track(&self, tracking_id: TrackingId) -> Result<Option<EmailTrack>> {
    let id_str = encode_tracking_id(tracking_id);

    let raw: Option<RawEmailTrack> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {EMAIL_TRACK_COLUMNS} FROM email_tracks WHERE tracking_id = ?1"),
            rusqlite::params![id_str],
            RawEmailTrack::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEmailTrack::into_email_track).transpose()
  }

  async fn list_email_tracks(&self, query: &EmailTrackQuery) -> Result<Vec<EmailTrack>> {
    let sender    = query.sender_email.clone();
    let limit_val = query.effective_limit() as i64;

    let raws: Vec<RawEmailTrack> = self
      .conn
      .call(move |conn| {
        let where_clause = if sender.is_some() { "WHERE sender_email = ?1" } else { "" };
        let sql = format!(
          "SELECT {EMAIL_TRACK_COLUMNS}
           FROM email_tracks
           {where_clause}
           ORDER BY sent_at DESC
           LIMIT ?2"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![sender.as_deref(), limit_val],
            RawEmailTrack::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmailTrack::into_email_track).collect()
  }

  async fn update_fields(
    &self,
    tracking_id: TrackingId,
    update:      EmailTrackUpdate,
  ) -> Result<bool> {
    let id_str = encode_tracking_id(tracking_id);
    let (sets, mut params) = encode_update(&update);

    let matched = self
      .conn
      .call(move |conn| {
        if sets.is_empty() {
          let exists = conn
            .query_row(
              "SELECT 1 FROM email_tracks WHERE tracking_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          return Ok(exists);
        }

        let sql = format!(
          "UPDATE email_tracks SET {} WHERE tracking_id = ?{}",
          sets.join(", "),
          params.len() + 1,
        );
        params.push(rusqlite::types::Value::Text(id_str));
        let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(changed > 0)
      })
      .await?;

    Ok(matched)
  }

  // ── Status checks ─────────────────────────────────────────────────────────

  async fn insert_status_check(&self, check: &StatusCheck) -> Result<()> {
    let id_str = encode_uuid(check.id);
    let name   = check.client_name.clone();
    let at_str = encode_dt(check.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO status_checks (id, client_name, timestamp) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_status_checks(&self, limit: usize) -> Result<Vec<StatusCheck>> {
    let limit_val = limit.min(MAX_LIST_LIMIT) as i64;

    let raws: Vec<RawStatusCheck> = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT id, client_name, timestamp FROM status_checks LIMIT ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawStatusCheck {
              id:          row.get(0)?,
              client_name: row.get(1)?,
              timestamp:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatusCheck::into_status_check).collect()
  }
}
