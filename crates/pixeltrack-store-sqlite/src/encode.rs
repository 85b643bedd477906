//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed nanosecond
//! fraction, so lexical order is chronological order and values round-trip
//! exactly. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use pixeltrack_core::{
  email::{CountUpdate, EmailTrack, EmailTrackUpdate, StampUpdate, TrackingId},
  status::StatusCheck,
};
use rusqlite::types::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_tracking_id(id: TrackingId) -> String { encode_uuid(id.as_uuid()) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// Render an [`EmailTrackUpdate`] as the `SET` list of a single `UPDATE`
/// statement, plus its positional parameters.
///
/// The `WHERE tracking_id = ?` parameter is expected to follow, at index
/// `params.len() + 1`.
pub fn encode_update(update: &EmailTrackUpdate) -> (Vec<String>, Vec<Value>) {
  let mut sets: Vec<String> = vec![];
  let mut params: Vec<Value> = vec![];

  let mut push = |expr: &dyn Fn(usize) -> String, value: Value| {
    params.push(value);
    sets.push(expr(params.len()));
  };

  if let Some(opened) = update.is_opened {
    push(&|i| format!("is_opened = ?{i}"), Value::Integer(i64::from(opened)));
  }
  match update.open_count {
    Some(CountUpdate::Set(n)) => {
      push(&|i| format!("open_count = ?{i}"), Value::Integer(i64::from(n)))
    }
    Some(CountUpdate::Increment(n)) => push(
      &|i| format!("open_count = open_count + ?{i}"),
      Value::Integer(i64::from(n)),
    ),
    None => {}
  }
  match update.opened_at {
    Some(StampUpdate::Set(at)) => {
      push(&|i| format!("opened_at = ?{i}"), Value::Text(encode_dt(at)))
    }
    Some(StampUpdate::SetIfEmpty(at)) => push(
      &|i| format!("opened_at = COALESCE(opened_at, ?{i})"),
      Value::Text(encode_dt(at)),
    ),
    None => {}
  }
  if let Some(at) = update.last_opened_at {
    push(&|i| format!("last_opened_at = ?{i}"), Value::Text(encode_dt(at)));
  }
  if let Some(ua) = &update.user_agent {
    push(&|i| format!("user_agent = ?{i}"), Value::Text(ua.clone()));
  }
  if let Some(ip) = &update.ip_address {
    push(&|i| format!("ip_address = ?{i}"), Value::Text(ip.clone()));
  }

  (sets, params)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawEmailTrack::from_row`].
pub const EMAIL_TRACK_COLUMNS: &str = "id, tracking_id, email_subject, \
   recipient_email, sender_email, sent_at, opened_at, last_opened_at, \
   is_opened, open_count, user_agent, ip_address";

/// Raw values read directly from an `email_tracks` row.
pub struct RawEmailTrack {
  pub id:              String,
  pub tracking_id:     String,
  pub email_subject:   String,
  pub recipient_email: String,
  pub sender_email:    String,
  pub sent_at:         String,
  pub opened_at:       Option<String>,
  pub last_opened_at:  Option<String>,
  pub is_opened:       bool,
  pub open_count:      u32,
  pub user_agent:      Option<String>,
  pub ip_address:      Option<String>,
}

impl RawEmailTrack {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      tracking_id:     row.get(1)?,
      email_subject:   row.get(2)?,
      recipient_email: row.get(3)?,
      sender_email:    row.get(4)?,
      sent_at:         row.get(5)?,
      opened_at:       row.get(6)?,
      last_opened_at:  row.get(7)?,
      is_opened:       row.get(8)?,
      open_count:      row.get(9)?,
      user_agent:      row.get(10)?,
      ip_address:      row.get(11)?,
    })
  }

  pub fn into_email_track(self) -> Result<EmailTrack> {
    Ok(EmailTrack {
      id:              decode_uuid(&self.id)?,
      email_subject:   self.email_subject,
      recipient_email: self.recipient_email,
      sender_email:    self.sender_email,
      tracking_id:     TrackingId::from(decode_uuid(&self.tracking_id)?),
      sent_at:         decode_dt(&self.sent_at)?,
      opened_at:       self.opened_at.as_deref().map(decode_dt).transpose()?,
      last_opened_at:  self.last_opened_at.as_deref().map(decode_dt).transpose()?,
      is_opened:       self.is_opened,
      open_count:      self.open_count,
      user_agent:      self.user_agent,
      ip_address:      self.ip_address,
    })
  }
}

/// Raw strings read directly from a `status_checks` row.
pub struct RawStatusCheck {
  pub id:          String,
  pub client_name: String,
  pub timestamp:   String,
}

impl RawStatusCheck {
  pub fn into_status_check(self) -> Result<StatusCheck> {
    Ok(StatusCheck {
      id:          decode_uuid(&self.id)?,
      client_name: self.client_name,
      timestamp:   decode_dt(&self.timestamp)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let later = earlier + chrono::Duration::nanoseconds(1_500);
    assert_eq!(encode_dt(earlier).len(), encode_dt(later).len());
    assert!(encode_dt(earlier) < encode_dt(later));
    assert_eq!(decode_dt(&encode_dt(later)).unwrap(), later);
  }

  #[test]
  fn open_update_renders_relative_expressions() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let update = EmailTrackUpdate {
      open_count: Some(CountUpdate::Increment(1)),
      opened_at: Some(StampUpdate::SetIfEmpty(at)),
      ..Default::default()
    };
    let (sets, params) = encode_update(&update);
    assert_eq!(sets, vec![
      "open_count = open_count + ?1".to_string(),
      "opened_at = COALESCE(opened_at, ?2)".to_string(),
    ]);
    assert_eq!(params.len(), 2);
  }
}
