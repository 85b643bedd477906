//! Tracked emails — one outbound message and its open history.
//!
//! A record is created once at registration and afterwards only mutated by
//! the open-detection transition in [`crate::tracking`]. Nothing is ever
//! deleted.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Tracking identifier ─────────────────────────────────────────────────────

/// The public key embedded in pixel URLs.
///
/// Generated independently of the record `id` so that it carries no
/// information about the sender or recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(Uuid);

impl TrackingId {
  pub fn generate() -> Self { Self(Uuid::new_v4()) }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl From<Uuid> for TrackingId {
  fn from(id: Uuid) -> Self { Self(id) }
}

impl FromStr for TrackingId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self(Uuid::parse_str(s)?)) }
}

impl fmt::Display for TrackingId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0.hyphenated(), f)
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One outbound email and everything observed about its opens.
///
/// `opened_at` is set exactly when `is_opened` is true; `open_count` only
/// ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTrack {
  pub id:              Uuid,
  pub email_subject:   String,
  pub recipient_email: String,
  pub sender_email:    String,
  pub tracking_id:     TrackingId,
  pub sent_at:         DateTime<Utc>,
  /// First detected open; never overwritten.
  pub opened_at:       Option<DateTime<Utc>>,
  /// Most recent detected open.
  pub last_opened_at:  Option<DateTime<Utc>>,
  pub is_opened:       bool,
  pub open_count:      u32,
  pub user_agent:      Option<String>,
  pub ip_address:      Option<String>,
}

impl EmailTrack {
  /// Build a freshly registered record: new identifiers, `sent_at = now`, and
  /// every open-related field at its empty default.
  pub fn register(input: NewEmailTrack, now: DateTime<Utc>) -> Self {
    Self {
      id:              Uuid::new_v4(),
      email_subject:   input.email_subject,
      recipient_email: input.recipient_email,
      sender_email:    input.sender_email,
      tracking_id:     TrackingId::generate(),
      sent_at:         now,
      opened_at:       None,
      last_opened_at:  None,
      is_opened:       false,
      open_count:      0,
      user_agent:      None,
      ip_address:      None,
    }
  }
}

/// Registration input. Addresses are accepted as-is, without syntax checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmailTrack {
  pub email_subject:   String,
  pub recipient_email: String,
  pub sender_email:    String,
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// How to change `open_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountUpdate {
  Set(u32),
  /// Added to the stored value in the same statement that applies the rest
  /// of the update, so concurrent increments are never lost.
  Increment(u32),
}

/// How to change `opened_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampUpdate {
  Set(DateTime<Utc>),
  /// Only takes effect if the stored value is empty.
  SetIfEmpty(DateTime<Utc>),
}

/// A typed field map for [`TrackingStore::update_fields`]. `None` leaves the
/// field untouched.
///
/// [`TrackingStore::update_fields`]: crate::store::TrackingStore::update_fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailTrackUpdate {
  pub is_opened:      Option<bool>,
  pub open_count:     Option<CountUpdate>,
  pub opened_at:      Option<StampUpdate>,
  pub last_opened_at: Option<DateTime<Utc>>,
  pub user_agent:     Option<String>,
  pub ip_address:     Option<String>,
}

impl EmailTrackUpdate {
  /// Apply this update to an in-memory record, with the same semantics a
  /// store applies to a persisted one.
  pub fn apply_to(&self, track: &mut EmailTrack) {
    if let Some(opened) = self.is_opened {
      track.is_opened = opened;
    }
    match self.open_count {
      Some(CountUpdate::Set(n)) => track.open_count = n,
      Some(CountUpdate::Increment(n)) => {
        track.open_count = track.open_count.saturating_add(n)
      }
      None => {}
    }
    match self.opened_at {
      Some(StampUpdate::Set(at)) => track.opened_at = Some(at),
      Some(StampUpdate::SetIfEmpty(at)) => {
        track.opened_at.get_or_insert(at);
      }
      None => {}
    }
    if let Some(at) = self.last_opened_at {
      track.last_opened_at = Some(at);
    }
    if let Some(ua) = &self.user_agent {
      track.user_agent = Some(ua.clone());
    }
    if let Some(ip) = &self.ip_address {
      track.ip_address = Some(ip.clone());
    }
  }
}
