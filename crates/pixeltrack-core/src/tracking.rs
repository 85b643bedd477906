//! The tracking service: registration and the open-detection transition.
//!
//! Both the pixel route and the explicit open-report route go through
//! [`record_open`]; neither builds its own update.

use chrono::{DateTime, Utc};

use crate::{
  OpenError,
  email::{CountUpdate, EmailTrack, EmailTrackUpdate, NewEmailTrack, StampUpdate, TrackingId},
  status::StatusCheck,
  store::TrackingStore,
};

/// Request metadata captured when an open is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenObservation {
  pub user_agent:  String,
  pub ip_address:  String,
  pub observed_at: DateTime<Utc>,
}

impl OpenObservation {
  /// The field map for one detected open.
  ///
  /// `open_count` and `opened_at` are expressed relative to the stored row so
  /// the store resolves "next count" and "first open" inside the write.
  pub fn to_update(&self) -> EmailTrackUpdate {
    EmailTrackUpdate {
      is_opened:      Some(true),
      open_count:     Some(CountUpdate::Increment(1)),
      opened_at:      Some(StampUpdate::SetIfEmpty(self.observed_at)),
      last_opened_at: Some(self.observed_at),
      user_agent:     Some(self.user_agent.clone()),
      ip_address:     Some(self.ip_address.clone()),
    }
  }
}

/// Register a new tracked email and persist it.
pub async fn register_email<S>(
  store: &S,
  input: NewEmailTrack,
  now: DateTime<Utc>,
) -> Result<EmailTrack, S::Error>
where
  S: TrackingStore,
{
  let track = EmailTrack::register(input, now);
  store.insert_email_track(&track).await?;
  Ok(track)
}

/// Record one detected open of `tracking_id`.
///
/// Every call counts: repeated fetches (including mail-client prefetching)
/// are not deduplicated.
pub async fn record_open<S>(
  store: &S,
  tracking_id: TrackingId,
  observation: &OpenObservation,
) -> Result<(), OpenError<S::Error>>
where
  S: TrackingStore,
{
  let matched = store
    .update_fields(tracking_id, observation.to_update())
    .await
    .map_err(OpenError::Store)?;

  if matched {
    Ok(())
  } else {
    Err(OpenError::NotFound(tracking_id.to_string()))
  }
}

/// Create and persist a status check for `client_name`.
pub async fn create_status_check<S>(
  store: &S,
  client_name: String,
  now: DateTime<Utc>,
) -> Result<StatusCheck, S::Error>
where
  S: TrackingStore,
{
  let check = StatusCheck::new(client_name, now);
  store.insert_status_check(&check).await?;
  Ok(check)
}
