//! Handlers for `/track/...` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/track/email` | Body: [`NewEmailTrack`]; returns the registered record |
//! | `GET`  | `/track/emails` | Optional `?sender_email=`; newest first, at most 1000 |
//! | `GET`  | `/track/email/{tracking_id}` | Record, or `{"error": ...}` with status 200 |
//! | `POST` | `/track/open/{tracking_id}` | `{"success": bool, "message": ...}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use pixeltrack_core::{
  OpenError,
  email::{EmailTrack, NewEmailTrack, TrackingId},
  store::{EmailTrackQuery, TrackingStore},
  tracking::{self, OpenObservation},
};
use serde::{Deserialize, Serialize};

use crate::{client::ClientMeta, error::ApiError};

pub const TRACKING_ID_NOT_FOUND: &str = "Tracking ID not found";

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /track/email`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewEmailTrack>,
) -> Result<Json<EmailTrack>, ApiError>
where
  S: TrackingStore,
{
  let track = tracking::register_email(store.as_ref(), body, Utc::now())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(tracking_id = %track.tracking_id, "registered tracked email");
  Ok(Json(track))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Exact match; an empty value means no filter.
  pub sender_email: Option<String>,
}

/// `GET /track/emails[?sender_email=<address>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<EmailTrack>>, ApiError>
where
  S: TrackingStore,
{
  let query = EmailTrackQuery {
    sender_email: params.sender_email.filter(|s| !s.is_empty()),
    limit:        None,
  };
  let tracks = store
    .list_email_tracks(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(tracks))
}

// ─── Status lookup ────────────────────────────────────────────────────────────

/// Body of `GET /track/email/{tracking_id}`.
///
/// Both variants are served with `200 OK`; clients tell them apart by shape.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TrackingStatus {
  Found(EmailTrack),
  Missing { error: &'static str },
}

/// `GET /track/email/{tracking_id}`
pub async fn status<S>(
  State(store): State<Arc<S>>,
  Path(raw_id): Path<String>,
) -> Result<Json<TrackingStatus>, ApiError>
where
  S: TrackingStore,
{
  let Ok(tracking_id) = raw_id.parse::<TrackingId>() else {
    return Ok(Json(TrackingStatus::Missing { error: TRACKING_ID_NOT_FOUND }));
  };

  let found = store
    .get_email_track(tracking_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(match found {
    Some(track) => TrackingStatus::Found(track),
    None => TrackingStatus::Missing { error: TRACKING_ID_NOT_FOUND },
  }))
}

// ─── Explicit open report ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OpenReport {
  pub success: bool,
  pub message: &'static str,
}

/// `POST /track/open/{tracking_id}`
pub async fn report_open<S>(
  State(store): State<Arc<S>>,
  Path(raw_id): Path<String>,
  client: ClientMeta,
) -> Result<Json<OpenReport>, ApiError>
where
  S: TrackingStore,
{
  let not_found = Json(OpenReport { success: false, message: TRACKING_ID_NOT_FOUND });

  let Ok(tracking_id) = raw_id.parse::<TrackingId>() else {
    return Ok(not_found);
  };

  let observation = OpenObservation {
    user_agent:  client.user_agent,
    ip_address:  client.ip_address,
    observed_at: Utc::now(),
  };

  match tracking::record_open(store.as_ref(), tracking_id, &observation).await {
    Ok(()) => {
      tracing::debug!(%tracking_id, "open reported");
      Ok(Json(OpenReport { success: true, message: "Email open logged" }))
    }
    Err(OpenError::NotFound(_)) => Ok(not_found),
    Err(OpenError::Store(e)) => Err(ApiError::Store(Box::new(e))),
  }
}
