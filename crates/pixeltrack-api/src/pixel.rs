//! The tracking pixel.
//!
//! Fetching the pixel counts as an open of the email that embeds it. The
//! image is returned whether or not the tracking id is known, so a mail
//! client never sees a broken image for a stale or forged URL.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::header,
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use pixeltrack_core::{
  OpenError,
  email::TrackingId,
  store::TrackingStore,
  tracking::{self, OpenObservation},
};

use crate::{client::ClientMeta, error::ApiError};

/// A 1x1 fully transparent RGBA PNG.
pub const PIXEL_PNG: &[u8] = &[
  0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
  0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
  0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78,
  0xda, 0x63, 0x64, 0x60, 0xf8, 0x5f, 0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47,
  0xba, 0x92, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// The pixel with caching disabled, so every render reaches the server.
pub fn pixel_response() -> Response {
  (
    [
      (header::CONTENT_TYPE, "image/png"),
      (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
      (header::PRAGMA, "no-cache"),
      (header::EXPIRES, "0"),
    ],
    Bytes::from_static(PIXEL_PNG),
  )
    .into_response()
}

/// `GET /pixel/{tracking_id}` (also mounted at `/r/...` and `/t/...`).
///
/// Query strings such as cache busters are ignored.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Path(raw_id): Path<String>,
  client: ClientMeta,
) -> Result<Response, ApiError>
where
  S: TrackingStore,
{
  let Ok(tracking_id) = raw_id.parse::<TrackingId>() else {
    tracing::debug!(tracking_id = %raw_id, "pixel fetched with malformed tracking id");
    return Ok(pixel_response());
  };

  let observation = OpenObservation {
    user_agent:  client.user_agent,
    ip_address:  client.ip_address,
    observed_at: Utc::now(),
  };

  match tracking::record_open(store.as_ref(), tracking_id, &observation).await {
    Ok(()) => {
      tracing::debug!(%tracking_id, ip = %observation.ip_address, "pixel open recorded");
    }
    Err(OpenError::NotFound(_)) => {
      tracing::debug!(%tracking_id, "pixel fetched for unknown tracking id");
    }
    Err(OpenError::Store(e)) => return Err(ApiError::Store(Box::new(e))),
  }

  Ok(pixel_response())
}
