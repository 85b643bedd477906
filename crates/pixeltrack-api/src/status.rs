//! Liveness endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | `{"message": ...}` |
//! | `POST` | `/status` | Body: `{"client_name":"..."}` |
//! | `GET`  | `/status` | At most 1000 checks, unordered |

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use pixeltrack_core::{
  status::StatusCheck,
  store::{MAX_LIST_LIMIT, TrackingStore},
  tracking,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct RootMessage {
  pub message: &'static str,
}

/// `GET /`
pub async fn root() -> Json<RootMessage> {
  Json(RootMessage { message: "Email Tracker API" })
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub client_name: String,
}

/// `POST /status` — body: `{"client_name":"..."}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<Json<StatusCheck>, ApiError>
where
  S: TrackingStore,
{
  let check = tracking::create_status_check(store.as_ref(), body.client_name, Utc::now())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(check))
}

/// `GET /status`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<StatusCheck>>, ApiError>
where
  S: TrackingStore,
{
  let checks = store
    .list_status_checks(MAX_LIST_LIMIT)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(checks))
}
