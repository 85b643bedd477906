//! HTTP server assembly for pixeltrack.
//!
//! Mounts the [`pixeltrack_api`] router under the configured path prefix and
//! wraps it in the transport layers (CORS, request tracing).

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use pixeltrack_core::store::TrackingStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `pixeltrack.toml` and
/// `PIXELTRACK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// Prefix every API route is mounted under.
  pub path_prefix:     String,
  /// Allow any origin, method, and header. The browser extension and the
  /// dashboard call the API cross-origin.
  pub cors_permissive: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            "0.0.0.0".to_string(),
      port:            8001,
      store_path:      PathBuf::from("pixeltrack.db"),
      path_prefix:     "/api".to_string(),
      cors_permissive: true,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router for `store`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: TrackingStore + 'static,
{
  let api = pixeltrack_api::api_router(store);

  let app = match normalize_prefix(&config.path_prefix) {
    None => Router::new().merge(api),
    // `nest` answers the liveness route at the bare prefix only.
    Some(prefix) => Router::new()
      .nest(&prefix, api)
      .route(&format!("{prefix}/"), get(pixeltrack_api::status::root)),
  };

  let app = if config.cors_permissive {
    app.layer(CorsLayer::permissive())
  } else {
    app
  };

  app.layer(TraceLayer::new_for_http())
}

/// `"api"`, `"/api"` and `"/api/"` all mount at `/api`; an empty or `/`
/// prefix mounts at the root.
fn normalize_prefix(raw: &str) -> Option<String> {
  let trimmed = raw.trim().trim_matches('/');
  (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
}

// ─── Integration tests ────────────────────────────────────────────────────────
