//! JSON REST API and tracking pixel for pixeltrack.
//!
//! Exposes an axum [`Router`] backed by any
//! [`pixeltrack_core::store::TrackingStore`]. CORS, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", pixeltrack_api::api_router(store.clone()))
//! ```
//!
//! The client address falls back to [`axum::extract::ConnectInfo`], so serve
//! the app with `into_make_service_with_connect_info::<SocketAddr>()`.

pub mod client;
pub mod emails;
pub mod error;
pub mod pixel;
pub mod status;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use pixeltrack_core::store::TrackingStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TrackingStore + 'static,
{
  Router::new()
    .route("/", get(status::root))
    // Status checks
    .route("/status", get(status::list::<S>).post(status::create::<S>))
    // Tracked emails
    .route("/track/email", post(emails::create::<S>))
    .route("/track/emails", get(emails::list::<S>))
    .route("/track/email/{tracking_id}", get(emails::status::<S>))
    .route("/track/open/{tracking_id}", post(emails::report_open::<S>))
    // Pixel, under every URL the embed snippets use
    .route("/pixel/{tracking_id}", get(pixel::handler::<S>))
    .route("/r/{tracking_id}", get(pixel::handler::<S>))
    .route("/t/{tracking_id}", get(pixel::handler::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::net::SocketAddr;

  use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use pixeltrack_core::email::{EmailTrack, TrackingId};
  use pixeltrack_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;
  use crate::pixel::PIXEL_PNG;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
      .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 9], 40000))))
  }

  async fn send(
    app:     &Router,
    method:  &str,
    uri:     &str,
    headers: Vec<(&str, &str)>,
    body:    Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
  }

  async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()
  }

  async fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
  }

  async fn register(app: &Router, sender: &str, subject: &str) -> EmailTrack {
    let resp = send(
      app,
      "POST",
      "/track/email",
      vec![],
      Some(json!({
        "email_subject": subject,
        "recipient_email": "b@x.com",
        "sender_email": sender,
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_value(body_json(resp).await).unwrap()
  }

  async fn lookup(app: &Router, tracking_id: &str) -> Value {
    let resp = send(app, "GET", &format!("/track/email/{tracking_id}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
  }

  // ── Liveness ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn root_returns_message() {
    let app = app().await;
    let resp = send(&app, "GET", "/", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["message"].is_string());
  }

  #[tokio::test]
  async fn status_checks_are_created_and_listed() {
    let app = app().await;
    let resp = send(&app, "POST", "/status", vec![], Some(json!({ "client_name": "probe" }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    assert_eq!(created["client_name"], "probe");

    let listed = body_json(send(&app, "GET", "/status", vec![], None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
  }

  // ── Registration and lookup ─────────────────────────────────────────────────

  #[tokio::test]
  async fn register_returns_unopened_record() {
    let app = app().await;
    let track = register(&app, "a@x.com", "Hi").await;
    assert_eq!(track.open_count, 0);
    assert!(!track.is_opened);
    assert!(track.opened_at.is_none());
    assert_ne!(track.tracking_id.as_uuid(), track.id);
  }

  #[tokio::test]
  async fn register_accepts_unvalidated_addresses() {
    let app = app().await;
    let track = register(&app, "", "not an address either").await;
    assert_eq!(track.sender_email, "");
  }

  #[tokio::test]
  async fn lookup_unknown_returns_error_payload_with_200() {
    let app = app().await;
    let body = lookup(&app, &TrackingId::generate().to_string()).await;
    assert_eq!(body, json!({ "error": "Tracking ID not found" }));

    let body = lookup(&app, "definitely-not-a-uuid").await;
    assert_eq!(body, json!({ "error": "Tracking ID not found" }));
  }

  #[tokio::test]
  async fn list_filters_by_sender() {
    let app = app().await;
    register(&app, "a@x.com", "one").await;
    register(&app, "c@x.com", "other").await;
    register(&app, "a@x.com", "two").await;

    let listed = body_json(
      send(&app, "GET", "/track/emails?sender_email=a%40x.com", vec![], None).await,
    )
    .await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|t| t["sender_email"] == "a@x.com"));

    let all = body_json(send(&app, "GET", "/track/emails", vec![], None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
  }

  // ── Pixel ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn pixel_fetch_records_an_open() {
    let app = app().await;
    let track = register(&app, "a@x.com", "Hi").await;

    let resp = send(
      &app,
      "GET",
      &format!("/pixel/{}?cb=1718000000&r=abc", track.tracking_id),
      vec![("user-agent", "Mozilla/5.0 (Thunderbird)")],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    assert_eq!(body_bytes(resp).await, PIXEL_PNG);

    let after = lookup(&app, &track.tracking_id.to_string()).await;
    assert_eq!(after["open_count"], 1);
    assert_eq!(after["is_opened"], true);
    assert_eq!(after["opened_at"], after["last_opened_at"]);
    assert_eq!(after["user_agent"], "Mozilla/5.0 (Thunderbird)");
    assert_eq!(after["ip_address"], "203.0.113.9");
  }

  #[tokio::test]
  async fn pixel_aliases_count_as_opens() {
    let app = app().await;
    let track = register(&app, "a@x.com", "Hi").await;

    for prefix in ["pixel", "r", "t"] {
      let resp = send(&app, "GET", &format!("/{prefix}/{}", track.tracking_id), vec![], None).await;
      assert_eq!(resp.status(), StatusCode::OK);
    }

    let after = lookup(&app, &track.tracking_id.to_string()).await;
    assert_eq!(after["open_count"], 3);
    assert_eq!(after["user_agent"], "Unknown");
  }

  #[tokio::test]
  async fn pixel_for_unknown_id_still_serves_image() {
    let app = app().await;
    let track = register(&app, "a@x.com", "Hi").await;

    for id in [TrackingId::generate().to_string(), "garbage".to_string()] {
      let resp = send(&app, "GET", &format!("/pixel/{id}"), vec![], None).await;
      assert_eq!(resp.status(), StatusCode::OK);
      assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
      assert_eq!(body_bytes(resp).await, PIXEL_PNG);
    }

    let all = body_json(send(&app, "GET", "/track/emails", vec![], None).await).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["tracking_id"], track.tracking_id.to_string());
    assert_eq!(all[0]["open_count"], 0);
  }

  #[tokio::test]
  async fn forwarded_for_takes_first_hop() {
    let app = app().await;
    let track = register(&app, "a@x.com", "Hi").await;

    send(
      &app,
      "GET",
      &format!("/pixel/{}", track.tracking_id),
      vec![("x-forwarded-for", "198.51.100.7, 10.0.0.1")],
      None,
    )
    .await;

    let after = lookup(&app, &track.tracking_id.to_string()).await;
    assert_eq!(after["ip_address"], "198.51.100.7");
  }

  // ── Explicit open report ────────────────────────────────────────────────────

  #[tokio::test]
  async fn report_open_counts_and_keeps_first_open() {
    let app = app().await;
    let track = register(&app, "a@x.com", "Hi").await;
    let uri = format!("/track/open/{}", track.tracking_id);

    let first = body_json(send(&app, "POST", &uri, vec![("user-agent", "first")], None).await).await;
    assert_eq!(first, json!({ "success": true, "message": "Email open logged" }));
    let after_first = lookup(&app, &track.tracking_id.to_string()).await;

    send(&app, "POST", &uri, vec![("user-agent", "second")], None).await;
    let after_second = lookup(&app, &track.tracking_id.to_string()).await;

    assert_eq!(after_second["open_count"], 2);
    assert_eq!(after_second["opened_at"], after_first["opened_at"]);
    assert_eq!(after_second["user_agent"], "second");
  }

  #[tokio::test]
  async fn report_open_unknown_id_is_not_an_http_error() {
    let app = app().await;
    register(&app, "a@x.com", "Hi").await;

    let uri = format!("/track/open/{}", uuid::Uuid::new_v4());
    let resp = send(&app, "POST", &uri, vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());

    let all = body_json(send(&app, "GET", "/track/emails", vec![], None).await).await;
    assert_eq!(all[0]["open_count"], 0);
  }

  #[tokio::test]
  async fn report_open_malformed_id_is_not_an_http_error() {
    let app = app().await;
    let resp = send(&app, "POST", "/track/open/garbage", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "success": false, "message": "Tracking ID not found" }));
  }

  // ── Worked example ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_fetch_pixel_then_lookup() {
    let app = app().await;
    let r = register(&app, "a@x.com", "Hi").await;
    assert_eq!(r.open_count, 0);

    send(&app, "GET", &format!("/pixel/{}", r.tracking_id), vec![], None).await;

    let after = lookup(&app, &r.tracking_id.to_string()).await;
    assert_eq!(after["open_count"], 1);
    assert_eq!(after["is_opened"], true);
  }
}
