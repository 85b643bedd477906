//! The `TrackingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `pixeltrack-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  email::{EmailTrack, EmailTrackUpdate, TrackingId},
  status::StatusCheck,
};

/// Upper bound on the number of records any list operation returns.
pub const MAX_LIST_LIMIT: usize = 1000;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`TrackingStore::list_email_tracks`].
///
/// Results are always ordered by `sent_at`, newest first.
#[derive(Debug, Clone, Default)]
pub struct EmailTrackQuery {
  /// Exact-match filter on `sender_email`.
  pub sender_email: Option<String>,
  /// Defaults to, and is capped at, [`MAX_LIST_LIMIT`].
  pub limit:        Option<usize>,
}

impl EmailTrackQuery {
  pub fn effective_limit(&self) -> usize {
    self.limit.map_or(MAX_LIST_LIMIT, |l| l.min(MAX_LIST_LIMIT))
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a pixeltrack storage backend.
///
/// The store holds no business logic. Every call is independent; the only
/// atomicity guarantee is that a single [`update_fields`] call applies its
/// whole field map to one record at once.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
///
/// [`update_fields`]: TrackingStore::update_fields
pub trait TrackingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tracked emails ────────────────────────────────────────────────────

  /// Persist a newly registered record.
  fn insert_email_track<'a>(
    &'a self,
    track: &'a EmailTrack,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Exact-match lookup by tracking id. Returns `None` if not found.
  fn get_email_track(
    &self,
    tracking_id: TrackingId,
  ) -> impl Future<Output = Result<Option<EmailTrack>, Self::Error>> + Send + '_;

  /// List records matching `query`, newest `sent_at` first.
  fn list_email_tracks<'a>(
    &'a self,
    query: &'a EmailTrackQuery,
  ) -> impl Future<Output = Result<Vec<EmailTrack>, Self::Error>> + Send + 'a;

  /// Apply `update` to the record with `tracking_id` as one atomic write.
  ///
  /// Returns `false` (not an error) when no record matches. Increments and
  /// set-if-empty stamps are evaluated against the stored row, never against
  /// a value the caller read earlier.
  fn update_fields(
    &self,
    tracking_id: TrackingId,
    update: EmailTrackUpdate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Status checks ─────────────────────────────────────────────────────

  fn insert_status_check<'a>(
    &'a self,
    check: &'a StatusCheck,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Return up to `limit` status checks (capped at [`MAX_LIST_LIMIT`]), in
  /// no particular order.
  fn list_status_checks(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<StatusCheck>, Self::Error>> + Send + '_;
}
