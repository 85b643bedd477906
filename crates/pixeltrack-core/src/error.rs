//! Error types for `pixeltrack-core`.

use thiserror::Error;

/// Failure modes of the open-detection transition.
///
/// `NotFound` is a policy signal rather than a fault: each caller decides
/// whether an unknown tracking id is worth reporting.
#[derive(Debug, Error)]
pub enum OpenError<E>
where
  E: std::error::Error + 'static,
{
  #[error("tracking id not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] E),
}
