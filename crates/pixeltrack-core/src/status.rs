//! Status checks — a liveness record unrelated to email tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
  pub id:          Uuid,
  pub client_name: String,
  pub timestamp:   DateTime<Utc>,
}

impl StatusCheck {
  pub fn new(client_name: String, now: DateTime<Utc>) -> Self {
    Self { id: Uuid::new_v4(), client_name, timestamp: now }
  }
}
