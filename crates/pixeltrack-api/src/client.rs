//! Request metadata recorded with each detected open.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{header, request::Parts},
};

/// Recorded when a request carries no `User-Agent` header.
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Recorded when neither a forwarded address nor a peer address is known.
pub const UNKNOWN_IP: &str = "unknown";

/// The caller's user agent and best-guess IP address.
///
/// The IP is taken from the first (leftmost) `X-Forwarded-For` entry, falling
/// back to the transport peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMeta {
  pub user_agent: String,
  pub ip_address: String,
}

impl<S> FromRequestParts<S> for ClientMeta
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let user_agent = parts
      .headers
      .get(header::USER_AGENT)
      .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
      .unwrap_or_else(|| UNKNOWN_USER_AGENT.to_owned());

    let forwarded = parts
      .headers
      .get("x-forwarded-for")
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.split(',').next())
      .map(str::trim)
      .filter(|ip| !ip.is_empty())
      .map(str::to_owned);

    let ip_address = match forwarded {
      Some(ip) => ip,
      // Also honours `MockConnectInfo` when no real peer address is attached.
      None => ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
        .await
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|_| UNKNOWN_IP.to_owned()),
    };

    Ok(Self { user_agent, ip_address })
  }
}
