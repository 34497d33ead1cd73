//! HTTP catalog clients
//!
//! - [`spotify::SpotifyClient`]: source session (Spotify Web API)
//! - [`youtube::YouTubeClient`]: destination session (YouTube Data API v3)
//!
//! Both speak JSON over reqwest with a bearer token. Wire concerns stay in
//! this module; the pipeline only sees the session traits.

pub mod spotify;
pub mod youtube;

pub use spotify::SpotifyClient;
pub use youtube::YouTubeClient;

use crate::types::CatalogError;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Longest provider error text kept in an error message
const MAX_ERROR_BODY: usize = 300;

/// Build the shared HTTP client (User-Agent set, reqwest default timeouts)
pub(crate) fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut headers = header::HeaderMap::new();
    if let Ok(value) = header::HeaderValue::from_str(&songshift_common::config::get_user_agent()) {
        headers.insert(header::USER_AGENT, value);
    }

    Client::builder().default_headers(headers).build()
}

/// Send a request and decode a JSON success body
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CatalogError> {
    let response = request
        .send()
        .await
        .map_err(|e| CatalogError::Network(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = %status, error = %e, "Could not read error response body");
                String::new()
            }
        };
        return Err(status_error(status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CatalogError::Parse(format!("unexpected response body: {}", e)))
}

/// Provider error envelope: `{"error": {"message": .., "errors": [{"reason": ..}]}}`
///
/// Spotify and Google both nest the detail under `error`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// Turn a non-success status and its body into a [`CatalogError`]
///
/// Provider reason codes are kept at the front of the message
/// (`"videoNotFound: Video not found."`) so callers can classify them.
pub(crate) fn status_error(status: StatusCode, body: &str) -> CatalogError {
    let (reasons, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reasons: Vec<String> = envelope
                .error
                .errors
                .into_iter()
                .filter_map(|d| d.reason)
                .collect();
            (reasons, envelope.error.message.unwrap_or_default())
        }
        Err(_) => (Vec::new(), body.chars().take(MAX_ERROR_BODY).collect()),
    };

    let message = if reasons.is_empty() {
        message
    } else {
        format!("{}: {}", reasons.join(","), message)
    };

    let quota = reasons.iter().any(|r| {
        matches!(
            r.as_str(),
            "quotaExceeded" | "rateLimitExceeded" | "userRateLimitExceeded"
        )
    });

    match status {
        StatusCode::UNAUTHORIZED => CatalogError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited(message),
        StatusCode::FORBIDDEN if quota => CatalogError::RateLimited(message),
        _ => CatalogError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
