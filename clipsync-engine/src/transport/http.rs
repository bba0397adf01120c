//! HTTP transport.
//!
//! Talks to a server exposing one document per account: `GET <url>`
//! returns the current entry as JSON (204/404 when the server holds
//! nothing yet), `PUT <url>` replaces it. Authentication is HTTP basic
//! auth from the [`ServerConfig`] credentials.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use clipsync_types::{ClipboardEntry, ServerConfig};

use super::{RemoteLatest, Transport, TransportError};

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport whose individual requests time out after
    /// `request_timeout`.
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Unreachable(format!("http client init: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_remote_latest(
        &self,
        config: &ServerConfig,
    ) -> Result<Option<RemoteLatest>, TransportError> {
        let response = self
            .client
            .get(&config.url)
            .basic_auth(&config.username, Some(&config.password))
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if let Some(error) = classify_status(status) {
            return Err(error);
        }

        let remote: RemoteLatest = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        Ok(Some(remote))
    }

    async fn push_local_latest(
        &self,
        config: &ServerConfig,
        entry: &ClipboardEntry,
    ) -> Result<(), TransportError> {
        let body = RemoteLatest {
            content: entry.content.clone(),
            timestamp_ms: entry.timestamp_ms,
            source_device: entry.source_device.clone(),
        };

        let response = self
            .client
            .put(&config.url)
            .basic_auth(&config.username, Some(&config.password))
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        match classify_status(response.status()) {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}

/// Map a non-success status to its transport error; `None` for success.
fn classify_status(status: StatusCode) -> Option<TransportError> {
    if status.is_success() {
        return None;
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(TransportError::Unauthorized),
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNPROCESSABLE_ENTITY => {
            Some(TransportError::Rejected(format!("status {}", status)))
        }
        other => Some(TransportError::Malformed(format!(
            "unexpected status {}",
            other
        ))),
    }
}

/// Classify a reqwest failure by layer.
fn map_request_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_decode() {
        TransportError::Malformed(error.to_string())
    } else {
        // Connection refused, DNS failure, TLS failure: the server never
        // answered.
        TransportError::Unreachable(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_are_not_errors() {
        assert!(classify_status(StatusCode::OK).is_none());
        assert!(classify_status(StatusCode::CREATED).is_none());
    }

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            Some(TransportError::Unauthorized)
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            Some(TransportError::Unauthorized)
        ));
    }

    #[test]
    fn size_statuses_map_to_rejected() {
        assert!(matches!(
            classify_status(StatusCode::PAYLOAD_TOO_LARGE),
            Some(TransportError::Rejected(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY),
            Some(TransportError::Rejected(_))
        ));
    }

    #[test]
    fn other_statuses_map_to_malformed() {
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Some(TransportError::Malformed(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            Some(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn transport_builds_with_timeout() {
        let transport = HttpTransport::new(Duration::from_secs(5));
        assert!(transport.is_ok());
    }
}
