use std::time::Duration;

use reqwest::StatusCode;

/// Failure below the HTTP layer: connect, TLS, timeout or reading the body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self(error.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstagramError {
    #[error("HTTP Error: {0}")]
    Transport(#[from] TransportError),

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("JSON Parse Error: {0}")]
    Decode(String),

    #[error("{0}")]
    Api(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Media container {container_id} failed with status {status}")]
    ContainerFailed { container_id: String, status: String },

    #[error("Media container {container_id} not finished after {waited:?}")]
    Timeout { container_id: String, waited: Duration },

    #[error("Waiting for media container {container_id} was cancelled")]
    Cancelled { container_id: String },

    #[error("Invalid media: {0}")]
    InvalidMedia(String),
}

pub type InstagramResult<T> = Result<T, InstagramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_keeps_status_and_body() {
        let error = InstagramError::Http {
            status: StatusCode::BAD_REQUEST,
            body: "bad things".to_string(),
        };

        assert_eq!(error.to_string(), "HTTP 400 Bad Request: bad things");
    }

    #[test]
    fn test_transport_error_converts() {
        let error: InstagramError = TransportError("connection reset".to_string()).into();

        assert!(matches!(error, InstagramError::Transport(_)));
        assert_eq!(error.to_string(), "HTTP Error: connection reset");
    }
}
