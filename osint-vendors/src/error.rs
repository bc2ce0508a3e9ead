//! Error types for vendor requests

use thiserror::Error;

use osint_core::{AdapterError, AdapterErrorKind, VendorId};

/// Errors that can occur while fetching from a vendor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Vendor answered with a non-2xx status
    #[error("API error (status {status}): {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Connection, TLS or body transfer failed
    #[error("Request failed: {0}")]
    Network(String),

    /// The HTTP client gave up waiting
    #[error("Request timed out")]
    Timeout,

    /// No API key configured for a vendor that requires one
    #[error("No credentials configured for {0}")]
    MissingCredentials(VendorId),

    /// The request could not be built from the endpoint template
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response body exceeded the size cap
    #[error("Response body larger than {0} bytes")]
    BodyTooLarge(usize),
}

impl From<FetchError> for AdapterError {
    fn from(err: FetchError) -> Self {
        let message = err.to_string();
        match err {
            FetchError::Http { status, .. } => AdapterError::http(Some(status), message),
            FetchError::Network(_) => AdapterError::http(None, message),
            FetchError::Timeout => AdapterError::timeout(message),
            FetchError::MissingCredentials(_) | FetchError::InvalidRequest(_) => {
                AdapterError::configuration(message)
            }
            FetchError::BodyTooLarge(_) => {
                AdapterError::new(AdapterErrorKind::MalformedResponse, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_status() {
        let err: AdapterError = FetchError::Http {
            status: 403,
            body: "{\"error\":\"subscription required\"}".to_string(),
        }
        .into();
        assert_eq!(err.kind, AdapterErrorKind::Http);
        assert_eq!(err.status, Some(403));
        assert!(err.message.contains("subscription required"));
    }

    #[test]
    fn test_missing_credentials_is_configuration() {
        let err: AdapterError = FetchError::MissingCredentials(VendorId::Shodan).into();
        assert_eq!(err.kind, AdapterErrorKind::Configuration);
        assert_eq!(err.status, None);
    }
}
