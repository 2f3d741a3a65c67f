//! Cloud adapter error types.

use heatlink_domain::error::HeatlinkError;

/// Errors specific to the vendor cloud adapter.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The HTTP client returned an error (transport, timeout, TLS).
    #[error("cloud request failed")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("cloud answered {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL, without query parameters.
        url: String,
    },

    /// The token endpoint rejected the refresh request.
    #[error("token refresh rejected: {0}")]
    TokenRefresh(String),
}

impl CloudError {
    /// Whether a retry after a forced token refresh may succeed.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

impl From<CloudError> for HeatlinkError {
    fn from(err: CloudError) -> Self {
        HeatlinkError::Cloud(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_status_error_with_url() {
        let err = CloudError::Status {
            status: 429,
            url: "https://api.example.com/features".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cloud answered 429 for https://api.example.com/features"
        );
    }

    #[test]
    fn should_detect_unauthorized_status() {
        let err = CloudError::Status {
            status: 401,
            url: String::new(),
        };
        assert!(err.is_unauthorized());
        assert!(!CloudError::TokenRefresh("nope".to_string()).is_unauthorized());
    }

    #[test]
    fn should_convert_into_domain_cloud_error() {
        let err: HeatlinkError = CloudError::TokenRefresh("expired".to_string()).into();
        assert!(matches!(err, HeatlinkError::Cloud(_)));
    }
}
