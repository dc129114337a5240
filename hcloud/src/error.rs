use thiserror::Error;

/// Failures surfaced by the hcloud API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network, TLS, or timeout failure before a response was read
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("hcloud API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: 423,
            body: "firewall is locked".to_string(),
        };
        assert_eq!(err.to_string(), "hcloud API error 423: firewall is locked");
    }

    #[test]
    fn test_decode_error_display() {
        let err = serde_json::from_str::<u64>("\"not a number\"").unwrap_err();
        let err = ApiError::from(err);
        assert!(err.to_string().starts_with("unexpected response shape"));
    }
}
