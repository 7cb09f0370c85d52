use thiserror::Error;

/// Everything that can cut a refresh cycle short.
///
/// `Cancelled` is not a real failure: it marks work torn down because a
/// newer cycle superseded it or the watcher is shutting down, and it is
/// never counted or shown.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("location permission has not been granted")]
    PermissionDenied,

    #[error("no position fix is available")]
    LocationUnavailable,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Http(reqwest::StatusCode),

    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no place found for these coordinates")]
    EmptyResult,

    #[error("cycle cancelled")]
    Cancelled,
}

impl FetchError {
    /// True for outcomes that should be counted and shown as failures.
    /// Cancellation is bookkeeping, not weather going wrong.
    pub fn is_failure(&self) -> bool {
        !matches!(self, FetchError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_not_a_failure() {
        assert!(!FetchError::Cancelled.is_failure());
        assert!(FetchError::LocationUnavailable.is_failure());
        assert!(FetchError::Http(reqwest::StatusCode::UNAUTHORIZED).is_failure());
    }

    #[test]
    fn http_error_names_the_status() {
        let err = FetchError::Http(reqwest::StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("401"));
    }
}
