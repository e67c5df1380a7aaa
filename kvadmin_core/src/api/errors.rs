use thiserror::Error;

/// A central error enum for everything that goes through the gateway.
///
/// The three variants are deliberately coarse: callers only ever need to know
/// whether their session just died (`Unauthorized`), whether the server said
/// no (`Rejected`), or whether the request never completed (`Transport`).
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The backend answered 401. By the time a caller sees this, the gateway
    /// has already torn the session down.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backend processed the request and rejected it; the message is the
    /// server's own wording and is meant to be shown to the user verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Network, timeout, or (de)serialization failure below the envelope.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
