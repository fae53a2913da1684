//! Error type for a single remote request.

/// Error returned by one HTTP request (release listing page or asset download).
/// Kept separate from the sync errors so it can be classified for retries.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u32 },
    /// The request URL could not be built from configuration.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Response body was not the JSON we expected.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Writing the downloaded body to disk failed (e.g. disk full). Not retried.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    /// The blocking transfer task panicked or was cancelled.
    #[error("transfer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
