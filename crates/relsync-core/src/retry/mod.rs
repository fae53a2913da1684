//! Retry and backoff for remote requests.
//!
//! Individual HTTP requests (release listing pages, asset downloads) are
//! retried on transient failures. A failed sync pass as a whole is never
//! retried here; the next trigger starts a fresh pass.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
