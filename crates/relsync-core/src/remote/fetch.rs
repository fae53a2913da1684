//! Asset downloads over libcurl.

use async_trait::async_trait;
use std::path::Path;

use super::http;
use super::AssetFetcher;
use crate::retry::{run_with_retry, FetchError, RetryPolicy};
use crate::storage;

/// Downloads each asset to `<dest>.part` and renames it into place once the
/// transfer finished with a 2xx status.
#[derive(Debug, Clone, Copy)]
pub struct CurlFetcher {
    retry: RetryPolicy,
}

impl CurlFetcher {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[async_trait]
impl AssetFetcher for CurlFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let tmp = storage::temp_path(dest);
        let what = format!("download {url}");
        let result = run_with_retry(&self.retry, &what, || {
            let url = url.to_string();
            let tmp = tmp.clone();
            async move { tokio::task::spawn_blocking(move || http::get_to_file(&url, &tmp)).await? }
        })
        .await;

        match result {
            Ok(written) => {
                storage::finalize(&tmp, dest).await?;
                tracing::debug!(url, dest = %dest.display(), bytes = written, "asset downloaded");
                Ok(written)
            }
            Err(e) => {
                storage::discard(&tmp).await;
                Err(e)
            }
        }
    }
}
