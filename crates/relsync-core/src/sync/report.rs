use std::fmt;

/// A release whose processing failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    pub release: String,
    pub error: String,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Releases returned by the feed.
    pub releases_seen: usize,
    /// Pre-releases left out because pre-release sync is off.
    pub releases_skipped: usize,
    /// Versions registered this pass, oldest first.
    pub synced: Vec<String>,
    pub failed: Vec<ReleaseFailure>,
    /// Assets fetched over the network.
    pub downloads: usize,
    /// Assets served from the local cache.
    pub cache_hits: usize,
    /// Version the `latest` channel points at after the pass.
    pub latest: Option<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} release(s) seen, {} skipped, {} synced, {} failed; {} download(s), {} cache hit(s); latest: {}",
            self.releases_seen,
            self.releases_skipped,
            self.synced.len(),
            self.failed.len(),
            self.downloads,
            self.cache_hits,
            self.latest.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line() {
        let report = SyncReport {
            releases_seen: 3,
            releases_skipped: 1,
            synced: vec!["1.0.0".into()],
            failed: vec![ReleaseFailure {
                release: "v1.1.0".into(),
                error: "sha256 mismatch".into(),
            }],
            downloads: 2,
            cache_hits: 1,
            latest: Some("1.0.0".into()),
        };
        assert_eq!(
            report.to_string(),
            "3 release(s) seen, 1 skipped, 1 synced, 1 failed; 2 download(s), 1 cache hit(s); latest: 1.0.0"
        );
        assert!(!report.is_clean());
        assert!(SyncReport::default().is_clean());
    }
}
