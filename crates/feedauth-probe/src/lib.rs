//! Live checks of whether the credentials npm would use for a feed actually
//! work.
//!
//! A probe asks the feed for the version of a single package through a
//! [`RegistryProbe`] and classifies the answer. There are no structured error
//! codes to go on, just whatever text the query printed, and each probe is
//! cut off after a fixed timeout ([`DEFAULT_TIMEOUT`] unless configured).

use std::time::Duration;

use feedauth_registry::Feed;

pub use npm::NpmProbe;
pub use outcome::{classify, AuthProbeResult, FailureReason, ProbeStatus};
pub use package::{ProbePackage, FALLBACK_PROBE_NAME, SCOPED_PROBE_NAME};
pub use query::{ProbeOutput, RegistryProbe};

mod npm;
mod outcome;
mod package;
mod query;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct FeedProber<P> {
    registry: P,
    timeout: Duration,
}

impl<P: RegistryProbe> FeedProber<P> {
    pub fn new(registry: P) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queries `feed` for its probe package and classifies the result.
    pub async fn probe(&self, feed: &Feed) -> AuthProbeResult {
        let package = ProbePackage::for_feed(feed);
        tracing::info!("probing {feed} with {}", package.name);
        let outcome = self
            .registry
            .query(&package.name, &feed.registry_url, self.timeout)
            .await;
        classify(&package, outcome)
    }
}
