use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::assets::resolve::{AssetResolver, AssetStatus, ResolvedAsset};

/// Aggregated resolution counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Sources submitted for resolution.
    pub requested: usize,
    /// Sources that produced an image.
    pub succeeded: usize,
    /// Sources that failed.
    pub failed: usize,
}

impl ResolveStats {
    /// Count outcomes in `resolved`.
    pub fn tally(resolved: &[ResolvedAsset]) -> Self {
        let succeeded = resolved
            .iter()
            .filter(|r| r.status() == AssetStatus::Success)
            .count();
        Self {
            requested: resolved.len(),
            succeeded,
            failed: resolved.len() - succeeded,
        }
    }
}

/// Resolve every entry of `sources` concurrently.
///
/// Output position `i` always holds the result for `sources[i]`, whatever order the loads finish
/// in. At most [`ResolveOpts::max_in_flight`](crate::ResolveOpts::max_in_flight) loads run at
/// once. A load that outlives its deadline is reported as timed out but keeps its slot until it
/// actually returns, so stalled loads never push the pool past the cap.
#[tracing::instrument(skip_all, fields(count = sources.len()))]
pub async fn resolve_all(resolver: &AssetResolver, sources: &[String]) -> Vec<ResolvedAsset> {
    let permits = Arc::new(Semaphore::new(resolver.opts().max_in_flight.max(1)));

    let resolved = join_all(sources.iter().map(|source| {
        let permits = Arc::clone(&permits);
        async move {
            // Never closed, so acquire cannot fail.
            let slot = permits.acquire_owned().await.ok();
            resolver.resolve_in_slot(source, slot).await
        }
    }))
    .await;

    let stats = ResolveStats::tally(&resolved);
    tracing::info!(
        requested = stats.requested,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "image sources resolved"
    );
    resolved
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/fanout.rs"]
mod tests;
