use std::{sync::Arc, time::Duration};

use tokio::sync::OwnedSemaphorePermit;

use crate::assets::{
    decode::{EncodedImage, JPEG_QUALITY_DEFAULT, transcode_to_jpeg},
    fetch::ImageFetcher,
};

/// Options controlling how image sources are resolved.
#[derive(Clone, Debug)]
pub struct ResolveOpts {
    /// Upper bound on resolutions in flight at once. `0` is treated as `1`.
    pub max_in_flight: usize,
    /// Deadline for one resolution (fetch + decode + encode). A stalled load fails with
    /// [`FailureKind::Timeout`].
    pub timeout: Duration,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for ResolveOpts {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            timeout: Duration::from_secs(30),
            jpeg_quality: JPEG_QUALITY_DEFAULT,
        }
    }
}

/// Coarse outcome of a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    /// Bytes were fetched, decoded and re-encoded.
    Success,
    /// The source could not be turned into an image.
    Error,
}

/// Why a resolution failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The bytes could not be loaded (network, file system, bad path or data URL).
    Fetch,
    /// The bytes were not a decodable image, or JPEG encoding failed.
    Decode,
    /// The resolution did not finish within [`ResolveOpts::timeout`].
    Timeout,
    /// The worker running the resolution panicked or was cancelled.
    Aborted,
}

/// Failure detail carried by a failed [`ResolvedAsset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable reason, for logs.
    pub reason: String,
}

impl ResolveFailure {
    /// Build a failure of `kind`.
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result of resolving one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Normalized JPEG plus intrinsic dimensions.
    Ready(EncodedImage),
    /// No image could be produced.
    Failed(ResolveFailure),
}

/// Outcome of attempting to fetch and decode one source identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Source identifier exactly as it appeared in the document.
    pub source: String,
    /// Success payload or failure detail.
    pub outcome: AssetOutcome,
}

impl ResolvedAsset {
    /// Build a successful result.
    pub fn ready(source: impl Into<String>, image: EncodedImage) -> Self {
        Self {
            source: source.into(),
            outcome: AssetOutcome::Ready(image),
        }
    }

    /// Build a failed result.
    pub fn failed(source: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            outcome: AssetOutcome::Failed(ResolveFailure::new(kind, reason)),
        }
    }

    /// Success or error.
    pub fn status(&self) -> AssetStatus {
        match self.outcome {
            AssetOutcome::Ready(_) => AssetStatus::Success,
            AssetOutcome::Failed(_) => AssetStatus::Error,
        }
    }

    /// Encoded image, when resolution succeeded.
    pub fn image(&self) -> Option<&EncodedImage> {
        match &self.outcome {
            AssetOutcome::Ready(img) => Some(img),
            AssetOutcome::Failed(_) => None,
        }
    }

    /// Failure detail, when resolution failed.
    pub fn failure(&self) -> Option<&ResolveFailure> {
        match &self.outcome {
            AssetOutcome::Ready(_) => None,
            AssetOutcome::Failed(f) => Some(f),
        }
    }

    /// Base64 JPEG payload, absent on failure.
    pub fn encoded_bytes(&self) -> Option<&str> {
        self.image().map(|img| img.jpeg_base64.as_str())
    }

    /// Intrinsic width, absent on failure.
    pub fn width(&self) -> Option<u32> {
        self.image().map(|img| img.width)
    }

    /// Intrinsic height, absent on failure.
    pub fn height(&self) -> Option<u32> {
        self.image().map(|img| img.height)
    }
}

/// Turns source identifiers into normalized JPEG assets.
///
/// Resolution never returns an error: every failure is captured in the returned
/// [`ResolvedAsset`], so one broken image cannot affect any other.
#[derive(Clone)]
pub struct AssetResolver {
    fetcher: Arc<dyn ImageFetcher>,
    opts: ResolveOpts,
}

impl std::fmt::Debug for AssetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResolver")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl AssetResolver {
    /// Build a resolver loading bytes through `fetcher`.
    pub fn new(fetcher: Arc<dyn ImageFetcher>, opts: ResolveOpts) -> Self {
        Self { fetcher, opts }
    }

    /// Options this resolver was built with.
    pub fn opts(&self) -> &ResolveOpts {
        &self.opts
    }

    /// Fetch, decode and re-encode `source`.
    ///
    /// The blocking work runs on Tokio's blocking pool, so this must be awaited inside a Tokio
    /// runtime.
    pub async fn resolve(&self, source: &str) -> ResolvedAsset {
        self.resolve_in_slot(source, None).await
    }

    /// Like [`AssetResolver::resolve`], but `slot` is released only when the blocking load
    /// returns, even if the deadline already produced a [`FailureKind::Timeout`].
    #[tracing::instrument(skip(self, slot))]
    pub(crate) async fn resolve_in_slot(
        &self,
        source: &str,
        slot: Option<OwnedSemaphorePermit>,
    ) -> ResolvedAsset {
        let fetcher = Arc::clone(&self.fetcher);
        let owned = source.to_string();
        let quality = self.opts.jpeg_quality;
        let work = tokio::task::spawn_blocking(move || {
            let _slot = slot;
            let bytes = fetcher
                .fetch(&owned)
                .map_err(|e| ResolveFailure::new(FailureKind::Fetch, e.to_string()))?;
            transcode_to_jpeg(&bytes, quality)
                .map_err(|e| ResolveFailure::new(FailureKind::Decode, e.to_string()))
        });

        let outcome = match tokio::time::timeout(self.opts.timeout, work).await {
            Ok(Ok(Ok(image))) => AssetOutcome::Ready(image),
            Ok(Ok(Err(failure))) => AssetOutcome::Failed(failure),
            Ok(Err(join_err)) => AssetOutcome::Failed(ResolveFailure::new(
                FailureKind::Aborted,
                format!("resolution worker stopped: {join_err}"),
            )),
            Err(_) => AssetOutcome::Failed(ResolveFailure::new(
                FailureKind::Timeout,
                format!("no result after {} ms", self.opts.timeout.as_millis()),
            )),
        };

        match &outcome {
            AssetOutcome::Ready(img) => {
                tracing::debug!(width = img.width, height = img.height, "image resolved");
            }
            AssetOutcome::Failed(f) => {
                tracing::warn!(kind = ?f.kind, reason = %f.reason, "image resolution failed");
            }
        }

        ResolvedAsset {
            source: source.to_string(),
            outcome,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolve.rs"]
mod tests;
