//! packdoc prepares JSON document trees for the pack renderer by embedding every referenced image.
//!
//! # Pipeline overview
//!
//! 1. **Extract**: `DocumentNode -> Vec<String>` (every `params.src` of an `obj_type: "Image"` node)
//! 2. **Resolve**: fetch, decode and re-encode each distinct source as a baseline JPEG,
//!    concurrently and with a bounded number of loads in flight
//! 3. **Enrich**: attach `image_data` / `image_widths` / `image_heights` maps keyed by source
//! 4. **Dispatch**: hand the [`EnrichedDocument`] to a [`RenderEngine`]
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Per-image isolation**: a broken image never fails the pipeline; it is simply absent from
//!   the maps.
//! - **Deterministic output**: extraction follows document key order and resolution results keep
//!   input order regardless of completion order.
//! - **No in-place mutation**: enrichment returns a new tree.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod document;
mod foundation;
mod pipeline;

pub use assets::decode::{
    EncodedImage, JPEG_QUALITY_DEFAULT, decode_base64_payload, strip_data_uri, transcode_to_jpeg,
};
pub use assets::fetch::{
    DEFAULT_USER_AGENT, FetchOpts, ImageFetcher, SourceFetcher, normalize_rel_path,
};
pub use assets::resolve::{
    AssetOutcome, AssetResolver, AssetStatus, FailureKind, ResolveFailure, ResolveOpts,
    ResolvedAsset,
};
pub use document::extract::{extract_image_sources, unique_sources};
pub use document::node::{
    DocumentNode, IMAGE_OBJ_TYPE, OBJ_TYPE_KEY, ObjectMap, PARAMS_KEY, SRC_KEY, Scalar,
};
pub use foundation::error::{PackError, PackResult};
pub use pipeline::dispatch::{
    InMemoryEngine, JsonFileEngine, PipelineOpts, PreparedDocument, RenderEngine, create_document,
    prepare_document,
};
pub use pipeline::enrich::{
    EmbeddedImage, EnrichedDocument, IMAGE_DATA_KEY, IMAGE_HEIGHTS_KEY, IMAGE_WIDTHS_KEY, enrich,
    existing_image_sources,
};
pub use pipeline::fanout::{ResolveStats, resolve_all};
