use std::{
    collections::HashSet,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use crate::{
    assets::{
        fetch::ImageFetcher,
        resolve::{AssetResolver, ResolveOpts},
    },
    document::{
        extract::{extract_image_sources, unique_sources},
        node::DocumentNode,
    },
    foundation::error::{PackError, PackResult},
    pipeline::{
        enrich::{EnrichedDocument, enrich, existing_image_sources},
        fanout::{ResolveStats, resolve_all},
    },
};

/// Consumer of enriched documents (the rendering engine boundary).
///
/// The pipeline hands each document over once and only checks whether the engine succeeded.
pub trait RenderEngine: Send {
    /// Consume one enriched document.
    fn run(&mut self, doc: &EnrichedDocument) -> PackResult<()>;
}

/// Engine that writes the enriched document as pretty JSON to a file.
#[derive(Clone, Debug)]
pub struct JsonFileEngine {
    out_path: PathBuf,
}

impl JsonFileEngine {
    /// Write to `out_path`, creating parent directories as needed.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
        }
    }
}

impl RenderEngine for JsonFileEngine {
    fn run(&mut self, doc: &EnrichedDocument) -> PackResult<()> {
        let path = &self.out_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PackError::render(format!("create output dir '{}': {e}", parent.display()))
            })?;
        }
        let f = File::create(path)
            .map_err(|e| PackError::render(format!("create '{}': {e}", path.display())))?;
        let mut w = BufWriter::new(f);
        doc.root().to_writer_pretty(&mut w)?;
        w.flush()
            .map_err(|e| PackError::render(format!("flush '{}': {e}", path.display())))
    }
}

/// In-memory engine for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    docs: Vec<EnrichedDocument>,
}

impl InMemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents received so far, in arrival order.
    pub fn documents(&self) -> &[EnrichedDocument] {
        &self.docs
    }
}

impl RenderEngine for InMemoryEngine {
    fn run(&mut self, doc: &EnrichedDocument) -> PackResult<()> {
        self.docs.push(doc.clone());
        Ok(())
    }
}

/// Options for [`prepare_document`] and [`create_document`].
#[derive(Clone, Debug, Default)]
pub struct PipelineOpts {
    /// Resolver settings.
    pub resolve: ResolveOpts,
    /// Skip sources that already have a payload in the document's image data map.
    pub skip_existing: bool,
}

/// Output of [`prepare_document`].
#[derive(Clone, Debug)]
pub struct PreparedDocument {
    /// Augmented document.
    pub document: EnrichedDocument,
    /// Every extracted source in document order, duplicates included.
    pub sources: Vec<String>,
    /// Counters for the resolutions that were run.
    pub stats: ResolveStats,
}

/// Extract, resolve and merge every image referenced by `root`.
///
/// Each distinct source is resolved once. Per-image failures only leave that image out of the
/// maps; the only error paths are a root that cannot carry the maps and the caller's own input.
#[tracing::instrument(skip_all)]
pub async fn prepare_document(
    root: &DocumentNode,
    fetcher: Arc<dyn ImageFetcher>,
    opts: &PipelineOpts,
) -> PackResult<PreparedDocument> {
    if root.as_object().is_none() {
        return Err(PackError::validation(
            "document root must be an object to carry image maps",
        ));
    }
    let sources = extract_image_sources(root);
    let mut pending = unique_sources(&sources);
    if opts.skip_existing {
        let existing: HashSet<String> = existing_image_sources(root).into_iter().collect();
        pending.retain(|s| !existing.contains(s));
    }
    tracing::info!(
        references = sources.len(),
        pending = pending.len(),
        "resolving image references"
    );

    let resolver = AssetResolver::new(fetcher, opts.resolve.clone());
    let resolved = resolve_all(&resolver, &pending).await;
    let stats = ResolveStats::tally(&resolved);
    let document = enrich(root, &resolved)?;

    Ok(PreparedDocument {
        document,
        sources,
        stats,
    })
}

/// Prepare `root` and hand the enriched document to `engine`.
///
/// Engine failures propagate to the caller.
pub async fn create_document(
    root: &DocumentNode,
    fetcher: Arc<dyn ImageFetcher>,
    opts: &PipelineOpts,
    engine: &mut dyn RenderEngine,
) -> PackResult<ResolveStats> {
    let prepared = prepare_document(root, fetcher, opts).await?;
    if let Err(e) = engine.run(&prepared.document) {
        tracing::error!(error = %e, "render engine failed");
        return Err(e);
    }
    Ok(prepared.stats)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/dispatch.rs"]
mod tests;
