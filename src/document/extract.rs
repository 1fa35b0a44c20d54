use std::collections::HashSet;

use crate::document::node::{
    DocumentNode, IMAGE_OBJ_TYPE, OBJ_TYPE_KEY, ObjectMap, PARAMS_KEY, SRC_KEY,
};

/// Collect the source identifier of every image reference reachable from `root`.
///
/// The walk is depth-first in document key order. Duplicates are kept; references whose `params`
/// or `src` is missing, empty or not a string are skipped.
#[tracing::instrument(skip(root))]
pub fn extract_image_sources(root: &DocumentNode) -> Vec<String> {
    let mut out = Vec::new();
    walk(root, &mut out);
    tracing::debug!(count = out.len(), "extracted image sources");
    out
}

/// Drop repeated identifiers, keeping the first occurrence of each.
pub fn unique_sources(sources: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(sources.len());
    sources
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect()
}

fn walk(node: &DocumentNode, out: &mut Vec<String>) {
    match node {
        DocumentNode::Leaf(_) => {}
        DocumentNode::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        DocumentNode::Object(map) => {
            for (key, child) in map {
                if !child.is_leaf() {
                    walk(child, out);
                    continue;
                }
                if key == OBJ_TYPE_KEY && child.as_text() == Some(IMAGE_OBJ_TYPE) {
                    if let Some(src) = image_src(map) {
                        out.push(src.to_string());
                    }
                }
            }
        }
    }
}

fn image_src(map: &ObjectMap) -> Option<&str> {
    map.get(PARAMS_KEY)?
        .get(SRC_KEY)?
        .as_text()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "../../tests/unit/document/extract.rs"]
mod tests;
