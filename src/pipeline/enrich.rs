use crate::{
    assets::{decode::decode_base64_payload, resolve::ResolvedAsset},
    document::node::{DocumentNode, ObjectMap, Scalar},
    foundation::error::{PackError, PackResult},
};

/// Root field holding base64 JPEG payloads keyed by source identifier.
pub const IMAGE_DATA_KEY: &str = "image_data";
/// Root field holding intrinsic widths keyed by source identifier.
pub const IMAGE_WIDTHS_KEY: &str = "image_widths";
/// Root field holding intrinsic heights keyed by source identifier.
pub const IMAGE_HEIGHTS_KEY: &str = "image_heights";

/// Image bytes and size as a renderer consumes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Raw JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Width in pixels, `0` when the document carries no width entry.
    pub width: u32,
    /// Height in pixels, `0` when the document carries no height entry.
    pub height: u32,
}

/// Document tree augmented with resolved image data keyed by source identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedDocument {
    root: DocumentNode,
}

impl EnrichedDocument {
    /// Borrow the augmented tree, lookup maps included.
    pub fn root(&self) -> &DocumentNode {
        &self.root
    }

    /// Take ownership of the augmented tree.
    pub fn into_root(self) -> DocumentNode {
        self.root
    }

    /// Sources that have a payload entry, in map order.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.field(IMAGE_DATA_KEY)
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Base64 payload for `source`.
    pub fn image_payload(&self, source: &str) -> Option<&str> {
        self.field(IMAGE_DATA_KEY)?.get(source)?.as_text()
    }

    /// Width entry for `source`.
    pub fn image_width(&self, source: &str) -> Option<u32> {
        self.field(IMAGE_WIDTHS_KEY)?
            .get(source)
            .and_then(as_dimension)
    }

    /// Height entry for `source`.
    pub fn image_height(&self, source: &str) -> Option<u32> {
        self.field(IMAGE_HEIGHTS_KEY)?
            .get(source)
            .and_then(as_dimension)
    }

    /// Look up the image for `source` the way a renderer does.
    ///
    /// A missing payload means "no image available" and yields `Ok(None)`; only a payload that is
    /// not valid base64 is an error.
    pub fn image(&self, source: &str) -> PackResult<Option<EmbeddedImage>> {
        let Some(payload) = self.image_payload(source) else {
            return Ok(None);
        };
        Ok(Some(EmbeddedImage {
            jpeg: decode_base64_payload(payload)?,
            width: self.image_width(source).unwrap_or(0),
            height: self.image_height(source).unwrap_or(0),
        }))
    }

    fn field(&self, key: &str) -> Option<&ObjectMap> {
        self.root.get(key)?.as_object()
    }
}

/// Attach successful entries of `resolved` to a copy of `root`.
///
/// Failed resolutions get no entry in any of the three maps. Entries already present on `root`
/// are kept unless a resolved entry with the same source replaces them; among duplicate resolved
/// sources the later one wins. The caller's tree is not modified.
#[tracing::instrument(skip_all, fields(resolved = resolved.len()))]
pub fn enrich(root: &DocumentNode, resolved: &[ResolvedAsset]) -> PackResult<EnrichedDocument> {
    let DocumentNode::Object(fields) = root else {
        return Err(PackError::validation(
            "document root must be an object to carry image maps",
        ));
    };

    let mut fields = fields.clone();
    let mut data = take_map(&mut fields, IMAGE_DATA_KEY);
    let mut widths = take_map(&mut fields, IMAGE_WIDTHS_KEY);
    let mut heights = take_map(&mut fields, IMAGE_HEIGHTS_KEY);

    for asset in resolved {
        let Some(img) = asset.image() else {
            continue;
        };
        data.insert(asset.source.clone(), DocumentNode::text(img.jpeg_base64.clone()));
        widths.insert(asset.source.clone(), DocumentNode::uint(img.width.into()));
        heights.insert(asset.source.clone(), DocumentNode::uint(img.height.into()));
    }
    tracing::debug!(entries = data.len(), "image maps attached");

    fields.insert(IMAGE_DATA_KEY.to_string(), DocumentNode::Object(data));
    fields.insert(IMAGE_WIDTHS_KEY.to_string(), DocumentNode::Object(widths));
    fields.insert(IMAGE_HEIGHTS_KEY.to_string(), DocumentNode::Object(heights));

    Ok(EnrichedDocument {
        root: DocumentNode::Object(fields),
    })
}

/// Sources that already carry a non-empty payload in `root`'s image data map.
pub fn existing_image_sources(root: &DocumentNode) -> Vec<String> {
    let Some(map) = root.get(IMAGE_DATA_KEY).and_then(DocumentNode::as_object) else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| v.as_text().is_some_and(|s| !s.is_empty()))
        .map(|(k, _)| k.clone())
        .collect()
}

// Non-object values under a map key are discarded.
fn take_map(fields: &mut ObjectMap, key: &str) -> ObjectMap {
    match fields.get_mut(key) {
        Some(DocumentNode::Object(map)) => std::mem::take(map),
        _ => ObjectMap::new(),
    }
}

fn as_dimension(node: &DocumentNode) -> Option<u32> {
    let DocumentNode::Leaf(Scalar::Number(n)) = node else {
        return None;
    };
    if let Some(v) = n.as_u64() {
        return u32::try_from(v).ok();
    }
    n.as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f64)
        .map(|f| f.round() as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/enrich.rs"]
mod tests;
