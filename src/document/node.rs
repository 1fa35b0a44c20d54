use std::{fs::File, io::BufReader, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{PackError, PackResult};

/// Key whose leaf value names the kind of a document object.
pub const OBJ_TYPE_KEY: &str = "obj_type";
/// `obj_type` value marking an embedded image.
pub const IMAGE_OBJ_TYPE: &str = "Image";
/// Key of the parameter object attached to a document object.
pub const PARAMS_KEY: &str = "params";
/// Key inside `params` holding the image source identifier.
pub const SRC_KEY: &str = "src";

/// Object payload of a [`DocumentNode`], iterated in document key order.
pub type ObjectMap = IndexMap<String, DocumentNode>;

/// Primitive value stored at a leaf of the document tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number, kept in its parsed form so integers round-trip exactly.
    Number(serde_json::Number),
    /// JSON string.
    Text(String),
}

/// A node of the caller-supplied document tree.
///
/// The tree is finite and acyclic by construction: every child is owned by exactly one parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentNode {
    /// Primitive value.
    Leaf(Scalar),
    /// Ordered sequence of child nodes.
    Array(Vec<DocumentNode>),
    /// String-keyed children in document order.
    Object(ObjectMap),
}

impl Default for DocumentNode {
    fn default() -> Self {
        Self::Object(ObjectMap::new())
    }
}

impl DocumentNode {
    /// Build a text leaf.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Leaf(Scalar::Text(s.into()))
    }

    /// Build an integer leaf.
    pub fn uint(v: u64) -> Self {
        Self::Leaf(Scalar::Number(v.into()))
    }

    /// Parse a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PackResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| PackError::validation(format!("parse document JSON: {e}")))
    }

    /// Parse a document from a JSON string.
    pub fn from_json_str(s: &str) -> PackResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| PackError::validation(format!("parse document JSON: {e}")))
    }

    /// Parse a document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PackResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PackError::validation(format!("open document JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize the document as pretty-printed JSON.
    pub fn to_writer_pretty<W: std::io::Write>(&self, w: W) -> PackResult<()> {
        serde_json::to_writer_pretty(w, self)
            .map_err(|e| PackError::serde(format!("write document JSON: {e}")))
    }

    /// Serialize the document as compact JSON text.
    pub fn to_json_string(&self) -> PackResult<String> {
        serde_json::to_string(self)
            .map_err(|e| PackError::serde(format!("write document JSON: {e}")))
    }

    /// Return `true` for primitive leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Borrow the object payload, if this node is an object.
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the string value, if this node is a text leaf.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Leaf(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Read an unsigned integer leaf.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Leaf(Scalar::Number(n)) => n.as_u64(),
            _ => None,
        }
    }

    /// Look up a direct child of an object node.
    pub fn get(&self, key: &str) -> Option<&DocumentNode> {
        self.as_object().and_then(|map| map.get(key))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/node.rs"]
mod tests;
