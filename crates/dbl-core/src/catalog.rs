//! Blocklist Catalog
//!
//! The upstream catalog is a nested JSON object: interior objects are named
//! groupings (category, subcategory, ...) and leaves are list descriptions
//! carrying at least a `source` URL. This module decodes that shape into a
//! typed tree and flattens the tree into a [`NormalizedCatalog`] keyed by the
//! dotted path of each leaf.

use std::collections::HashSet;
use std::io::Read;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::CatalogEntry;

/// Separator between path segments in a flattened catalog key.
pub const KEY_SEPARATOR: char = '.';

/// String field that marks an object as a list entry rather than a grouping.
const SOURCE_FIELD: &str = "source";

/// An object is a list entry iff its `source` is a string. A non-string
/// `source` is just a child named "source".
fn is_entry(object: &Map<String, Value>) -> bool {
    matches!(object.get(SOURCE_FIELD), Some(Value::String(_)))
}

/// Error type for catalog decoding.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog root must be an object of groupings")]
    InvalidRoot,
    #[error("Catalog node '{path}' is a {found}, expected an object")]
    UnexpectedNode { path: String, found: &'static str },
    #[error("Invalid path segment {segment:?} under '{parent}'")]
    InvalidSegment { parent: String, segment: String },
}

// =============================================================================
// Key Helpers
// =============================================================================

/// Join path segments into a flat catalog key.
pub fn join_key<S: AsRef<str>>(segments: &[S]) -> String {
    let mut key = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(segment.as_ref());
    }
    key
}

/// Split a flat catalog key back into its path segments.
pub fn split_key(key: &str) -> impl Iterator<Item = &str> {
    key.split(KEY_SEPARATOR)
}

/// Last path segment of a key, which is the entry's display name.
pub fn leaf_name(key: &str) -> &str {
    key.rsplit(KEY_SEPARATOR).next().unwrap_or(key)
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(KEY_SEPARATOR)
}

// =============================================================================
// Raw Catalog Tree
// =============================================================================

/// A list description found at a leaf of the raw catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub source: String,
    /// Remaining fields, in source order
    pub metadata: Map<String, Value>,
}

/// A node of the raw catalog tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogNode {
    /// Named grouping of further nodes
    Group(IndexMap<String, CatalogNode>),
    /// Subscribable list
    Entry(RawEntry),
}

impl CatalogNode {
    /// Number of entries at or below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Group(children) => children.values().map(CatalogNode::leaf_count).sum(),
            Self::Entry(_) => 1,
        }
    }

    fn from_value(path: &mut Vec<String>, value: Value) -> Result<Self, CatalogError> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(CatalogError::UnexpectedNode {
                    path: join_key(&path[..]),
                    found: value_kind(&other),
                })
            }
        };

        if let Some(Value::String(source)) = object.get(SOURCE_FIELD) {
            let source = source.clone();
            object.shift_remove(SOURCE_FIELD);
            return Ok(Self::Entry(RawEntry {
                source,
                metadata: object,
            }));
        }

        group_from_object(path, object).map(Self::Group)
    }
}

fn group_from_object(
    path: &mut Vec<String>,
    object: Map<String, Value>,
) -> Result<IndexMap<String, CatalogNode>, CatalogError> {
    let mut children = IndexMap::with_capacity(object.len());

    for (segment, child) in object {
        if !is_valid_segment(&segment) {
            return Err(CatalogError::InvalidSegment {
                parent: join_key(&path[..]),
                segment,
            });
        }

        path.push(segment);
        let node = CatalogNode::from_value(path, child)?;
        let segment = path.pop().unwrap_or_default();
        children.insert(segment, node);
    }

    Ok(children)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The decoded, still nested, catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCatalog {
    root: IndexMap<String, CatalogNode>,
}

impl RawCatalog {
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let object = match value {
            Value::Object(object) if !is_entry(&object) => object,
            _ => return Err(CatalogError::InvalidRoot),
        };

        let mut path = Vec::new();
        let root = group_from_object(&mut path, object)?;
        Ok(Self { root })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    /// Top-level groupings (and any top-level entries), in source order.
    pub fn root(&self) -> &IndexMap<String, CatalogNode> {
        &self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.root.values().map(CatalogNode::leaf_count).sum()
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Flatten the catalog tree into a key -> entry table.
///
/// Every leaf produces exactly one entry, keyed by its dotted path and named
/// after its own segment. A `key` or `name` field present on the leaf itself
/// is overwritten. Groupings never appear in the output. The input is not
/// modified and entries come out in depth-first source order.
pub fn normalize(raw: &RawCatalog) -> NormalizedCatalog {
    let mut entries = IndexMap::with_capacity(raw.leaf_count());
    let mut path = Vec::new();

    for (segment, node) in &raw.root {
        flatten_node(segment, node, &mut path, &mut entries);
    }

    let catalog = NormalizedCatalog { entries };
    for url in catalog.duplicate_sources() {
        log::warn!("Catalog source {url} is shared by several entries; selections of them will race");
    }

    log::debug!("Normalized catalog: {} entries", catalog.len());
    catalog
}

fn flatten_node<'a>(
    segment: &'a str,
    node: &'a CatalogNode,
    path: &mut Vec<&'a str>,
    out: &mut IndexMap<String, CatalogEntry>,
) {
    path.push(segment);

    match node {
        CatalogNode::Group(children) => {
            for (child_segment, child) in children {
                flatten_node(child_segment, child, path, out);
            }
        }
        CatalogNode::Entry(raw) => {
            let key = join_key(&path[..]);
            let mut metadata = raw.metadata.clone();
            metadata.remove("key");
            metadata.remove("name");

            out.insert(
                key.clone(),
                CatalogEntry {
                    key,
                    name: segment.to_string(),
                    source: raw.source.clone(),
                    metadata,
                },
            );
        }
    }

    path.pop();
}

// =============================================================================
// Normalized Catalog
// =============================================================================

/// Flat, read-only lookup table of every list in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedCatalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl NormalizedCatalog {
    /// Decode and normalize a catalog in one step.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        RawCatalog::from_json_str(json).map(|raw| normalize(&raw))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        RawCatalog::from_reader(reader).map(|raw| normalize(&raw))
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    /// Subscription URL for a key.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.source.as_str())
    }

    /// First entry served from `url`.
    pub fn find_by_source(&self, url: &str) -> Option<&CatalogEntry> {
        self.entries.values().find(|entry| entry.source == url)
    }

    /// Source URLs served by more than one entry, in first-seen order.
    pub fn duplicate_sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = IndexSet::new();
        for entry in self.entries.values() {
            if !seen.insert(entry.source.as_str()) {
                duplicates.insert(entry.source.as_str());
            }
        }
        duplicates.into_iter().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const FIXTURE: &str = include_str!("../../../fixtures/filters.json");

    fn example_catalog() -> RawCatalog {
        RawCatalog::from_value(json!({
            "ads": { "easylist": { "source": "http://a" } },
            "privacy": { "x": { "source": "http://b" } }
        }))
        .unwrap()
    }

    /// Collect every leaf source of a raw JSON catalog, depth first.
    fn leaf_sources(value: &Value, out: &mut Vec<String>) {
        if let Value::Object(object) = value {
            match object.get("source") {
                Some(Value::String(source)) => out.push(source.clone()),
                _ => object.values().for_each(|child| leaf_sources(child, out)),
            }
        }
    }

    #[test]
    fn normalizes_example_catalog() {
        let catalog = normalize(&example_catalog());

        let serialized = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            serialized,
            json!({
                "ads.easylist": { "key": "ads.easylist", "name": "easylist", "source": "http://a" },
                "privacy.x": { "key": "privacy.x", "name": "x", "source": "http://b" }
            })
        );
    }

    #[test]
    fn output_has_one_entry_per_leaf() {
        let raw = RawCatalog::from_json_str(FIXTURE).unwrap();
        let catalog = normalize(&raw);

        assert_eq!(raw.leaf_count(), 8);
        assert_eq!(catalog.len(), raw.leaf_count());

        let unique: HashSet<&str> = catalog.keys().collect();
        assert_eq!(unique.len(), catalog.len());
    }

    #[test]
    fn sources_are_preserved_in_order() {
        let value: Value = serde_json::from_str(FIXTURE).unwrap();
        let mut expected = Vec::new();
        leaf_sources(&value, &mut expected);

        let catalog = NormalizedCatalog::from_json_str(FIXTURE).unwrap();
        let actual: Vec<String> = catalog.iter().map(|entry| entry.source.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw = RawCatalog::from_json_str(FIXTURE).unwrap();
        let before = raw.clone();

        let first = normalize(&raw);
        let second = normalize(&raw);

        assert_eq!(first, second);
        assert_eq!(raw, before);
    }

    #[test]
    fn nested_keys_round_trip_to_names() {
        let catalog = NormalizedCatalog::from_json_str(FIXTURE).unwrap();
        let entry = catalog.get("regional.europe.easylist_germany").unwrap();

        assert_eq!(entry.name, "easylist_germany");
        assert_eq!(leaf_name(&entry.key), entry.name);
        assert_eq!(
            split_key(&entry.key).collect::<Vec<_>>(),
            vec!["regional", "europe", "easylist_germany"]
        );
        assert_eq!(entry.metadata["languages"], json!(["de"]));
    }

    #[test]
    fn leaf_name_field_is_replaced_by_segment() {
        let catalog = NormalizedCatalog::from_json_str(FIXTURE).unwrap();
        let entry = catalog.get("general.adguard_dns_filter").unwrap();

        assert_eq!(entry.name, "adguard_dns_filter");
        assert!(!entry.metadata.contains_key("name"));
        assert_eq!(entry.homepage(), Some("https://github.com/AdguardTeam/AdGuardSDNSFilter"));
    }

    #[test]
    fn shared_sources_are_reported() {
        let catalog = NormalizedCatalog::from_json_str(
            r#"{"mirror":{"a":{"source":"http://same"},"b":{"source":"http://same"},"c":{"source":"http://c"}}}"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.duplicate_sources(), vec!["http://same"]);
        assert!(NormalizedCatalog::from_json_str(FIXTURE).unwrap().duplicate_sources().is_empty());
    }

    #[test]
    fn top_level_entry_is_allowed() {
        let catalog = NormalizedCatalog::from_json_str(r#"{"solo":{"source":"http://s"}}"#).unwrap();
        assert_eq!(catalog.get("solo").unwrap().name, "solo");
    }

    #[test]
    fn empty_groups_produce_nothing() {
        let catalog = NormalizedCatalog::from_json_str(r#"{"ads":{},"privacy":{"inner":{}}}"#).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn find_by_source_locates_entry() {
        let catalog = normalize(&example_catalog());
        assert_eq!(catalog.find_by_source("http://b").unwrap().key, "privacy.x");
        assert!(catalog.find_by_source("http://missing").is_none());
        assert_eq!(catalog.source_of("ads.easylist"), Some("http://a"));
    }

    #[test]
    fn rejects_non_object_leaf() {
        let err = RawCatalog::from_json_str(r#"{"ads":{"easylist":"http://a"}}"#).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnexpectedNode { ref path, found: "string" } if path == "ads.easylist"
        ));
    }

    #[test]
    fn rejects_non_string_source() {
        let err = RawCatalog::from_json_str(r#"{"ads":{"easylist":{"source":42}}}"#).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UnexpectedNode { ref path, found: "number" } if path == "ads.easylist.source"
        ));
    }

    #[test]
    fn grouping_named_source_is_a_group() {
        let catalog =
            NormalizedCatalog::from_json_str(r#"{"vendors":{"source":{"list":{"source":"http://a"}}}}"#).unwrap();

        assert_eq!(catalog.len(), 1);
        let entry = catalog.get("vendors.source.list").unwrap();
        assert_eq!(entry.name, "list");
        assert_eq!(entry.source, "http://a");
    }

    #[test]
    fn rejects_segment_containing_separator() {
        let err = RawCatalog::from_json_str(r#"{"ads":{"easy.list":{"source":"http://a"}}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSegment { ref parent, .. } if parent == "ads"));

        let err = RawCatalog::from_json_str(r#"{"":{"source":"http://a"}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSegment { .. }));
    }

    #[test]
    fn rejects_invalid_root() {
        assert!(matches!(RawCatalog::from_json_str("[]"), Err(CatalogError::InvalidRoot)));
        assert!(matches!(
            RawCatalog::from_json_str(r#"{"source":"http://a"}"#),
            Err(CatalogError::InvalidRoot)
        ));
        assert!(matches!(RawCatalog::from_json_str("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn join_key_uses_separator() {
        assert_eq!(join_key(&["a", "b", "c"]), "a.b.c");
        assert_eq!(join_key::<&str>(&[]), "");
        assert_eq!(leaf_name("single"), "single");
    }
}
