//! Core type definitions shared by the normalizer, the reconciler and the
//! dashboard coordinator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Catalog Entry
// =============================================================================

/// One subscribable blocklist, as found at a leaf of the catalog tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CatalogEntry {
    /// Flattened path of the leaf, e.g. `regional.europe.easylist_germany`
    pub key: String,
    /// The leaf's own path segment
    pub name: String,
    /// Subscription URL
    pub source: String,
    /// Everything else the catalog says about the list (homepage, languages, ...)
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub metadata: Map<String, Value>,
}

impl CatalogEntry {
    /// Homepage of the list, when the catalog provides one.
    pub fn homepage(&self) -> Option<&str> {
        self.metadata.get("homepage").and_then(Value::as_str)
    }
}

// =============================================================================
// Selection Snapshot
// =============================================================================

/// Point-in-time "is this catalog entry subscribed" map over catalog keys.
///
/// Insertion order is kept so that reconciliation emits actions in the order
/// the form listed them.
pub type SelectionSnapshot = IndexMap<String, bool>;

// =============================================================================
// Reconciliation Actions
// =============================================================================

/// A single state transition produced by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Action {
    /// Subscribe to the catalog entry `key`, served from `url`
    Add { key: String, url: String },
    /// Drop the subscription served from `url`
    Remove { url: String },
}

impl Action {
    /// Subscription URL the action targets.
    pub fn url(&self) -> &str {
        match self {
            Self::Add { url, .. } | Self::Remove { url } => url,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::Add { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_with_type_tag() {
        let add = Action::Add {
            key: "ads.easylist".to_string(),
            url: "http://a".to_string(),
        };
        let json = serde_json::to_string(&add).unwrap();
        assert_eq!(json, r#"{"type":"add","key":"ads.easylist","url":"http://a"}"#);

        let remove: Action = serde_json::from_str(r#"{"type":"remove","url":"http://b"}"#).unwrap();
        assert_eq!(remove.url(), "http://b");
        assert!(!remove.is_add());
    }

    #[test]
    fn entry_metadata_is_flattened() {
        let entry: CatalogEntry = serde_json::from_str(
            r#"{"key":"ads.easylist","name":"easylist","source":"http://a","homepage":"https://easylist.to/"}"#,
        )
        .unwrap();
        assert_eq!(entry.homepage(), Some("https://easylist.to/"));
        assert_eq!(entry.metadata.len(), 1);
    }
}
