//! Subscription records and the filtering state the dashboard renders.

use serde::{Deserialize, Serialize};

use crate::catalog::NormalizedCatalog;
use crate::types::SelectionSnapshot;

/// An active, user-configured blocklist. `url` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Subscription {
    pub url: String,
    pub name: String,
    pub enabled: bool,
    /// Rules loaded from the list on the last update
    #[serde(default)]
    pub rules_count: u64,
    /// Timestamp of the last successful update, as reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Subscription {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            enabled: true,
            rules_count: 0,
            last_updated: None,
        }
    }
}

/// Field set submitted by the add and edit dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FilterFields {
    pub name: String,
    pub url: String,
}

/// Which dialog the filter modal currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ModalKind {
    /// Pick between adding a custom list and choosing from the catalog
    SelectModalType,
    AddFilters,
    EditFilters,
    ChooseFilteringList,
}

/// In-flight request flags reported by the filtering service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Processing {
    pub config_filter: bool,
    pub filters: bool,
    pub add_filter: bool,
    pub remove_filter: bool,
    pub refresh_filters: bool,
}

impl Processing {
    pub fn any(&self) -> bool {
        self.config_filter || self.filters || self.add_filter || self.remove_filter || self.refresh_filters
    }
}

/// Everything the blocklist page renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FilteringState {
    pub filters: Vec<Subscription>,
    pub processing: Processing,
    pub is_modal_open: bool,
    pub modal_kind: Option<ModalKind>,
    /// Subscription the edit dialog targets
    pub modal_filter_url: Option<String>,
    pub is_filter_added: bool,
}

impl FilteringState {
    /// True while any filtering request is in flight.
    pub fn is_loading(&self) -> bool {
        self.processing.any()
    }

    pub fn find_filter(&self, url: &str) -> Option<&Subscription> {
        self.filters.iter().find(|filter| filter.url == url)
    }

    /// The subscription the open modal targets, used to prefill the edit dialog.
    pub fn current_filter(&self) -> Option<&Subscription> {
        self.modal_filter_url.as_deref().and_then(|url| self.find_filter(url))
    }

    /// Which catalog entries are already subscribed.
    ///
    /// An entry counts as selected when some subscription uses its `source`
    /// URL. The snapshot covers every catalog key.
    pub fn selection_snapshot(&self, catalog: &NormalizedCatalog) -> SelectionSnapshot {
        catalog
            .iter()
            .map(|entry| (entry.key.clone(), self.find_filter(&entry.source).is_some()))
            .collect()
    }

    /// Replace the service-reported part of the state, keeping modal state.
    pub fn apply_status(&mut self, status: FilteringState) {
        self.filters = status.filters;
        self.processing = status.processing;
        self.is_filter_added = status.is_filter_added;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(urls: &[&str]) -> FilteringState {
        FilteringState {
            filters: urls.iter().map(|url| Subscription::new(*url, *url)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn loading_is_any_processing_flag() {
        let mut state = FilteringState::default();
        assert!(!state.is_loading());

        state.processing.refresh_filters = true;
        assert!(state.is_loading());

        state.processing = Processing {
            remove_filter: true,
            ..Default::default()
        };
        assert!(state.is_loading());
    }

    #[test]
    fn current_filter_follows_modal_url() {
        let mut state = state_with(&["http://a", "http://b"]);
        assert!(state.current_filter().is_none());

        state.modal_filter_url = Some("http://b".to_string());
        assert_eq!(state.current_filter().unwrap().url, "http://b");

        state.modal_filter_url = Some("http://gone".to_string());
        assert!(state.current_filter().is_none());
    }

    #[test]
    fn selection_snapshot_marks_subscribed_sources() {
        let catalog = NormalizedCatalog::from_json_str(
            r#"{"ads":{"easylist":{"source":"http://a"}},"privacy":{"x":{"source":"http://b"}}}"#,
        )
        .unwrap();
        let state = state_with(&["http://b", "http://custom"]);

        let snapshot = state.selection_snapshot(&catalog);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["ads.easylist"], false);
        assert_eq!(snapshot["privacy.x"], true);
    }

    #[test]
    fn apply_status_keeps_modal_state() {
        let mut state = FilteringState {
            is_modal_open: true,
            modal_kind: Some(ModalKind::EditFilters),
            modal_filter_url: Some("http://a".to_string()),
            ..Default::default()
        };

        let mut status = state_with(&["http://a"]);
        status.processing.filters = true;
        state.apply_status(status);

        assert_eq!(state.filters.len(), 1);
        assert!(state.is_loading());
        assert!(state.is_modal_open);
        assert_eq!(state.modal_kind, Some(ModalKind::EditFilters));
    }

    #[test]
    fn status_json_tolerates_missing_fields() {
        let state: FilteringState = serde_json::from_str(
            r#"{"filters":[{"url":"http://a","name":"A","enabled":false}],"processing":{"filters":true}}"#,
        )
        .unwrap();

        assert_eq!(state.filters[0].rules_count, 0);
        assert!(!state.filters[0].enabled);
        assert!(state.processing.filters);
        assert!(!state.is_modal_open);
    }
}
