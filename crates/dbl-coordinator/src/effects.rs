//! Effect contracts the hosting application implements.

use async_trait::async_trait;

use dbl_core::{FilterFields, FilteringState, ModalKind};

/// Message key shown when asking the operator to confirm a delete.
pub const CONFIRM_DELETE_KEY: &str = "list_confirm_delete";

/// Error reported by an effect implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Filtering service unavailable: {0}")]
    Unavailable(String),
}

/// Options for a bulk refresh of subscription contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Also refresh the disabled/allowlist group
    pub include_disabled_group: bool,
}

/// Calls into the filtering service.
///
/// Every method is dispatched fire-and-forget by the coordinator: a failure is
/// logged and does not affect sibling calls.
#[async_trait]
pub trait FilteringEffects: Send + Sync {
    /// Load the current subscription list and processing flags.
    async fn fetch_status(&self) -> Result<FilteringState, EffectError>;

    async fn add_subscription(&self, url: &str, name: &str) -> Result<(), EffectError>;

    async fn edit_subscription(&self, url: &str, fields: &FilterFields) -> Result<(), EffectError>;

    async fn remove_subscription(&self, url: &str) -> Result<(), EffectError>;

    async fn toggle_subscription(&self, url: &str, enabled: bool) -> Result<(), EffectError>;

    async fn refresh_subscriptions(&self, options: RefreshOptions) -> Result<(), EffectError>;

    /// Show the modal of `kind`, or hide the open one when `kind` is `None`.
    async fn toggle_modal(&self, kind: Option<ModalKind>, filter_url: Option<&str>) -> Result<(), EffectError>;
}

/// Interactive confirmation gate.
pub trait Confirm {
    /// Ask the operator; `message_key` is a translation key.
    fn confirm(&self, message_key: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message_key: &str) -> bool {
        self(message_key)
    }
}
