use async_trait::async_trait;

use dbl_coordinator::{EffectError, FilteringEffects, RefreshOptions};
use dbl_core::{FilterFields, FilteringState, ModalKind};

/// Effects that only report what would be sent to the filtering service.
pub struct DryRunEffects {
    status: FilteringState,
}

impl DryRunEffects {
    pub fn new(status: FilteringState) -> Self {
        Self { status }
    }
}

#[async_trait]
impl FilteringEffects for DryRunEffects {
    async fn fetch_status(&self) -> Result<FilteringState, EffectError> {
        log::info!("fetch-status: {} subscription(s)", self.status.filters.len());
        Ok(self.status.clone())
    }

    async fn add_subscription(&self, url: &str, name: &str) -> Result<(), EffectError> {
        println!("  + add     {} ({})", url, name);
        Ok(())
    }

    async fn edit_subscription(&self, url: &str, fields: &FilterFields) -> Result<(), EffectError> {
        println!("  ~ edit    {} -> {} ({})", url, fields.url, fields.name);
        Ok(())
    }

    async fn remove_subscription(&self, url: &str) -> Result<(), EffectError> {
        println!("  - remove  {}", url);
        Ok(())
    }

    async fn toggle_subscription(&self, url: &str, enabled: bool) -> Result<(), EffectError> {
        println!("  * toggle  {} enabled={}", url, enabled);
        Ok(())
    }

    async fn refresh_subscriptions(&self, options: RefreshOptions) -> Result<(), EffectError> {
        println!("  ! refresh include_disabled_group={}", options.include_disabled_group);
        Ok(())
    }

    async fn toggle_modal(&self, kind: Option<ModalKind>, filter_url: Option<&str>) -> Result<(), EffectError> {
        match kind {
            Some(kind) => log::debug!("open-modal: {:?} {}", kind, filter_url.unwrap_or("-")),
            None => log::debug!("close-modal"),
        }
        Ok(())
    }
}
