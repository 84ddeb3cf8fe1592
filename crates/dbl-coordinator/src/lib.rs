//! Blocklist Page Coordinator
//!
//! Maps dashboard events (form submissions, delete/toggle/refresh clicks,
//! modal open/close) onto the filtering effects supplied by the hosting
//! application, and publishes the page state through a `watch` channel.

pub mod coordinator;
pub mod effects;

pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorError, Dispatch, FormValues};
pub use effects::{Confirm, EffectError, FilteringEffects, RefreshOptions, CONFIRM_DELETE_KEY};
