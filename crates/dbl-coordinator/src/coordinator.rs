//! The blocklist page coordinator.
//!
//! Holds the page state, routes dashboard events to [`FilteringEffects`] and
//! reconciles bulk catalog selections. Effects are spawned on the Tokio
//! runtime the coordinator was created in and are never awaited by it; the
//! returned [`Dispatch`] lets callers wait when they need to.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use dbl_core::{
    reconcile, Action, FilterFields, FilteringState, ModalKind, NormalizedCatalog, ReconcileError,
    SelectionSnapshot, Subscription,
};

use crate::effects::{Confirm, EffectError, FilteringEffects, RefreshOptions, CONFIRM_DELETE_KEY};

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("Edit submitted without a target subscription")]
    NoModalTarget,
    #[error("{form} form submitted while the {modal:?} modal is open")]
    ModalMismatch { modal: ModalKind, form: &'static str },
    #[error("No Tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Construction-time configuration.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Normalized catalog, loaded once at startup
    pub catalog: Arc<NormalizedCatalog>,
    /// Options passed with every refresh click
    pub refresh: RefreshOptions,
}

impl CoordinatorConfig {
    pub fn new(catalog: Arc<NormalizedCatalog>) -> Self {
        Self {
            catalog,
            refresh: RefreshOptions::default(),
        }
    }
}

/// Values of a submitted modal form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValues {
    /// Add or edit dialog
    Fields(FilterFields),
    /// Catalog chooser. Without `initial`, the starting selection is derived
    /// from the current subscriptions.
    Selection {
        initial: Option<SelectionSnapshot>,
        values: SelectionSnapshot,
    },
}

impl FormValues {
    fn kind(&self) -> &'static str {
        match self {
            Self::Fields(_) => "fields",
            Self::Selection { .. } => "selection",
        }
    }
}

/// Handles of the effects spawned for one event.
#[must_use = "dropping a Dispatch detaches its effects; call `settled` to wait for them"]
#[derive(Debug, Default)]
pub struct Dispatch {
    handles: Vec<JoinHandle<()>>,
}

impl Dispatch {
    fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    fn single(handle: JoinHandle<()>) -> Self {
        Self { handles: vec![handle] }
    }

    /// Number of effects dispatched.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait until every dispatched effect has finished, successfully or not.
    pub async fn settled(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::warn!("Effect task did not complete: {e}");
            }
        }
    }
}

/// Drives the blocklist page.
pub struct Coordinator {
    catalog: Arc<NormalizedCatalog>,
    effects: Arc<dyn FilteringEffects>,
    refresh: RefreshOptions,
    state: Arc<watch::Sender<FilteringState>>,
    runtime: Handle,
}

impl Coordinator {
    /// Create a coordinator bound to the current Tokio runtime.
    pub fn new(config: CoordinatorConfig, effects: Arc<dyn FilteringEffects>) -> Result<Self, CoordinatorError> {
        let runtime = Handle::try_current()?;
        let (state, _) = watch::channel(FilteringState::default());

        Ok(Self {
            catalog: config.catalog,
            effects,
            refresh: config.refresh,
            state: Arc::new(state),
            runtime,
        })
    }

    pub fn catalog(&self) -> &NormalizedCatalog {
        &self.catalog
    }

    /// Current page state.
    pub fn state(&self) -> FilteringState {
        self.state.borrow().clone()
    }

    /// Subscribe to page state changes.
    pub fn subscribe(&self) -> watch::Receiver<FilteringState> {
        self.state.subscribe()
    }

    /// Push a status report from the filtering service into the page state.
    pub fn apply_status(&self, status: FilteringState) {
        self.state.send_modify(|state| state.apply_status(status));
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Subscription targeted by the open modal.
    pub fn current_filter(&self) -> Option<Subscription> {
        self.state.borrow().current_filter().cloned()
    }

    /// Load the initial status; the result is published to subscribers.
    pub fn start(&self) -> Dispatch {
        let effects = Arc::clone(&self.effects);
        let state = Arc::clone(&self.state);

        log::debug!("Dispatching fetch-status");
        Dispatch::single(self.runtime.spawn(async move {
            match effects.fetch_status().await {
                Ok(status) => state.send_modify(|current| current.apply_status(status)),
                Err(e) => log::warn!("fetch-status failed: {e}"),
            }
        }))
    }

    // =========================================================================
    // Modal
    // =========================================================================

    /// Open a modal. The page state is updated at once and the modal effect
    /// is dispatched for the presentation layer.
    pub fn open_modal(&self, kind: ModalKind, filter_url: Option<String>) -> Dispatch {
        let target = filter_url.clone();
        self.state.send_modify(|state| {
            state.is_modal_open = true;
            state.modal_kind = Some(kind);
            state.modal_filter_url = filter_url;
        });
        Dispatch::single(self.spawn_modal(Some(kind), target))
    }

    /// Open the "custom list or catalog" chooser.
    pub fn open_select_type_modal(&self) -> Dispatch {
        self.open_modal(ModalKind::SelectModalType, None)
    }

    pub fn close_modal(&self) -> Dispatch {
        self.state.send_modify(|state| {
            state.is_modal_open = false;
            state.modal_kind = None;
            state.modal_filter_url = None;
        });
        Dispatch::single(self.spawn_modal(None, None))
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Route a submitted form by the modal that is currently open.
    ///
    /// Submitting while no form modal is open does nothing.
    pub fn handle_submit(&self, form: FormValues) -> Result<Dispatch, CoordinatorError> {
        let (modal, target) = {
            let state = self.state.borrow();
            (state.modal_kind, state.modal_filter_url.clone())
        };

        let modal = match modal {
            Some(ModalKind::SelectModalType) | None => return Ok(Dispatch::default()),
            Some(modal) => modal,
        };

        match (modal, form) {
            (ModalKind::EditFilters, FormValues::Fields(fields)) => {
                let url = target.ok_or(CoordinatorError::NoModalTarget)?;
                Ok(Dispatch::single(self.spawn_edit(url, fields)))
            }
            (ModalKind::AddFilters, FormValues::Fields(FilterFields { name, url })) => {
                Ok(Dispatch::single(self.spawn_add(url, name)))
            }
            (ModalKind::ChooseFilteringList, FormValues::Selection { initial, values }) => {
                self.submit_selection(initial, &values)
            }
            (modal, form) => Err(CoordinatorError::ModalMismatch {
                modal,
                form: form.kind(),
            }),
        }
    }

    fn submit_selection(
        &self,
        initial: Option<SelectionSnapshot>,
        values: &SelectionSnapshot,
    ) -> Result<Dispatch, CoordinatorError> {
        let before = match initial {
            Some(initial) => initial,
            None => self.state.borrow().selection_snapshot(&self.catalog),
        };

        let actions = reconcile(&before, values, &self.catalog)?;
        log::info!("Catalog selection changed {} list(s)", actions.len());

        let mut dispatch = Dispatch::default();
        for action in actions {
            let handle = match action {
                // The catalog key doubles as the subscription name.
                Action::Add { key, url } => self.spawn_add(url, key),
                Action::Remove { url } => self.spawn_remove(url),
            };
            dispatch.push(handle);
        }

        Ok(dispatch)
    }

    /// Remove a subscription once the operator confirms.
    pub fn handle_delete<C: Confirm + ?Sized>(&self, url: &str, confirm: &C) -> Dispatch {
        if !confirm.confirm(CONFIRM_DELETE_KEY) {
            log::debug!("Delete of {url} declined");
            return Dispatch::default();
        }
        Dispatch::single(self.spawn_remove(url.to_string()))
    }

    pub fn toggle_filter(&self, url: &str, enabled: bool) -> Dispatch {
        let effects = Arc::clone(&self.effects);
        let url = url.to_string();
        Dispatch::single(self.spawn("toggle-subscription", url.clone(), async move {
            effects.toggle_subscription(&url, enabled).await
        }))
    }

    pub fn handle_refresh(&self) -> Dispatch {
        let effects = Arc::clone(&self.effects);
        let options = self.refresh;
        Dispatch::single(self.spawn("refresh-subscriptions", "all".to_string(), async move {
            effects.refresh_subscriptions(options).await
        }))
    }

    // =========================================================================
    // Effect spawning
    // =========================================================================

    fn spawn_add(&self, url: String, name: String) -> JoinHandle<()> {
        let effects = Arc::clone(&self.effects);
        self.spawn("add-subscription", url.clone(), async move {
            effects.add_subscription(&url, &name).await
        })
    }

    fn spawn_edit(&self, url: String, fields: FilterFields) -> JoinHandle<()> {
        let effects = Arc::clone(&self.effects);
        self.spawn("edit-subscription", url.clone(), async move {
            effects.edit_subscription(&url, &fields).await
        })
    }

    fn spawn_remove(&self, url: String) -> JoinHandle<()> {
        let effects = Arc::clone(&self.effects);
        self.spawn("remove-subscription", url.clone(), async move {
            effects.remove_subscription(&url).await
        })
    }

    fn spawn_modal(&self, kind: Option<ModalKind>, filter_url: Option<String>) -> JoinHandle<()> {
        let effects = Arc::clone(&self.effects);
        let target = match kind {
            Some(kind) => format!("{kind:?}"),
            None => "close".to_string(),
        };
        self.spawn("toggle-modal", target, async move {
            effects.toggle_modal(kind, filter_url.as_deref()).await
        })
    }

    fn spawn<F>(&self, effect: &'static str, target: String, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), EffectError>> + Send + 'static,
    {
        log::debug!("Dispatching {effect} for {target}");
        self.runtime.spawn(async move {
            if let Err(e) = task.await {
                log::warn!("{effect} failed for {target}: {e}");
            }
        })
    }
}
