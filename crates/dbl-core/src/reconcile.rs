//! Selection reconciliation
//!
//! Given the selection the "choose filtering lists" form started from and the
//! one it was submitted with, compute the subscribe/unsubscribe actions that
//! take the first to the second.

use crate::catalog::NormalizedCatalog;
use crate::types::{Action, SelectionSnapshot};

/// Error type for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Selection key '{key}' is not in the catalog")]
    UnknownKey { key: String },
}

/// Keys whose selection differs between `before` and `after`, paired with the
/// new value.
///
/// A key missing from a snapshot counts as not selected. Keys of `after` come
/// first in its insertion order, followed by keys only `before` knows about.
pub fn changed_keys<'a>(before: &'a SelectionSnapshot, after: &'a SelectionSnapshot) -> Vec<(&'a str, bool)> {
    let mut changed = Vec::new();

    for (key, &selected) in after {
        let was_selected = before.get(key).copied().unwrap_or(false);
        if was_selected != selected {
            changed.push((key.as_str(), selected));
        }
    }

    for (key, &was_selected) in before {
        if was_selected && !after.contains_key(key) {
            changed.push((key.as_str(), false));
        }
    }

    changed
}

/// Compute the actions that take `before` to `after`.
///
/// Every changed key must exist in `catalog`; otherwise the whole call fails
/// with [`ReconcileError::UnknownKey`] and no actions are returned.
///
/// The actions commute only while every catalog entry has its own `source`.
/// Two changed keys sharing a URL yield a `Remove` and an `Add` on the same
/// subscription whose outcome depends on completion order; `normalize` warns
/// about such catalogs (see [`NormalizedCatalog::duplicate_sources`]).
pub fn reconcile(
    before: &SelectionSnapshot,
    after: &SelectionSnapshot,
    catalog: &NormalizedCatalog,
) -> Result<Vec<Action>, ReconcileError> {
    let changed = changed_keys(before, after);
    let mut actions = Vec::with_capacity(changed.len());

    for (key, selected) in changed {
        let url = catalog
            .source_of(key)
            .ok_or_else(|| ReconcileError::UnknownKey { key: key.to_string() })?;

        let action = if selected {
            Action::Add {
                key: key.to_string(),
                url: url.to_string(),
            }
        } else {
            Action::Remove { url: url.to_string() }
        };
        actions.push(action);
    }

    log::debug!("Reconciled selection: {} action(s)", actions.len());

    Ok(actions)
}
