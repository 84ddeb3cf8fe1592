//! DNS Blocklist Core Library
//!
//! This crate holds the logic behind the dashboard's blocklist page: turning the
//! nested catalog of known blocklists into a flat lookup table, and turning a
//! bulk "choose filtering lists" submission into the add/remove actions needed
//! to reach it.
//!
//! # Architecture
//!
//! The catalog is build-time data. It is decoded once into a typed tree
//! ([`RawCatalog`]) and flattened once into a [`NormalizedCatalog`], which is then
//! shared read-only. Reconciliation is a pure function over two selection
//! snapshots and that catalog; it never touches subscription state itself.
//!
//! # Modules
//!
//! - `catalog`: catalog tree decoding, key helpers and the normalizer
//! - `reconcile`: snapshot diffing and action generation
//! - `filtering`: subscription records and dashboard filtering state
//! - `types`: shared type definitions

pub mod catalog;
pub mod filtering;
pub mod reconcile;
pub mod types;

// Re-export commonly used types
pub use catalog::{normalize, CatalogError, CatalogNode, NormalizedCatalog, RawCatalog, KEY_SEPARATOR};
pub use filtering::{FilterFields, FilteringState, ModalKind, Processing, Subscription};
pub use reconcile::{changed_keys, reconcile, ReconcileError};
pub use types::{Action, CatalogEntry, SelectionSnapshot};
