//! Foundation types for the state store.
//!
//! Every value held by the state store belongs to a closed set of kinds,
//! modelled here as the [`AttributeValue`] sum type. Consumers never see the
//! live store; they receive an owned [`Snapshot`].
//!
//! # Key Types
//!
//! - [`AttributeValue`] — Text, Integer, Real, Mapping, Set-of-text or Sequence-of-text
//! - [`AttributeMap`] — ordered mapping from attribute name to value
//! - [`Snapshot`] — owned copy of the store including the `_updates` counter
//! - [`StateError`] — the single `InvalidValue` failure

pub mod error;
pub mod snapshot;
pub mod value;

pub use error::{StateError, StateResult};
pub use snapshot::{Snapshot, UPDATES_KEY};
pub use value::{AttributeMap, AttributeValue, ValueKind};
