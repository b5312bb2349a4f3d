//! Thread-safe, in-process aggregation store.
//!
//! Many producers write named attributes concurrently; a single consumer
//! periodically takes a [`Snapshot`] of the accumulated state. Taking a
//! snapshot is atomic with respect to writers: it copies every attribute,
//! reports how many mutating calls happened since the previous snapshot, and
//! empties every set and sequence entry so they only ever carry events that
//! arrived since the last read.
//!
//! # Design Rules
//!
//! 1. One exclusive lock guards both the attribute map and the update counter.
//! 2. No caller ever holds a reference into the live map; reads return copies.
//! 3. A write lands entirely before or entirely after any given snapshot.
//! 4. A failed snapshot leaves the live state untouched.
//! 5. Scalars and mappings persist across snapshots; sets and sequences are
//!    emptied, never removed.

pub mod copier;
pub mod sink;
pub mod store;

pub use copier::MAX_NESTING_DEPTH;
pub use sink::StateSink;
pub use store::StateStore;

// Re-export the value model so producers only need this crate.
pub use statestore_types::{
    AttributeMap, AttributeValue, Snapshot, StateError, StateResult, ValueKind, UPDATES_KEY,
};
