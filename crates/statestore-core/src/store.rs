use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use statestore_types::{AttributeMap, AttributeValue, Snapshot, StateResult, ValueKind};
use tracing::{debug, warn};

use crate::copier;
use crate::sink::StateSink;

/// Live state guarded by the store's lock.
#[derive(Default)]
struct Inner {
    attributes: AttributeMap,
    /// Mutating calls since the last snapshot.
    updates: u64,
}

/// Synchronized map of named attributes with atomic snapshot-and-reset.
///
/// A single `Mutex` guards both the attributes and the update counter:
/// writes vastly outnumber reads, so a read/write lock buys nothing. Create
/// one store at startup and share it behind an `Arc`.
pub struct StateStore {
    inner: Mutex<Inner>,
}

impl StateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    // No operation can panic while holding the guard, so a poisoned lock
    // still protects consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the entry at `name` with `value`.
    ///
    /// Replaces whatever kind was stored there, sets and sequences included.
    pub fn set(&self, name: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.attributes.get_mut(name) {
            Some(slot) => {
                if slot.is_collection() && slot.kind() != value.kind() {
                    debug!(name, from = %slot.kind(), to = %value.kind(), "attribute kind replaced");
                }
                *slot = value;
            }
            None => {
                inner.attributes.insert(name.to_string(), value);
            }
        }
        inner.updates += 1;
    }

    /// Insert `message` into the set at `name`.
    ///
    /// An absent entry, or one of another kind, is replaced by a new set
    /// first. Inserting a duplicate changes nothing but still counts as an
    /// update.
    pub fn add_to_set(&self, name: &str, message: &str) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if let Some(AttributeValue::Set(set)) = inner.attributes.get_mut(name) {
            if !set.contains(message) {
                set.insert(message.to_string());
            }
        } else {
            let fresh = AttributeValue::Set(BTreeSet::from([message.to_string()]));
            if let Some(previous) = inner.attributes.insert(name.to_string(), fresh) {
                debug!(name, from = %previous.kind(), to = %ValueKind::Set, "attribute kind replaced");
            }
        }
        inner.updates += 1;
    }

    /// Append `message` to the sequence at `name` unless it equals the last
    /// element.
    ///
    /// Only adjacent duplicates are suppressed: `a, a, b, a` stores `a, b, a`.
    /// An absent entry, or one of another kind, is replaced by a new sequence
    /// first. Counts as an update even when nothing is appended.
    pub fn add_to_list(&self, name: &str, message: &str) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if let Some(AttributeValue::Sequence(list)) = inner.attributes.get_mut(name) {
            if list.last().map(String::as_str) != Some(message) {
                list.push(message.to_string());
            }
        } else {
            let fresh = AttributeValue::Sequence(vec![message.to_string()]);
            if let Some(previous) = inner.attributes.insert(name.to_string(), fresh) {
                debug!(name, from = %previous.kind(), to = %ValueKind::Sequence, "attribute kind replaced");
            }
        }
        inner.updates += 1;
    }

    /// Delete the entry at `name`; a no-op if absent.
    ///
    /// Removal is deliberately not counted in the update counter.
    pub fn remove(&self, name: &str) {
        self.lock().attributes.remove(name);
    }

    /// Take a snapshot of the whole store and reset per-snapshot state.
    ///
    /// While holding the lock: deep-copies every attribute, stamps the copy
    /// with the update counter under `_updates`, resets the counter to zero,
    /// and empties every top-level set and sequence in the live store.
    /// Scalars and mappings are left as they are.
    ///
    /// If the copy fails validation the live store is not modified.
    pub fn snapshot(&self) -> StateResult<Snapshot> {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let copied = copier::copy_map(&inner.attributes).map_err(|e| {
            warn!(error = %e, "snapshot rejected; live state left untouched");
            e
        })?;

        let updates = std::mem::take(&mut inner.updates);
        let mut cleared = 0usize;
        for value in inner.attributes.values_mut() {
            match value {
                AttributeValue::Set(set) if !set.is_empty() => {
                    set.clear();
                    cleared += 1;
                }
                AttributeValue::Sequence(list) if !list.is_empty() => {
                    list.clear();
                    cleared += 1;
                }
                _ => {}
            }
        }

        debug!(updates, entries = copied.len(), cleared, "snapshot taken");
        Ok(Snapshot::new(copied, updates))
    }

    /// Alias of [`snapshot`](Self::snapshot).
    pub fn get_state(&self) -> StateResult<Snapshot> {
        self.snapshot()
    }

    /// Copy a single entry without touching the counter or collections.
    pub fn peek(&self, name: &str) -> StateResult<Option<AttributeValue>> {
        let guard = self.lock();
        guard.attributes.get(name).map(copier::copy_value).transpose()
    }

    /// Mutating calls recorded since the last snapshot.
    pub fn pending_updates(&self) -> u64 {
        self.lock().updates
    }

    /// Number of live entries (excluding the synthetic `_updates`).
    pub fn len(&self) -> usize {
        self.lock().attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().attributes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().attributes.contains_key(name)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.lock();
        f.debug_struct("StateStore")
            .field("entry_count", &guard.attributes.len())
            .field("pending_updates", &guard.updates)
            .finish()
    }
}

impl StateSink for StateStore {
    fn set(&self, name: &str, value: AttributeValue) {
        StateStore::set(self, name, value);
    }

    fn add_to_set(&self, name: &str, message: &str) {
        StateStore::add_to_set(self, name, message);
    }

    fn add_to_list(&self, name: &str, message: &str) {
        StateStore::add_to_list(self, name, message);
    }

    fn remove(&self, name: &str) {
        StateStore::remove(self, name);
    }
}
