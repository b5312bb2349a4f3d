use statestore_types::AttributeValue;

/// Write side of the store, as seen by producers.
///
/// Every call is accepted and returns immediately; there is no failure path
/// and no back-pressure. Implementations must be safe to call from any number
/// of threads at once.
pub trait StateSink: Send + Sync {
    /// Overwrite the entry at `name`, whatever kind it held before.
    fn set(&self, name: &str, value: AttributeValue);

    /// Insert `message` into the set at `name`, creating the set if needed.
    fn add_to_set(&self, name: &str, message: &str);

    /// Append `message` to the sequence at `name` unless it equals the last
    /// element, creating the sequence if needed.
    fn add_to_list(&self, name: &str, message: &str);

    /// Delete the entry at `name`. Not counted as an update.
    fn remove(&self, name: &str);
}
