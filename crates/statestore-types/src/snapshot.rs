use serde::Serialize;

use crate::value::{AttributeMap, AttributeValue};

/// Name of the synthetic entry carrying the update counter.
pub const UPDATES_KEY: &str = "_updates";

/// An owned, independent copy of the store's attributes at one instant.
///
/// Shares no structure with the live store. Besides the stored attributes it
/// always holds [`UPDATES_KEY`] with the number of mutating calls since the
/// previous snapshot. Serializes as a flat JSON object in key order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    attributes: AttributeMap,
}

impl Snapshot {
    /// Wrap copied attributes, stamping the update counter.
    ///
    /// A stored attribute named [`UPDATES_KEY`] is shadowed by the counter.
    pub fn new(mut attributes: AttributeMap, updates: u64) -> Self {
        let updates = i64::try_from(updates).unwrap_or(i64::MAX);
        attributes.insert(UPDATES_KEY.to_string(), AttributeValue::Integer(updates));
        Self { attributes }
    }

    /// Number of mutating calls recorded since the previous snapshot.
    pub fn updates(&self) -> u64 {
        self.attributes
            .get(UPDATES_KEY)
            .and_then(AttributeValue::as_integer)
            .map_or(0, |n| n.max(0) as u64)
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Number of entries, including [`UPDATES_KEY`].
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always `false`: a snapshot carries at least the update counter.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }
}

impl IntoIterator for Snapshot {
    type Item = (String, AttributeValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn new_stamps_update_counter() {
        let snap = Snapshot::new(AttributeMap::new(), 3);
        assert_eq!(snap.updates(), 3);
        assert_eq!(snap.len(), 1);
        assert!(!snap.is_empty());
        assert_eq!(snap.get(UPDATES_KEY), Some(&AttributeValue::Integer(3)));
    }

    #[test]
    fn counter_shadows_stored_attribute() {
        let mut attrs = AttributeMap::new();
        attrs.insert(UPDATES_KEY.to_string(), AttributeValue::text("user value"));
        let snap = Snapshot::new(attrs, 0);
        assert_eq!(snap.get(UPDATES_KEY), Some(&AttributeValue::Integer(0)));
    }

    #[test]
    fn iterates_in_key_order() {
        let mut attrs = AttributeMap::new();
        attrs.insert("zeta".into(), AttributeValue::Integer(1));
        attrs.insert("alpha".into(), AttributeValue::Integer(2));
        let snap = Snapshot::new(attrs, 0);
        let keys: Vec<&str> = snap.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["_updates", "alpha", "zeta"]);
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut attrs = AttributeMap::new();
        attrs.insert("battery".into(), AttributeValue::Real(87.5));
        attrs.insert(
            "event".into(),
            AttributeValue::Set(BTreeSet::from(["low-fuel".to_string()])),
        );
        attrs.insert(
            "mission".into(),
            AttributeValue::Sequence(vec!["start".into()]),
        );
        let snap = Snapshot::new(attrs, 3);
        assert_eq!(
            serde_json::to_string(&snap).unwrap(),
            r#"{"_updates":3,"battery":87.5,"event":["low-fuel"],"mission":["start"]}"#
        );
    }

    #[test]
    fn into_attributes_keeps_counter() {
        let snap = Snapshot::new(AttributeMap::new(), 9);
        let attrs = snap.clone().into_attributes();
        assert_eq!(attrs.get(UPDATES_KEY), Some(&AttributeValue::Integer(9)));
        assert_eq!(snap.into_iter().count(), 1);
    }
}
