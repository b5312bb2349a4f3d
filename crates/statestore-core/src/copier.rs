//! Structural deep copy with shape validation.
//!
//! Produces values that share no storage with their source. Mappings are
//! walked recursively; nesting deeper than [`MAX_NESTING_DEPTH`] is rejected
//! with [`StateError::InvalidValue`] instead of risking the call stack.

use statestore_types::{AttributeMap, AttributeValue, StateError, StateResult};

/// Deepest mapping level accepted below a top-level attribute.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Copy a whole attribute map, failing on the first invalid entry.
pub fn copy_map(map: &AttributeMap) -> StateResult<AttributeMap> {
    let mut path = Vec::new();
    copy_entries(map, &mut path, 0)
}

/// Copy a single attribute value.
pub fn copy_value(value: &AttributeValue) -> StateResult<AttributeValue> {
    let mut path = Vec::new();
    copy_at(value, &mut path, 0)
}

fn copy_entries<'a>(
    map: &'a AttributeMap,
    path: &mut Vec<&'a str>,
    depth: usize,
) -> StateResult<AttributeMap> {
    let mut out = AttributeMap::new();
    for (key, value) in map {
        path.push(key);
        let copied = copy_at(value, path, depth)?;
        path.pop();
        out.insert(key.clone(), copied);
    }
    Ok(out)
}

fn copy_at<'a>(
    value: &'a AttributeValue,
    path: &mut Vec<&'a str>,
    depth: usize,
) -> StateResult<AttributeValue> {
    if depth > MAX_NESTING_DEPTH {
        return Err(StateError::InvalidValue {
            path: path.join("."),
            kind: value.kind(),
            reason: format!("mapping nested deeper than {MAX_NESTING_DEPTH} levels"),
        });
    }

    let copied = match value {
        AttributeValue::Text(s) => AttributeValue::Text(s.clone()),
        AttributeValue::Integer(n) => AttributeValue::Integer(*n),
        AttributeValue::Real(n) => AttributeValue::Real(*n),
        AttributeValue::Mapping(inner) => {
            AttributeValue::Mapping(copy_entries(inner, path, depth + 1)?)
        }
        AttributeValue::Set(items) => AttributeValue::Set(items.iter().cloned().collect()),
        AttributeValue::Sequence(items) => AttributeValue::Sequence(items.to_vec()),
    };
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use statestore_types::ValueKind;
    use std::collections::BTreeSet;

    fn nested(levels: usize) -> AttributeValue {
        let mut value = AttributeValue::text("leaf");
        for _ in 0..levels {
            value = AttributeValue::mapping([("n", value)]);
        }
        value
    }

    #[test]
    fn copies_every_kind() {
        let mut map = AttributeMap::new();
        map.insert("t".into(), AttributeValue::text("a string value"));
        map.insert("i".into(), AttributeValue::Integer(4500));
        map.insert("r".into(), AttributeValue::Real(42.6));
        map.insert(
            "s".into(),
            AttributeValue::Set(BTreeSet::from(["s1".to_string(), "s2".to_string()])),
        );
        map.insert("q".into(), AttributeValue::Sequence(vec!["a".into(), "b".into()]));
        map.insert(
            "m".into(),
            AttributeValue::mapping([("innerString", "a string in a map")]),
        );

        let copy = copy_map(&map).unwrap();
        assert_eq!(copy, map);
    }

    #[test]
    fn copy_shares_no_storage() {
        let original = AttributeValue::mapping([("entry", "data")]);
        let copy = copy_value(&original).unwrap();

        let src = original.as_mapping().unwrap()["entry"].as_text().unwrap();
        let dst = copy.as_mapping().unwrap()["entry"].as_text().unwrap();
        assert_eq!(src, dst);
        assert_ne!(src.as_ptr(), dst.as_ptr());
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        let value = nested(MAX_NESTING_DEPTH);
        assert_eq!(copy_value(&value).unwrap(), value);
    }

    #[test]
    fn rejects_nesting_past_the_limit() {
        let mut map = AttributeMap::new();
        map.insert("deep".into(), nested(MAX_NESTING_DEPTH + 1));

        let err = copy_map(&map).unwrap_err();
        let StateError::InvalidValue { path, kind, .. } = err;
        assert!(path.starts_with("deep.n.n"));
        assert_eq!(path.split('.').count(), MAX_NESTING_DEPTH + 2);
        assert_eq!(kind, ValueKind::Text);
    }

    #[test]
    fn empty_map_copies_to_empty_map() {
        assert!(copy_map(&AttributeMap::new()).unwrap().is_empty());
    }
}
