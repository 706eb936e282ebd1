//! Property tests for cache key derivation.

use list_cache::CacheKey;
use proptest::prelude::*;
use serde_json::{Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn params() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::btree_map("[a-zA-Z]{1,8}", scalar(), 0..8).prop_map(|map| map.into_iter().collect())
}

fn shuffled_params() -> impl Strategy<Value = (Vec<(String, Value)>, Vec<(String, Value)>)> {
    params().prop_flat_map(|members| (Just(members.clone()), Just(members).prop_shuffle()))
}

fn object(members: &[(String, Value)]) -> Value {
    let mut map = Map::new();
    for (name, value) in members {
        map.insert(name.clone(), value.clone());
    }
    Value::Object(map)
}

proptest! {
    #[test]
    fn key_ignores_member_order((members, shuffled) in shuffled_params()) {
        let original = object(&members);
        let reordered = object(&shuffled);

        // Objects keep insertion order, so the two inputs really differ in order.
        let names: Vec<&String> = reordered.as_object().unwrap().keys().collect();
        let expected: Vec<&String> = shuffled.iter().map(|(name, _)| name).collect();
        prop_assert_eq!(names, expected);

        prop_assert_eq!(CacheKey::from_params(&original), CacheKey::from_params(&reordered));
    }

    #[test]
    fn key_members_are_sorted((_, shuffled) in shuffled_params()) {
        let key = CacheKey::from_params(&object(&shuffled));
        let parsed: Value = serde_json::from_str(key.as_str()).unwrap();
        let names: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names, sorted);
    }

    #[test]
    fn key_ignores_null_members(members in params()) {
        let without_nulls: Vec<(String, Value)> =
            members.iter().filter(|(_, v)| !v.is_null()).cloned().collect();

        prop_assert_eq!(
            CacheKey::from_params(&object(&members)),
            CacheKey::from_params(&object(&without_nulls))
        );
    }

    #[test]
    fn key_is_valid_json(members in params()) {
        let key = CacheKey::from_params(&object(&members));
        let parsed: Value = serde_json::from_str(key.as_str()).unwrap();
        let expected: Map<String, Value> =
            members.into_iter().filter(|(_, v)| !v.is_null()).collect();
        prop_assert_eq!(parsed, Value::Object(expected));
    }
}
