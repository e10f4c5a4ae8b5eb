//! Capability predicates: tests over a module's exports, independent of
//! module id.
//!
//! Predicates run against every newly registered module while waits are
//! pending, so they must stay pure and cheap - property lookups, not deep
//! traversals. The stock combinators also look through a `default` member,
//! since bundlers wrap ES-module default exports one level down.

use serde_json::Value;
use std::sync::Arc;

/// A pure, cheap test over a module's exports.
pub type CapabilityPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Wrap a closure as a predicate.
pub fn custom<F>(predicate: F) -> CapabilityPredicate
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(predicate)
}

/// Exports (or their `default` member) carry all of the given property names.
pub fn by_props<I, S>(props: I) -> CapabilityPredicate
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let props: Vec<String> = props.into_iter().map(Into::into).collect();
    Arc::new(move |exports| {
        props_present(exports, &props)
            || exports
                .get("default")
                .is_some_and(|inner| props_present(inner, &props))
    })
}

/// Exports (or their `default` member) carry all of the given properties with
/// exactly the given values.
pub fn by_prop_values<I, S>(pairs: I) -> CapabilityPredicate
where
    I: IntoIterator<Item = (S, Value)>,
    S: Into<String>,
{
    let pairs: Vec<(String, Value)> = pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .collect();
    Arc::new(move |exports| {
        values_match(exports, &pairs)
            || exports
                .get("default")
                .is_some_and(|inner| values_match(inner, &pairs))
    })
}

/// Satisfied when any of the given predicates is.
pub fn any_of(predicates: Vec<CapabilityPredicate>) -> CapabilityPredicate {
    Arc::new(move |exports| predicates.iter().any(|p| p(exports)))
}

fn props_present(value: &Value, props: &[String]) -> bool {
    match value.as_object() {
        Some(map) => props.iter().all(|prop| map.contains_key(prop)),
        None => false,
    }
}

fn values_match(value: &Value, pairs: &[(String, Value)]) -> bool {
    match value.as_object() {
        Some(map) => pairs
            .iter()
            .all(|(name, expected)| map.get(name) == Some(expected)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn by_props_requires_every_name() {
        let pred = by_props(["render", "displayName"]);
        assert!(pred(&json!({ "render": 1, "displayName": "X", "extra": true })));
        assert!(!pred(&json!({ "render": 1 })));
        assert!(!pred(&json!({ "a": 1 })));
    }

    #[test]
    fn by_props_rejects_non_objects() {
        let pred = by_props(["anything"]);
        assert!(!pred(&json!(42)));
        assert!(!pred(&json!(null)));
        assert!(!pred(&json!("string")));
    }

    #[test]
    fn by_props_looks_through_default() {
        let pred = by_props(["render"]);
        assert!(pred(&json!({ "default": { "render": 1 } })));
        assert!(!pred(&json!({ "default": { "other": 1 } })));
    }

    #[test]
    fn by_prop_values_requires_exact_values() {
        let pred = by_prop_values([("type", json!("store")), ("version", json!(2))]);
        assert!(pred(&json!({ "type": "store", "version": 2 })));
        assert!(!pred(&json!({ "type": "store", "version": 3 })));
        assert!(!pred(&json!({ "type": "store" })));
    }

    #[test]
    fn any_of_is_a_union() {
        let pred = any_of(vec![by_props(["a"]), by_props(["b"])]);
        assert!(pred(&json!({ "a": 1 })));
        assert!(pred(&json!({ "b": 1 })));
        assert!(!pred(&json!({ "c": 1 })));
    }

    #[test]
    fn custom_wraps_closures() {
        let pred = custom(|v| v.as_array().is_some_and(|a| a.len() == 3));
        assert!(pred(&json!([1, 2, 3])));
        assert!(!pred(&json!([1])));
    }
}
