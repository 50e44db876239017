//! Old/new attribute accessor for one proposed change.

use std::collections::BTreeSet;

use crate::schema::{ResourceSchema, Snapshot, Value};

/// A proposed change to one resource: the last applied snapshot (absent
/// for a resource that does not exist yet) and the proposed snapshot.
///
/// Neither snapshot is ever modified.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDiff<'a> {
    old: Option<&'a Snapshot>,
    new: &'a Snapshot,
}

impl<'a> ResourceDiff<'a> {
    /// Creates a diff between the applied and the proposed snapshot.
    #[must_use]
    pub const fn new(old: Option<&'a Snapshot>, new: &'a Snapshot) -> Self {
        Self { old, new }
    }

    /// Returns true if nothing has been applied yet.
    #[must_use]
    pub const fn is_new_resource(&self) -> bool {
        self.old.is_none()
    }

    /// Returns the proposed value of an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        present(self.new.get(key))
    }

    /// Returns the applied value of an attribute.
    #[must_use]
    pub fn get_old(&self, key: &str) -> Option<&'a Value> {
        present(self.old.and_then(|old| old.get(key)))
    }

    /// Returns the applied and proposed value of an attribute.
    #[must_use]
    pub fn get_change(&self, key: &str) -> (Option<&'a Value>, Option<&'a Value>) {
        (self.get_old(key), self.get(key))
    }

    /// Returns true if the attribute differs between the two snapshots.
    ///
    /// Sets are compared without regard to order.
    #[must_use]
    pub fn has_change(&self, key: &str) -> bool {
        match self.get_change(key) {
            (None, None) => false,
            (Some(old), Some(new)) => !values_equal(old, new),
            (Some(v), None) | (None, Some(v)) => !v.is_empty(),
        }
    }

    /// Names of all attributes that changed, sorted.
    #[must_use]
    pub fn changed_keys(&self) -> Vec<&'a str> {
        let mut keys: BTreeSet<&'a str> = self.new.keys().map(String::as_str).collect();
        if let Some(old) = self.old {
            keys.extend(old.keys().map(String::as_str));
        }
        keys.into_iter().filter(|key| self.has_change(key)).collect()
    }

    /// Force-new attributes that changed on an existing resource.
    #[must_use]
    pub fn requires_replacement(&self, schema: &ResourceSchema) -> Vec<String> {
        if self.is_new_resource() {
            return Vec::new();
        }

        schema
            .force_new_attributes()
            .into_iter()
            .filter(|key| self.has_change(key))
            .map(String::from)
            .collect()
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| **v != Value::Null)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Set(left), Value::Set(right)) => {
            left.len() == right.len() && left.iter().all(|item| right.contains(item))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::edge_rule_schema;

    fn snapshot(json: &str) -> Snapshot {
        serde_json::from_str(json).expect("valid snapshot json")
    }

    #[test]
    fn test_get_change() {
        let old = snapshot(r#"{"region": "DE"}"#);
        let new = snapshot(r#"{"region": "NY", "name": "x"}"#);
        let diff = ResourceDiff::new(Some(&old), &new);

        assert_eq!(
            diff.get_change("region"),
            (Some(&Value::string("DE")), Some(&Value::string("NY")))
        );
        assert_eq!(diff.get_change("name"), (None, Some(&Value::string("x"))));
        assert_eq!(diff.get_change("missing"), (None, None));
    }

    #[test]
    fn test_set_order_ignored() {
        let mut old = Snapshot::new();
        old.insert(String::from("regions"), Value::string_set(["NY", "SYD"]));
        let mut new = Snapshot::new();
        new.insert(String::from("regions"), Value::string_set(["SYD", "NY"]));

        let diff = ResourceDiff::new(Some(&old), &new);
        assert!(!diff.has_change("regions"));
    }

    #[test]
    fn test_changed_keys() {
        let old = snapshot(r#"{"a": 1, "b": 2, "c": null}"#);
        let new = snapshot(r#"{"a": 1, "b": 3, "d": true}"#);
        let diff = ResourceDiff::new(Some(&old), &new);

        assert_eq!(diff.changed_keys(), vec!["b", "d"]);
    }

    #[test]
    fn test_requires_replacement() {
        let schema = edge_rule_schema();
        let old = snapshot(r#"{"pull_zone_id": 1}"#);
        let new = snapshot(r#"{"pull_zone_id": 2}"#);

        assert_eq!(
            ResourceDiff::new(Some(&old), &new).requires_replacement(&schema),
            vec![String::from("pull_zone_id")]
        );
        assert!(ResourceDiff::new(None, &new).requires_replacement(&schema).is_empty());
    }
}
