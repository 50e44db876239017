//! Attribute and resource schema definitions.
//!
//! Resources declare a schema for their attributes. The schema turns raw
//! input (a configuration file or a stored state) into a [`Snapshot`]
//! with defaults applied, sets deduplicated and every value type-checked.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use crate::error::{SchemaError, SchemaErrors};

use super::value::{Snapshot, Value};

/// Attribute type.
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered set without duplicates
    Set(Box<AttributeType>),
    /// Nested block with its own attributes
    Object(Vec<AttributeSchema>),
}

/// Additional restriction on scalar values (or on each collection element).
#[derive(Debug, Clone)]
pub enum Constraint {
    /// String must be one of the listed values (case-sensitive).
    OneOf(Vec<String>),
    /// Integer must lie in the inclusive range.
    IntBetween(i64, i64),
}

/// How input should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// User configuration: defaults apply, required attributes are
    /// enforced and computed attributes are rejected.
    Config,
    /// Previously applied state: computed attributes are accepted and
    /// nothing is filled in.
    State,
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    /// Attribute name.
    pub name: String,
    /// Value type.
    pub attr_type: AttributeType,
    /// Must be configured.
    pub required: bool,
    /// Set by the provider, never by the user.
    pub computed: bool,
    /// Hidden in output.
    pub sensitive: bool,
    /// Changing the value on an existing resource requires replacing it.
    pub force_new: bool,
    /// Value used when the attribute is not configured.
    pub default: Option<Value>,
    /// Human readable description.
    pub description: Option<String>,
    /// Restriction on values.
    pub constraint: Option<Constraint>,
}

impl AttributeSchema {
    /// Creates an optional attribute.
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            description: None,
            constraint: None,
        }
    }

    /// Marks the attribute as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the attribute as optional, undoing [`Self::required`].
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the attribute as computed.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Marks the attribute as sensitive.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Marks the attribute as requiring replacement when changed.
    #[must_use]
    pub const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Restricts string values to the given set.
    #[must_use]
    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        self.constraint = Some(Constraint::OneOf(
            allowed.iter().map(|s| (*s).to_string()).collect(),
        ));
        self
    }

    /// Restricts integer values to an inclusive range.
    #[must_use]
    pub fn int_between(mut self, min: i64, max: i64) -> Self {
        self.constraint = Some(Constraint::IntBetween(min, max));
        self
    }

    fn normalize_value(
        &self,
        path: &str,
        ty: &AttributeType,
        value: &Value,
        mode: NormalizeMode,
    ) -> Result<Value, Vec<SchemaError>> {
        match (ty, value) {
            (_, Value::Null) => Ok(Value::Null),
            (AttributeType::String, Value::String(_))
            | (AttributeType::Int, Value::Int(_))
            | (AttributeType::Bool, Value::Bool(_)) => {
                self.check_constraint(path, value).map_err(|e| vec![e])?;
                Ok(value.clone())
            }
            (AttributeType::List(inner), Value::List(items) | Value::Set(items)) => {
                let items = self.normalize_items(path, inner, items, mode)?;
                Ok(Value::List(items))
            }
            (AttributeType::Set(inner), Value::List(items) | Value::Set(items)) => {
                let items = self.normalize_items(path, inner, items, mode)?;
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Set(unique))
            }
            (AttributeType::Object(attributes), Value::Map(fields)) => {
                normalize_block(attributes, fields, Some(path), mode).map(Value::Map)
            }
            _ => Err(vec![SchemaError::TypeMismatch {
                name: path.to_string(),
                expected: ty.to_string(),
                got: value.type_name().to_string(),
            }]),
        }
    }

    fn normalize_items(
        &self,
        path: &str,
        inner: &AttributeType,
        items: &[Value],
        mode: NormalizeMode,
    ) -> Result<Vec<Value>, Vec<SchemaError>> {
        let mut errors = Vec::new();
        let mut normalized = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            match self.normalize_value(&format!("{path}[{i}]"), inner, item, mode) {
                Ok(v) => normalized.push(v),
                Err(e) => errors.extend(e),
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }

    fn check_constraint(&self, path: &str, value: &Value) -> Result<(), SchemaError> {
        match (&self.constraint, value) {
            (Some(Constraint::OneOf(allowed)), Value::String(s)) if !allowed.contains(s) => {
                Err(SchemaError::ValueNotAllowed {
                    name: path.to_string(),
                    value: s.clone(),
                    allowed: allowed.clone(),
                })
            }
            (Some(Constraint::IntBetween(min, max)), Value::Int(n)) if n < min || n > max => {
                Err(SchemaError::OutOfRange {
                    name: path.to_string(),
                    value: *n,
                    min: *min,
                    max: *max,
                })
            }
            _ => Ok(()),
        }
    }

    /// JSON description of this attribute.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut out = serde_json::json!({
            "type": self.attr_type.to_string(),
            "required": self.required,
            "computed": self.computed,
        });

        if self.sensitive {
            out["sensitive"] = serde_json::json!(true);
        }
        if self.force_new {
            out["force_new"] = serde_json::json!(true);
        }
        if let Some(default) = &self.default {
            out["default"] = default.to_json();
        }
        if let Some(desc) = &self.description {
            out["description"] = serde_json::json!(desc);
        }
        match &self.constraint {
            Some(Constraint::OneOf(allowed)) => out["allowed_values"] = serde_json::json!(allowed),
            Some(Constraint::IntBetween(min, max)) => {
                out["range"] = serde_json::json!([min, max]);
            }
            None => {}
        }
        if let Some(nested) = self.attr_type.nested() {
            out["attributes"] = describe_block(nested);
        }

        out
    }
}

impl AttributeType {
    fn nested(&self) -> Option<&[AttributeSchema]> {
        match self {
            Self::Object(attributes) => Some(attributes),
            Self::List(inner) | Self::Set(inner) => inner.nested(),
            Self::String | Self::Int | Self::Bool => None,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::List(inner) => write!(f, "list({inner})"),
            Self::Set(inner) => write!(f, "set({inner})"),
            Self::Object(_) => write!(f, "object"),
        }
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Resource type name, as exposed to configurations.
    pub resource_type: String,
    /// Attributes in declaration order.
    pub attributes: Vec<AttributeSchema>,
    /// Human readable description.
    pub description: Option<String>,
}

impl ResourceSchema {
    /// Creates an empty schema.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: Vec::new(),
            description: None,
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.push(schema);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of attributes that force replacement when changed.
    #[must_use]
    pub fn force_new_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Normalises user configuration into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns every schema violation found.
    pub fn normalize_config(&self, input: &Snapshot) -> Result<Snapshot, SchemaErrors> {
        self.normalize(input, NormalizeMode::Config)
    }

    /// Normalises a previously applied state into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns every schema violation found.
    pub fn normalize_state(&self, input: &Snapshot) -> Result<Snapshot, SchemaErrors> {
        self.normalize(input, NormalizeMode::State)
    }

    fn normalize(&self, input: &Snapshot, mode: NormalizeMode) -> Result<Snapshot, SchemaErrors> {
        debug!("Normalizing {} input ({mode:?})", self.resource_type);
        normalize_block(&self.attributes, input, None, mode).map_err(SchemaErrors)
    }

    /// JSON description of the schema.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.resource_type,
            "description": self.description,
            "attributes": describe_block(&self.attributes),
        })
    }
}

fn describe_block(attributes: &[AttributeSchema]) -> serde_json::Value {
    serde_json::Value::Object(
        attributes
            .iter()
            .map(|a| (a.name.clone(), a.describe()))
            .collect(),
    )
}

fn normalize_block(
    attributes: &[AttributeSchema],
    input: &BTreeMap<String, Value>,
    prefix: Option<&str>,
    mode: NormalizeMode,
) -> Result<Snapshot, Vec<SchemaError>> {
    let path_of = |name: &str| prefix.map_or_else(|| name.to_string(), |p| format!("{p}.{name}"));

    let mut errors = Vec::new();
    let mut out = Snapshot::new();
    let mut rejected: BTreeSet<&str> = BTreeSet::new();

    for (name, value) in input {
        let Some(schema) = attributes.iter().find(|a| a.name == *name) else {
            errors.push(SchemaError::UnknownAttribute { name: path_of(name) });
            continue;
        };

        if schema.computed && mode == NormalizeMode::Config && !value.is_empty() {
            errors.push(SchemaError::ComputedAttributeSet { name: path_of(name) });
            continue;
        }

        match schema.normalize_value(&path_of(name), &schema.attr_type, value, mode) {
            Ok(Value::Null) => {}
            Ok(v) => {
                out.insert(name.clone(), v);
            }
            Err(e) => {
                rejected.insert(name.as_str());
                errors.extend(e);
            }
        }
    }

    if mode == NormalizeMode::Config {
        for schema in attributes {
            if out.contains_key(&schema.name)
                || rejected.contains(schema.name.as_str())
                || schema.computed
            {
                continue;
            }
            if let Some(default) = &schema.default {
                out.insert(schema.name.clone(), default.clone());
            } else if schema.required {
                errors.push(SchemaError::MissingRequired {
                    name: path_of(&schema.name),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ResourceSchema {
        ResourceSchema::new("thing")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("color", AttributeType::String)
                    .with_default("red")
                    .one_of(&["red", "blue"]),
            )
            .attribute(
                AttributeSchema::new("tags", AttributeType::Set(Box::new(AttributeType::String)))
                    .one_of(&["a", "b", "c"]),
            )
            .attribute(AttributeSchema::new("tier", AttributeType::Int).int_between(0, 1))
            .attribute(AttributeSchema::new("secret", AttributeType::String).computed().sensitive())
    }

    fn input(json: &str) -> Snapshot {
        serde_json::from_str(json).expect("valid snapshot json")
    }

    #[test]
    fn test_defaults_applied() {
        let snapshot = schema()
            .normalize_config(&input(r#"{"name": "x"}"#))
            .expect("valid config");

        assert_eq!(snapshot["color"], Value::string("red"));
        assert!(!snapshot.contains_key("tags"));
    }

    #[test]
    fn test_set_deduplicated() {
        let snapshot = schema()
            .normalize_config(&input(r#"{"name": "x", "tags": ["a", "b", "a"]}"#))
            .expect("valid config");

        assert_eq!(snapshot["tags"], Value::string_set(["a", "b"]));
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = schema()
            .normalize_config(&input(r#"{"color": "green", "tags": ["z"], "tier": 5, "bogus": 1}"#))
            .expect_err("invalid config");

        assert_eq!(errors.0.len(), 5);
        assert!(errors.0.contains(&SchemaError::MissingRequired { name: String::from("name") }));
        assert!(errors.0.contains(&SchemaError::UnknownAttribute { name: String::from("bogus") }));
        assert!(errors.0.iter().any(|e| matches!(e, SchemaError::OutOfRange { value: 5, .. })));
        assert!(errors.0.iter().any(
            |e| matches!(e, SchemaError::ValueNotAllowed { name, .. } if name == "tags[0]")
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let errors = schema()
            .normalize_config(&input(r#"{"name": 3}"#))
            .expect_err("invalid config");

        assert_eq!(
            errors.0,
            vec![SchemaError::TypeMismatch {
                name: String::from("name"),
                expected: String::from("string"),
                got: String::from("int"),
            }]
        );
    }

    #[test]
    fn test_rejected_optional_value_not_defaulted() {
        let errors = schema()
            .normalize_config(&input(r#"{"name": "x", "color": "green"}"#))
            .expect_err("invalid config");

        assert_eq!(errors.0.len(), 1);
        assert!(matches!(
            &errors.0[0],
            SchemaError::ValueNotAllowed { name, .. } if name == "color"
        ));
    }

    #[test]
    fn test_computed_rejected_in_config_accepted_in_state() {
        let raw = input(r#"{"name": "x", "secret": "s3cret"}"#);

        assert!(schema().normalize_config(&raw).is_err());

        let state = schema().normalize_state(&raw).expect("valid state");
        assert_eq!(state["secret"], Value::string("s3cret"));
        assert!(!state.contains_key("color"));
    }

    #[test]
    fn test_nested_block_paths() {
        let schema = ResourceSchema::new("rule").attribute(AttributeSchema::new(
            "trigger",
            AttributeType::List(Box::new(AttributeType::Object(vec![
                AttributeSchema::new("kind", AttributeType::String)
                    .required()
                    .one_of(&["url"]),
            ]))),
        ));

        let errors = schema
            .normalize_config(&input(r#"{"trigger": [{"kind": "url"}, {}]}"#))
            .expect_err("second trigger misses kind");

        assert_eq!(
            errors.0,
            vec![SchemaError::MissingRequired { name: String::from("trigger[1].kind") }]
        );
    }

    #[test]
    fn test_describe_lists_allowed_values() {
        let description = schema().describe();
        assert_eq!(description["attributes"]["color"]["allowed_values"][1], "blue");
        assert_eq!(description["attributes"]["secret"]["sensitive"], true);
    }
}
