//! Managed resources and their lifecycle.
//!
//! This module contains:
//! - The [`Resource`] trait implemented by every resource type
//! - [`ResourceData`], the id and attributes of one resource instance
//! - The storage zone and edge rule resources

mod edge_rule;
mod storage_zone;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::diff::CustomizeDiff;
use crate::error::{ResourceError, Result};
use crate::schema::{ResourceSchema, Snapshot, Value};

pub use edge_rule::EdgeRuleResource;
pub use storage_zone::{StorageZoneResource, storage_zone_rules};

/// Id and attributes of one resource instance.
///
/// An instance without id does not exist remotely, either because it was
/// never created or because it was deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Remote identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Attribute values.
    #[serde(default)]
    pub attributes: Snapshot,
}

impl ResourceData {
    /// Creates resource data without id.
    #[must_use]
    pub const fn new(attributes: Snapshot) -> Self {
        Self { id: None, attributes }
    }

    /// Returns the id, if set and non-empty.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Sets the id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Clears the id, marking the resource as gone.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Parses the id as a numeric API identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is missing or not an integer.
    pub fn id_as_int(&self, resource_type: &str) -> Result<i64> {
        let id = self.id().ok_or_else(|| ResourceError::MissingId {
            resource_type: resource_type.to_string(),
        })?;

        id.parse().map_err(|e| {
            ResourceError::InvalidId {
                resource_type: resource_type.to_string(),
                id: id.to_string(),
                message: format!("{e}"),
            }
            .into()
        })
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns a non-empty string attribute.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// Returns an integer attribute.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Returns a boolean attribute.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the string items of a list or set attribute.
    #[must_use]
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| v.string_items().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Sets an attribute; a null value removes it.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        match value.into() {
            Value::Null => {
                self.attributes.remove(key);
            }
            value => {
                self.attributes.insert(key.to_string(), value);
            }
        }
    }
}

/// A resource type the provider can manage.
///
/// Lifecycle operations take the instance data by mutable reference and
/// update it in place: ids are set on create and cleared on delete, and
/// computed attributes are filled from the API.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name, for example `bunny_storagezone`.
    fn type_name(&self) -> &'static str;

    /// Attribute schema.
    fn schema(&self) -> &ResourceSchema;

    /// Rules checked against every proposed change.
    fn customize_diff(&self) -> &CustomizeDiff;

    /// Creates the resource.
    async fn create(&self, data: &mut ResourceData) -> Result<()>;

    /// Refreshes `data` from the API.
    async fn read(&self, data: &mut ResourceData) -> Result<()>;

    /// Pushes the mutable attributes of `data` to the API.
    async fn update(&self, data: &mut ResourceData) -> Result<()>;

    /// Deletes the resource.
    async fn delete(&self, data: &mut ResourceData) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn test_id_parsing() {
        let mut data = ResourceData::default();
        assert!(matches!(
            data.id_as_int("bunny_storagezone"),
            Err(ProviderError::Resource(ResourceError::MissingId { .. }))
        ));

        data.set_id("abc");
        assert!(matches!(
            data.id_as_int("bunny_storagezone"),
            Err(ProviderError::Resource(ResourceError::InvalidId { .. }))
        ));

        data.set_id("42");
        assert_eq!(data.id_as_int("bunny_storagezone").expect("numeric id"), 42);

        data.clear_id();
        assert!(data.id().is_none());
    }

    #[test]
    fn test_set_null_removes() {
        let mut data = ResourceData::default();
        data.set("origin_url", "https://example.com");
        assert_eq!(data.get_str("origin_url"), Some("https://example.com"));

        data.set("origin_url", Option::<String>::None);
        assert!(data.get("origin_url").is_none());
    }

    #[test]
    fn test_serde_shape() {
        let mut data = ResourceData::default();
        data.set_id("7");
        data.set("name", "assets");

        let json = serde_json::to_value(&data).expect("serializable");
        assert_eq!(json, serde_json::json!({"id": "7", "attributes": {"name": "assets"}}));
    }
}
