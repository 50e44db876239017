//! Bunny API types and data structures.
//!
//! This module defines the types used for communication with the Bunny API.
//! Field names on the wire are PascalCase.

use serde::{Deserialize, Serialize};

/// A Bunny storage zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageZone {
    /// Storage zone identifier.
    #[serde(default)]
    pub id: Option<i64>,
    /// Owning user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Zone name.
    #[serde(default)]
    pub name: Option<String>,
    /// Read/write password.
    #[serde(default)]
    pub password: Option<String>,
    /// Read-only password.
    #[serde(default)]
    pub read_only_password: Option<String>,
    /// Deletion flag.
    #[serde(default)]
    pub deleted: Option<bool>,
    /// Bytes stored.
    #[serde(default)]
    pub storage_used: Option<i64>,
    /// Number of files stored.
    #[serde(default)]
    pub files_stored: Option<i64>,
    /// Primary region.
    #[serde(default)]
    pub region: Option<String>,
    /// Replication regions.
    #[serde(default)]
    pub replication_regions: Option<Vec<String>>,
    /// Storage tier, 0 for HDD and 1 for SSD.
    #[serde(default)]
    pub zone_tier: Option<i64>,
    /// Fallback origin.
    #[serde(default)]
    pub origin_url: Option<String>,
    /// Custom 404 page.
    #[serde(default)]
    pub custom_404_file_path: Option<String>,
    /// Rewrite 404 to 200 for extensionless URLs.
    #[serde(default)]
    pub rewrite_404_to_200: Option<bool>,
}

/// Fields accepted when creating a storage zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageZoneAddOptions {
    /// Zone name.
    pub name: String,
    /// Primary region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Replication regions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replication_regions: Vec<String>,
    /// Fallback origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    /// Storage tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_tier: Option<i64>,
}

/// Fields accepted when updating a storage zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageZoneUpdateOptions {
    /// Replication regions; the API calls them zones here.
    #[serde(rename = "ReplicationZones")]
    pub replication_regions: Vec<String>,
    /// Fallback origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    /// Custom 404 page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_404_file_path: Option<String>,
    /// Rewrite 404 to 200 for extensionless URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_404_to_200: Option<bool>,
}

/// A Bunny pull zone, reduced to what edge rules need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PullZone {
    /// Pull zone identifier.
    #[serde(default)]
    pub id: Option<i64>,
    /// Pull zone name.
    #[serde(default)]
    pub name: Option<String>,
    /// Edge rules attached to the pull zone.
    #[serde(default)]
    pub edge_rules: Vec<EdgeRule>,
}

/// An edge rule, as read from and sent to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeRule {
    /// Rule identifier; absent when creating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    /// Action code.
    #[serde(default)]
    pub action_type: i64,
    /// First action parameter.
    #[serde(default)]
    pub action_parameter_1: Option<String>,
    /// Second action parameter.
    #[serde(default)]
    pub action_parameter_2: Option<String>,
    /// Conditions that activate the rule.
    #[serde(default)]
    pub triggers: Vec<EdgeRuleTrigger>,
    /// How triggers are combined.
    #[serde(default)]
    pub trigger_matching_type: i64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the rule is active.
    #[serde(default)]
    pub enabled: bool,
}

/// One edge rule trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeRuleTrigger {
    /// Trigger code.
    #[serde(rename = "Type", default)]
    pub trigger_type: i64,
    /// Patterns to match.
    #[serde(default)]
    pub pattern_matches: Vec<String>,
    /// How patterns are combined.
    #[serde(default)]
    pub pattern_matching_type: i64,
    /// Trigger parameter, for example a header name.
    #[serde(default)]
    pub parameter_1: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ApiErrorBody {
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_zone_from_api() {
        let body = r#"{
            "Id": 12,
            "UserId": "u-1",
            "Name": "assets",
            "Password": "pw",
            "ReadOnlyPassword": "ro",
            "Deleted": false,
            "StorageUsed": 1024,
            "FilesStored": 3,
            "Region": "DE",
            "ReplicationRegions": ["NY"],
            "ZoneTier": 1,
            "Custom404FilePath": "/404.html",
            "Rewrite404To200": true,
            "DateModified": "2024-01-01T00:00:00"
        }"#;

        let zone: StorageZone = serde_json::from_str(body).expect("valid storage zone");
        assert_eq!(zone.id, Some(12));
        assert_eq!(zone.replication_regions, Some(vec![String::from("NY")]));
        assert_eq!(zone.custom_404_file_path.as_deref(), Some("/404.html"));
        assert_eq!(zone.rewrite_404_to_200, Some(true));
    }

    #[test]
    fn test_update_options_wire_names() {
        let options = StorageZoneUpdateOptions {
            replication_regions: vec![String::from("NY")],
            origin_url: None,
            custom_404_file_path: Some(String::from("/404.html")),
            rewrite_404_to_200: Some(false),
        };

        let json = serde_json::to_value(&options).expect("serializable");
        assert_eq!(json["ReplicationZones"][0], "NY");
        assert_eq!(json["Custom404FilePath"], "/404.html");
        assert_eq!(json["Rewrite404To200"], false);
        assert!(json.get("OriginUrl").is_none());
    }

    #[test]
    fn test_edge_rule_wire_names() {
        let rule = EdgeRule {
            guid: None,
            action_type: 4,
            action_parameter_1: Some(String::from("x")),
            triggers: vec![EdgeRuleTrigger {
                trigger_type: 4,
                pattern_matches: vec![String::from("RU")],
                pattern_matching_type: 0,
                parameter_1: None,
            }],
            enabled: true,
            ..EdgeRule::default()
        };

        let json = serde_json::to_value(&rule).expect("serializable");
        assert!(json.get("Guid").is_none());
        assert_eq!(json["ActionParameter1"], "x");
        assert_eq!(json["Triggers"][0]["Type"], 4);
        assert_eq!(json["Triggers"][0]["PatternMatches"][0], "RU");
    }
}
