//! Schema of the `bunny_edgerule` resource.

use crate::catalog::{EDGE_RULE_ACTION_TYPES, EDGE_RULE_MATCHING_TYPES, EDGE_RULE_TRIGGER_TYPES};

use super::attribute::{AttributeSchema, AttributeType, ResourceSchema};

/// Resource type name.
pub const EDGE_RULE_TYPE: &str = "bunny_edgerule";

/// Pull zone the rule belongs to.
pub const KEY_PULL_ZONE_ID: &str = "pull_zone_id";
/// Rule identifier assigned by Bunny.
pub const KEY_GUID: &str = "guid";
/// Whether the rule is active.
pub const KEY_ENABLED: &str = "enabled";
/// Free-form description.
pub const KEY_DESCRIPTION: &str = "description";
/// Action to perform.
pub const KEY_ACTION_TYPE: &str = "action_type";
/// First action parameter.
pub const KEY_ACTION_PARAMETER_1: &str = "action_parameter_1";
/// Second action parameter.
pub const KEY_ACTION_PARAMETER_2: &str = "action_parameter_2";
/// How triggers are combined.
pub const KEY_MATCH_TYPE: &str = "match_type";
/// Trigger blocks.
pub const KEY_TRIGGER: &str = "trigger";
/// Trigger type, inside a trigger block.
pub const KEY_TRIGGER_TYPE: &str = "type";
/// Patterns, inside a trigger block.
pub const KEY_TRIGGER_PATTERNS: &str = "patterns";
/// Trigger parameter, inside a trigger block.
pub const KEY_TRIGGER_PARAMETER_1: &str = "parameter_1";

/// Default matching type for rules and triggers.
pub const DEFAULT_MATCH_TYPE: &str = "any";

fn keys_description(keys: &[&str]) -> String {
    format!("Possible values: {}", keys.join(", "))
}

fn trigger_schema(trigger_keys: &[&str], matching_keys: &[&str]) -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new(KEY_TRIGGER_TYPE, AttributeType::String)
            .required()
            .one_of(trigger_keys)
            .with_description(format!(
                "The type of the trigger. {}",
                keys_description(trigger_keys)
            )),
        AttributeSchema::new(KEY_MATCH_TYPE, AttributeType::String)
            .with_default(DEFAULT_MATCH_TYPE)
            .one_of(matching_keys)
            .with_description(format!(
                "How the patterns are matched. {}",
                keys_description(matching_keys)
            )),
        AttributeSchema::new(
            KEY_TRIGGER_PATTERNS,
            AttributeType::List(Box::new(AttributeType::String)),
        )
        .required()
        .with_description("The patterns the trigger matches against."),
        AttributeSchema::new(KEY_TRIGGER_PARAMETER_1, AttributeType::String)
            .with_description("The trigger parameter, for example the header name."),
    ]
}

/// Builds the edge rule schema.
#[must_use]
pub fn edge_rule_schema() -> ResourceSchema {
    let trigger_keys = EDGE_RULE_TRIGGER_TYPES.keys();
    let matching_keys = EDGE_RULE_MATCHING_TYPES.keys();
    let action_keys = EDGE_RULE_ACTION_TYPES.keys();

    ResourceSchema::new(EDGE_RULE_TYPE)
        .with_description("An edge rule of a Bunny pull zone.")
        .attribute(
            AttributeSchema::new(KEY_PULL_ZONE_ID, AttributeType::Int)
                .required()
                .force_new()
                .with_description("The ID of the pull zone the rule belongs to."),
        )
        .attribute(AttributeSchema::new(KEY_GUID, AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(KEY_ENABLED, AttributeType::Bool)
                .with_default(true)
                .with_description("Whether the edge rule is enabled."),
        )
        .attribute(
            AttributeSchema::new(KEY_DESCRIPTION, AttributeType::String)
                .with_description("The description of the edge rule."),
        )
        .attribute(
            AttributeSchema::new(KEY_ACTION_TYPE, AttributeType::String)
                .required()
                .one_of(&action_keys)
                .with_description(format!(
                    "The action performed when the rule matches. {}",
                    keys_description(&action_keys)
                )),
        )
        .attribute(
            AttributeSchema::new(KEY_ACTION_PARAMETER_1, AttributeType::String)
                .with_description("The first action parameter."),
        )
        .attribute(
            AttributeSchema::new(KEY_ACTION_PARAMETER_2, AttributeType::String)
                .with_description("The second action parameter."),
        )
        .attribute(
            AttributeSchema::new(KEY_MATCH_TYPE, AttributeType::String)
                .with_default(DEFAULT_MATCH_TYPE)
                .one_of(&matching_keys)
                .with_description(format!(
                    "How the triggers are combined. {}",
                    keys_description(&matching_keys)
                )),
        )
        .attribute(
            AttributeSchema::new(
                KEY_TRIGGER,
                AttributeType::List(Box::new(AttributeType::Object(trigger_schema(
                    &trigger_keys,
                    &matching_keys,
                )))),
            )
            .required()
            .with_description("The conditions that activate the rule."),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Snapshot, Value};

    #[test]
    fn test_trigger_defaults() {
        let input: Snapshot = serde_json::from_str(
            r#"{
                "pull_zone_id": 42,
                "action_type": "block_request",
                "trigger": [{"type": "country_code", "patterns": ["RU"]}]
            }"#,
        )
        .expect("valid json");

        let snapshot = edge_rule_schema()
            .normalize_config(&input)
            .expect("valid config");

        assert_eq!(snapshot[KEY_ENABLED], Value::Bool(true));
        assert_eq!(snapshot[KEY_MATCH_TYPE], Value::string("any"));

        let triggers = snapshot[KEY_TRIGGER].as_items().expect("list");
        let trigger = triggers[0].as_map().expect("object");
        assert_eq!(trigger[KEY_MATCH_TYPE], Value::string("any"));
    }

    #[test]
    fn test_unknown_trigger_type() {
        let input: Snapshot = serde_json::from_str(
            r#"{
                "pull_zone_id": 42,
                "action_type": "force_ssl",
                "trigger": [{"type": "cookie", "patterns": ["x"]}]
            }"#,
        )
        .expect("valid json");

        assert!(edge_rule_schema().normalize_config(&input).is_err());
    }

    #[test]
    fn test_pull_zone_forces_replacement() {
        assert_eq!(edge_rule_schema().force_new_attributes(), vec![KEY_PULL_ZONE_ID]);
    }
}
