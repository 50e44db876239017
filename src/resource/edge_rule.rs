//! The `bunny_edgerule` resource.
//!
//! Edge rules live inside a pull zone and are identified by a GUID the API
//! assigns. Creation therefore compares the rules of the pull zone before
//! and after the rule is added.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::bunny::{BunnyClient, EdgeRule, EdgeRuleTrigger};
use crate::catalog::{
    CodeTable, EDGE_RULE_ACTION_TYPES, EDGE_RULE_MATCHING_TYPES, EDGE_RULE_TRIGGER_TYPES,
};
use crate::diff::CustomizeDiff;
use crate::error::{ApiError, ResourceError, Result};
use crate::schema::edge_rule::{
    DEFAULT_MATCH_TYPE, KEY_ACTION_PARAMETER_1, KEY_ACTION_PARAMETER_2, KEY_ACTION_TYPE,
    KEY_DESCRIPTION, KEY_ENABLED, KEY_GUID, KEY_MATCH_TYPE, KEY_PULL_ZONE_ID, KEY_TRIGGER,
    KEY_TRIGGER_PARAMETER_1, KEY_TRIGGER_PATTERNS, KEY_TRIGGER_TYPE,
};
use crate::schema::{EDGE_RULE_TYPE, ResourceSchema, Value, edge_rule_schema};

use super::{Resource, ResourceData};

/// Edge rule resource backed by the Bunny API.
#[derive(Debug)]
pub struct EdgeRuleResource {
    client: BunnyClient,
    schema: ResourceSchema,
    rules: CustomizeDiff,
}

impl EdgeRuleResource {
    /// Creates the resource.
    #[must_use]
    pub fn new(client: BunnyClient) -> Self {
        Self {
            client,
            schema: edge_rule_schema(),
            rules: CustomizeDiff::new(),
        }
    }
}

fn lookup_code(table: &CodeTable, key: &str, name: &str) -> Result<i64> {
    table
        .code(name)
        .ok_or_else(|| ResourceError::attribute(key, format!("unknown value '{name}'")).into())
}

fn lookup_name(table: &CodeTable, key: &str, code: i64) -> Result<&'static str> {
    table.name(code).ok_or_else(|| {
        ApiError::invalid_response(format!("unknown {key} code {code}")).into()
    })
}

fn pull_zone_id(data: &ResourceData) -> Result<i64> {
    data.get_int(KEY_PULL_ZONE_ID)
        .ok_or_else(|| {
            ResourceError::attribute(KEY_PULL_ZONE_ID, "an edge rule needs a pull zone id").into()
        })
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn trigger_from_value(value: &Value) -> Result<EdgeRuleTrigger> {
    let fields = value
        .as_map()
        .ok_or_else(|| ResourceError::attribute(KEY_TRIGGER, "each trigger must be an object"))?;

    let trigger_type = fields
        .get(KEY_TRIGGER_TYPE)
        .and_then(Value::as_str)
        .ok_or_else(|| ResourceError::attribute(KEY_TRIGGER_TYPE, "a trigger needs a type"))?;
    let match_type = fields
        .get(KEY_MATCH_TYPE)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_MATCH_TYPE);

    Ok(EdgeRuleTrigger {
        trigger_type: lookup_code(&EDGE_RULE_TRIGGER_TYPES, KEY_TRIGGER_TYPE, trigger_type)?,
        pattern_matches: fields
            .get(KEY_TRIGGER_PATTERNS)
            .map(|v| v.string_items().into_iter().map(String::from).collect())
            .unwrap_or_default(),
        pattern_matching_type: lookup_code(&EDGE_RULE_MATCHING_TYPES, KEY_MATCH_TYPE, match_type)?,
        parameter_1: optional_string(fields.get(KEY_TRIGGER_PARAMETER_1)),
    })
}

fn trigger_to_value(trigger: &EdgeRuleTrigger) -> Result<Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        KEY_TRIGGER_TYPE.to_string(),
        Value::string(lookup_name(
            &EDGE_RULE_TRIGGER_TYPES,
            KEY_TRIGGER_TYPE,
            trigger.trigger_type,
        )?),
    );
    fields.insert(
        KEY_MATCH_TYPE.to_string(),
        Value::string(lookup_name(
            &EDGE_RULE_MATCHING_TYPES,
            KEY_MATCH_TYPE,
            trigger.pattern_matching_type,
        )?),
    );
    fields.insert(
        KEY_TRIGGER_PATTERNS.to_string(),
        Value::List(trigger.pattern_matches.iter().map(Value::string).collect()),
    );
    if let Some(parameter) = trigger.parameter_1.as_deref().filter(|p| !p.is_empty()) {
        fields.insert(KEY_TRIGGER_PARAMETER_1.to_string(), Value::string(parameter));
    }

    Ok(Value::Map(fields))
}

/// Builds the API edge rule from resource data.
///
/// # Errors
///
/// Returns an error if an action, trigger or matching type is unknown.
pub fn edge_rule_from_resource(data: &ResourceData) -> Result<EdgeRule> {
    let action_type = data
        .get_str(KEY_ACTION_TYPE)
        .ok_or_else(|| {
            ResourceError::attribute(KEY_ACTION_TYPE, "an edge rule needs an action type")
        })?;
    let match_type = data.get_str(KEY_MATCH_TYPE).unwrap_or(DEFAULT_MATCH_TYPE);

    let triggers = data
        .get(KEY_TRIGGER)
        .and_then(Value::as_items)
        .unwrap_or_default()
        .iter()
        .map(trigger_from_value)
        .collect::<Result<Vec<_>>>()?;

    Ok(EdgeRule {
        guid: data.id().map(String::from),
        action_type: lookup_code(&EDGE_RULE_ACTION_TYPES, KEY_ACTION_TYPE, action_type)?,
        action_parameter_1: data.get_str(KEY_ACTION_PARAMETER_1).map(String::from),
        action_parameter_2: data.get_str(KEY_ACTION_PARAMETER_2).map(String::from),
        triggers,
        trigger_matching_type: lookup_code(&EDGE_RULE_MATCHING_TYPES, KEY_MATCH_TYPE, match_type)?,
        description: data.get_str(KEY_DESCRIPTION).map(String::from),
        enabled: data.get_bool(KEY_ENABLED).unwrap_or(true),
    })
}

/// Copies an API edge rule into resource data.
///
/// # Errors
///
/// Returns an error if the API returned a code this provider does not know.
pub fn edge_rule_to_resource(rule: &EdgeRule, data: &mut ResourceData) -> Result<()> {
    if let Some(guid) = &rule.guid {
        data.set_id(guid.as_str());
        data.set(KEY_GUID, guid.as_str());
    }

    let triggers = rule
        .triggers
        .iter()
        .map(trigger_to_value)
        .collect::<Result<Vec<_>>>()?;

    data.set(KEY_ENABLED, rule.enabled);
    data.set(KEY_DESCRIPTION, rule.description.clone().filter(|d| !d.is_empty()));
    data.set(
        KEY_ACTION_TYPE,
        lookup_name(&EDGE_RULE_ACTION_TYPES, KEY_ACTION_TYPE, rule.action_type)?,
    );
    data.set(KEY_ACTION_PARAMETER_1, rule.action_parameter_1.clone().filter(|p| !p.is_empty()));
    data.set(KEY_ACTION_PARAMETER_2, rule.action_parameter_2.clone().filter(|p| !p.is_empty()));
    data.set(
        KEY_MATCH_TYPE,
        lookup_name(&EDGE_RULE_MATCHING_TYPES, KEY_MATCH_TYPE, rule.trigger_matching_type)?,
    );
    data.set(KEY_TRIGGER, Value::List(triggers));

    Ok(())
}

#[async_trait]
impl Resource for EdgeRuleResource {
    fn type_name(&self) -> &'static str {
        EDGE_RULE_TYPE
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn customize_diff(&self) -> &CustomizeDiff {
        &self.rules
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let pull_zone_id = pull_zone_id(data)?;
        let mut rule = edge_rule_from_resource(data)?;
        rule.guid = None;

        let existing: HashSet<String> = self
            .client
            .get_pull_zone(pull_zone_id)
            .await?
            .edge_rules
            .into_iter()
            .filter_map(|r| r.guid)
            .collect();

        info!("Adding edge rule to pull zone {pull_zone_id}");
        self.client.add_or_update_edge_rule(pull_zone_id, &rule).await?;

        let mut added: Vec<EdgeRule> = self
            .client
            .get_pull_zone(pull_zone_id)
            .await?
            .edge_rules
            .into_iter()
            .filter(|r| r.guid.as_ref().is_some_and(|guid| !existing.contains(guid)))
            .collect();

        if added.len() > 1 {
            warn!(
                "{} new edge rules appeared on pull zone {pull_zone_id}, matching by description",
                added.len()
            );
            added.retain(|r| {
                r.description == rule.description && r.action_type == rule.action_type
            });
        }

        let created = added.into_iter().next().ok_or_else(|| {
            ApiError::invalid_response(format!(
                "edge rule was added but not found on pull zone {pull_zone_id}"
            ))
        })?;

        edge_rule_to_resource(&created, data)?;
        info!("Edge rule {} created", data.id().unwrap_or_default());

        Ok(())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let pull_zone_id = pull_zone_id(data)?;
        let guid = data
            .id()
            .map(String::from)
            .ok_or_else(|| ResourceError::MissingId { resource_type: EDGE_RULE_TYPE.to_string() })?;
        debug!("Reading edge rule {guid} of pull zone {pull_zone_id}");

        let pull_zone = match self.client.get_pull_zone(pull_zone_id).await {
            Ok(pull_zone) => pull_zone,
            Err(e) if e.is_not_found() => {
                warn!("Pull zone {pull_zone_id} is gone, removing edge rule {guid}");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match pull_zone
            .edge_rules
            .iter()
            .find(|r| r.guid.as_deref() == Some(guid.as_str()))
        {
            Some(rule) => edge_rule_to_resource(rule, data),
            None => {
                warn!("Edge rule {guid} no longer exists on pull zone {pull_zone_id}");
                data.clear_id();
                Ok(())
            }
        }
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let pull_zone_id = pull_zone_id(data)?;
        let rule = edge_rule_from_resource(data)?;
        if rule.guid.is_none() {
            return Err(ResourceError::MissingId {
                resource_type: EDGE_RULE_TYPE.to_string(),
            }
            .into());
        }

        info!("Updating edge rule on pull zone {pull_zone_id}");
        self.client.add_or_update_edge_rule(pull_zone_id, &rule).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let pull_zone_id = pull_zone_id(data)?;
        let guid = data
            .id()
            .map(String::from)
            .ok_or_else(|| ResourceError::MissingId { resource_type: EDGE_RULE_TYPE.to_string() })?;

        info!("Deleting edge rule {guid} from pull zone {pull_zone_id}");
        self.client.delete_edge_rule(pull_zone_id, &guid).await?;
        data.clear_id();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::error::ProviderError;
    use crate::schema::Snapshot;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> Snapshot {
        let input: Snapshot = serde_json::from_str(
            r#"{
                "pull_zone_id": 42,
                "action_type": "block_request",
                "description": "block RU",
                "trigger": [{"type": "country_code", "patterns": ["RU"]}]
            }"#,
        )
        .expect("valid json");

        edge_rule_schema().normalize_config(&input).expect("valid edge rule config")
    }

    fn api_rule(guid: &str) -> serde_json::Value {
        serde_json::json!({
            "Guid": guid,
            "ActionType": 4,
            "Triggers": [{"Type": 4, "PatternMatches": ["RU"], "PatternMatchingType": 0}],
            "TriggerMatchingType": 0,
            "Description": "block RU",
            "Enabled": true
        })
    }

    fn resource(server: &MockServer) -> EdgeRuleResource {
        let config = ProviderConfig::new("test-key").with_api_url(server.uri());
        let client = BunnyClient::new(&config)
            .expect("client")
            .with_retry_delay(Duration::from_millis(1));
        EdgeRuleResource::new(client)
    }

    #[test]
    fn test_from_resource_maps_codes() {
        let rule = edge_rule_from_resource(&ResourceData::new(config())).expect("mappable");

        assert_eq!(rule.action_type, 4);
        assert_eq!(rule.trigger_matching_type, 0);
        assert!(rule.enabled);
        assert_eq!(rule.triggers.len(), 1);
        assert_eq!(rule.triggers[0].trigger_type, 4);
        assert_eq!(rule.triggers[0].pattern_matches, vec![String::from("RU")]);
    }

    #[test]
    fn test_to_resource_maps_names() {
        let rule: EdgeRule = serde_json::from_value(api_rule("g-1")).expect("valid rule");
        let mut data = ResourceData::default();
        edge_rule_to_resource(&rule, &mut data).expect("mappable");

        assert_eq!(data.id(), Some("g-1"));
        assert_eq!(data.get_str(KEY_ACTION_TYPE), Some("block_request"));
        assert_eq!(data.get_str(KEY_MATCH_TYPE), Some("any"));

        let triggers = data.get(KEY_TRIGGER).and_then(Value::as_items).expect("triggers");
        let trigger = triggers[0].as_map().expect("object");
        assert_eq!(trigger[KEY_TRIGGER_TYPE], Value::string("country_code"));
    }

    #[test]
    fn test_unknown_action_code() {
        let rule = EdgeRule { action_type: 99, ..EdgeRule::default() };
        assert!(edge_rule_to_resource(&rule, &mut ResourceData::default()).is_err());
    }

    #[tokio::test]
    async fn test_create_takes_new_guid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pullzone/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 42,
                "EdgeRules": [api_rule("old")]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/pullzone/42/edgerules/addOrUpdate"))
            .and(body_json(serde_json::json!({
                "ActionType": 4,
                "ActionParameter1": null,
                "ActionParameter2": null,
                "Triggers": [{
                    "Type": 4,
                    "PatternMatches": ["RU"],
                    "PatternMatchingType": 0,
                    "Parameter1": null
                }],
                "TriggerMatchingType": 0,
                "Description": "block RU",
                "Enabled": true
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pullzone/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 42,
                "EdgeRules": [api_rule("old"), api_rule("new")]
            })))
            .mount(&server)
            .await;

        let mut data = ResourceData::new(config());
        resource(&server).create(&mut data).await.expect("created");

        assert_eq!(data.id(), Some("new"));
        assert_eq!(data.get_str(KEY_GUID), Some("new"));
    }

    #[tokio::test]
    async fn test_update_posts_stored_guid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pullzone/42/edgerules/addOrUpdate"))
            .and(body_json(serde_json::json!({
                "Guid": "g-1",
                "ActionType": 4,
                "ActionParameter1": null,
                "ActionParameter2": null,
                "Triggers": [{
                    "Type": 4,
                    "PatternMatches": ["RU"],
                    "PatternMatchingType": 0,
                    "Parameter1": null
                }],
                "TriggerMatchingType": 0,
                "Description": "block RU",
                "Enabled": true
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut data = ResourceData::new(config());
        data.set_id("g-1");
        resource(&server).update(&mut data).await.expect("updated");

        assert_eq!(data.id(), Some("g-1"));
    }

    #[tokio::test]
    async fn test_update_without_id_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut data = ResourceData::new(config());
        let err = resource(&server).update(&mut data).await.expect_err("no guid");

        assert!(matches!(
            err,
            ProviderError::Resource(ResourceError::MissingId { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_missing_rule_clears_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pullzone/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": 42,
                "EdgeRules": [api_rule("other")]
            })))
            .mount(&server)
            .await;

        let mut data = ResourceData::new(config());
        data.set_id("gone");
        resource(&server).read(&mut data).await.expect("read");

        assert!(data.id().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_guid() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/pullzone/42/edgerules/g-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut data = ResourceData::new(config());
        data.set_id("g-1");
        resource(&server).delete(&mut data).await.expect("deleted");

        assert!(data.id().is_none());
    }
}
