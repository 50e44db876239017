//! Change plans: what applying a configuration to a resource would do.
//!
//! A plan is computed without any API call. It normalises the desired
//! configuration, compares it with the last applied state and runs the
//! resource's diff rules.

use std::fmt;
use tracing::debug;

use crate::diff::ResourceDiff;
use crate::error::{DiffErrors, Result};
use crate::resource::{Resource, ResourceData};
use crate::schema::Snapshot;

/// What applying the configuration would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    /// The resource does not exist yet.
    Create,
    /// Mutable attributes change in place.
    Update,
    /// A force-new attribute changed; the resource is deleted and recreated.
    Replace,
    /// Nothing to do.
    Noop,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Replace => write!(f, "replace"),
            Self::Noop => write!(f, "no-op"),
        }
    }
}

/// Outcome of planning one resource change.
#[derive(Debug, Clone)]
pub struct ChangePlan {
    /// Resource type name.
    pub resource_type: String,
    /// Planned action.
    pub action: PlanAction,
    /// Configurable attributes that change.
    pub changed: Vec<String>,
    /// Force-new attributes that change.
    pub replace: Vec<String>,
    /// Normalised desired configuration.
    pub desired: Snapshot,
    /// Rejections from the diff rules, if any.
    pub rejections: Option<DiffErrors>,
}

impl ChangePlan {
    /// Plans applying `config` to a resource last applied as `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the state does not match
    /// the resource schema. Rule rejections are recorded in the plan.
    pub fn compute(
        resource: &dyn Resource,
        config: &Snapshot,
        state: Option<&ResourceData>,
    ) -> Result<Self> {
        let schema = resource.schema();
        let desired = schema.normalize_config(config)?;

        // State without id means the resource is gone; plan a fresh create.
        let old = state
            .filter(|s| s.id().is_some())
            .map(|s| schema.normalize_state(&s.attributes))
            .transpose()?;

        let diff = ResourceDiff::new(old.as_ref(), &desired);
        let rejections = resource.customize_diff().run(&diff).err();

        let changed: Vec<String> = diff
            .changed_keys()
            .into_iter()
            .filter(|key| schema.get(key).is_some_and(|a| !a.computed))
            .map(String::from)
            .collect();
        let replace = diff.requires_replacement(schema);

        let action = if diff.is_new_resource() {
            PlanAction::Create
        } else if !replace.is_empty() {
            PlanAction::Replace
        } else if changed.is_empty() {
            PlanAction::Noop
        } else {
            PlanAction::Update
        };

        debug!(
            "Planned {action} of {} ({} changed, {} rejected)",
            resource.type_name(),
            changed.len(),
            rejections.as_ref().map_or(0, DiffErrors::len)
        );

        Ok(Self {
            resource_type: resource.type_name().to_string(),
            action,
            changed,
            replace,
            desired,
            rejections,
        })
    }

    /// Returns true if a diff rule rejected the change.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        self.rejections.is_some()
    }

    /// Fails with the rejections if the change was rejected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ProviderError::Diff`] if any rule rejected the change.
    pub fn accepted(self) -> Result<Self> {
        match self.rejections {
            Some(errors) => Err(errors.into()),
            None => Ok(self),
        }
    }

    /// JSON representation for machine-readable output.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let rejections: Vec<String> = self
            .rejections
            .iter()
            .flat_map(DiffErrors::iter)
            .map(ToString::to_string)
            .collect();

        serde_json::json!({
            "resource_type": self.resource_type,
            "action": self.action.to_string(),
            "accepted": !self.is_rejected(),
            "changed": self.changed,
            "replace": self.replace,
            "rejections": rejections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bunny::BunnyClient;
    use crate::config::ProviderConfig;
    use crate::resource::{EdgeRuleResource, StorageZoneResource};

    fn client() -> BunnyClient {
        BunnyClient::new(&ProviderConfig::new("test-key")).expect("client")
    }

    fn snapshot(json: &str) -> Snapshot {
        serde_json::from_str(json).expect("valid snapshot json")
    }

    fn state(id: &str, json: &str) -> ResourceData {
        let mut data = ResourceData::new(snapshot(json));
        data.set_id(id);
        data
    }

    #[test]
    fn test_new_resource_is_created() {
        let resource = StorageZoneResource::new(client());
        let config = snapshot(r#"{"name": "assets", "zone_tier": 0}"#);
        let plan = ChangePlan::compute(&resource, &config, None).expect("plan");

        assert_eq!(plan.action, PlanAction::Create);
        assert!(!plan.is_rejected());
    }

    #[test]
    fn test_computed_attributes_do_not_count_as_changes() {
        let resource = StorageZoneResource::new(client());
        let applied = state(
            "12",
            r#"{"name": "assets", "zone_tier": 0, "region": "DE", "password": "pw",
                "custom_404_file_path": "/bunnycdn_errors/404.html", "rewrite_404_to_200": false}"#,
        );

        let config = snapshot(r#"{"name": "assets", "zone_tier": 0}"#);
        let plan = ChangePlan::compute(&resource, &config, Some(&applied)).expect("plan");

        assert_eq!(plan.action, PlanAction::Noop);
    }

    #[test]
    fn test_rejected_plan_fails_accepted() {
        let resource = StorageZoneResource::new(client());
        let applied = state("12", r#"{"name": "assets", "zone_tier": 0, "region": "DE"}"#);

        let plan = ChangePlan::compute(
            &resource,
            &snapshot(r#"{"name": "assets", "zone_tier": 0, "region": "NY"}"#),
            Some(&applied),
        )
        .expect("plan");

        assert!(plan.is_rejected());
        assert_eq!(plan.to_json()["accepted"], false);
        assert!(plan.accepted().is_err());
    }

    #[test]
    fn test_pull_zone_change_replaces_edge_rule() {
        let resource = EdgeRuleResource::new(client());
        let config = r#"{"pull_zone_id": 43, "action_type": "force_ssl",
                         "trigger": [{"type": "url", "patterns": ["*"]}]}"#;
        let applied = state(
            "g-1",
            r#"{"pull_zone_id": 42, "action_type": "force_ssl", "guid": "g-1",
                "trigger": [{"type": "url", "patterns": ["*"]}]}"#,
        );

        let plan = ChangePlan::compute(&resource, &snapshot(config), Some(&applied)).expect("plan");

        assert_eq!(plan.action, PlanAction::Replace);
        assert_eq!(plan.replace, vec![String::from("pull_zone_id")]);
    }
}
