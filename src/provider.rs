//! Provider: the registry of resource types and the lifecycle driver.
//!
//! The provider plans every change before it calls the API. A plan that
//! any diff rule rejects never reaches the network.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::bunny::BunnyClient;
use crate::config::ProviderConfig;
use crate::error::{ResourceError, Result};
use crate::plan::{ChangePlan, PlanAction};
use crate::resource::{EdgeRuleResource, Resource, ResourceData, StorageZoneResource};
use crate::schema::Snapshot;

/// Registry of resource types sharing one API client.
pub struct Provider {
    resources: HashMap<&'static str, Box<dyn Resource>>,
}

impl Provider {
    /// Creates a provider and registers every resource type.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = BunnyClient::new(config)?;
        Ok(Self::with_client(&client))
    }

    /// Creates a provider around an existing client.
    #[must_use]
    pub fn with_client(client: &BunnyClient) -> Self {
        let mut provider = Self {
            resources: HashMap::new(),
        };
        provider.register(Box::new(StorageZoneResource::new(client.clone())));
        provider.register(Box::new(EdgeRuleResource::new(client.clone())));
        provider
    }

    /// Creates a provider without credentials.
    ///
    /// Schemas and plans work offline; lifecycle operations will be
    /// refused by the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn offline() -> Result<Self> {
        Self::new(&ProviderConfig::new(String::new()))
    }

    fn register(&mut self, resource: Box<dyn Resource>) {
        self.resources.insert(resource.type_name(), resource);
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.resources.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Looks up a resource type.
    ///
    /// # Errors
    ///
    /// Returns an error if no resource is registered under `name`.
    pub fn resource(&self, name: &str) -> Result<&dyn Resource> {
        self.resources
            .get(name)
            .map(|resource| &**resource)
            .ok_or_else(|| ResourceError::UnknownType { name: name.to_string() }.into())
    }

    /// Plans applying `config` to a resource last applied as `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the type is unknown or the documents do not
    /// match its schema.
    pub fn plan(
        &self,
        resource_type: &str,
        config: &Snapshot,
        state: Option<&ResourceData>,
    ) -> Result<ChangePlan> {
        ChangePlan::compute(self.resource(resource_type)?, config, state)
    }

    /// Creates a resource from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the change is rejected or the API call fails.
    pub async fn create(&self, resource_type: &str, config: &Snapshot) -> Result<ResourceData> {
        let resource = self.resource(resource_type)?;
        let plan = ChangePlan::compute(resource, config, None)?.accepted()?;

        let mut data = ResourceData::new(plan.desired);
        resource.create(&mut data).await?;

        Ok(data)
    }

    /// Refreshes a resource from the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn read(&self, resource_type: &str, mut state: ResourceData) -> Result<ResourceData> {
        self.resource(resource_type)?.read(&mut state).await?;
        Ok(state)
    }

    /// Applies a changed configuration to an existing resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the change is rejected or an API call fails.
    pub async fn update(
        &self,
        resource_type: &str,
        config: &Snapshot,
        state: ResourceData,
    ) -> Result<ResourceData> {
        let resource = self.resource(resource_type)?;
        let plan = ChangePlan::compute(resource, config, Some(&state))?.accepted()?;

        match plan.action {
            PlanAction::Noop => {
                info!("{resource_type} is up to date");
                Ok(state)
            }
            PlanAction::Create => {
                info!("{resource_type} has no id, creating it");
                let mut data = ResourceData::new(plan.desired);
                resource.create(&mut data).await?;
                Ok(data)
            }
            PlanAction::Replace => {
                warn!("Replacing {resource_type}: {} changed", plan.replace.join(", "));
                let mut old = state;
                resource.delete(&mut old).await?;

                let mut data = ResourceData::new(plan.desired);
                resource.create(&mut data).await?;
                Ok(data)
            }
            PlanAction::Update => {
                info!("Updating {resource_type}: {} changed", plan.changed.join(", "));
                let mut data = merge_computed(resource, plan.desired, state);
                resource.update(&mut data).await?;
                resource.read(&mut data).await?;
                Ok(data)
            }
        }
    }

    /// Deletes a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn delete(
        &self,
        resource_type: &str,
        mut state: ResourceData,
    ) -> Result<ResourceData> {
        self.resource(resource_type)?.delete(&mut state).await?;
        Ok(state)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resource_types())
            .finish()
    }
}

/// Desired attributes plus the computed attributes of the applied state.
fn merge_computed(resource: &dyn Resource, desired: Snapshot, state: ResourceData) -> ResourceData {
    let schema = resource.schema();
    let mut attributes = desired;

    for (key, value) in state.attributes {
        if schema.get(&key).is_some_and(|a| a.computed) {
            attributes.insert(key, value);
        }
    }

    ResourceData {
        id: state.id,
        attributes,
    }
}
