//! The `bunny_storagezone` resource.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::bunny::{BunnyClient, StorageZone, StorageZoneAddOptions, StorageZoneUpdateOptions};
use crate::diff::{
    CustomizeDiff, DiffRule, validate_immutable_string, validate_region_not_self_replicating,
    validate_replication_regions_not_removed, validate_replication_required_for_region,
};
use crate::error::{ApiError, ResourceError, Result};
use crate::schema::storage_zone::{
    KEY_CUSTOM_404_FILE_PATH, KEY_DELETED, KEY_FILES_STORED, KEY_NAME, KEY_ORIGIN_URL,
    KEY_PASSWORD, KEY_READ_ONLY_PASSWORD, KEY_REGION, KEY_REPLICATION_REGIONS,
    KEY_REWRITE_404_TO_200, KEY_STORAGE_USED, KEY_USER_ID, KEY_ZONE_TIER,
};
use crate::schema::{ResourceSchema, STORAGE_ZONE_TYPE, Value, storage_zone_schema};

use super::{Resource, ResourceData};

/// Storage zone resource backed by the Bunny API.
#[derive(Debug)]
pub struct StorageZoneResource {
    client: BunnyClient,
    schema: ResourceSchema,
    rules: CustomizeDiff,
}

impl StorageZoneResource {
    /// Creates the resource.
    #[must_use]
    pub fn new(client: BunnyClient) -> Self {
        Self {
            client,
            schema: storage_zone_schema(),
            rules: storage_zone_rules(),
        }
    }
}

/// Rules every storage zone change must pass.
///
/// `name`, `region` and `zone_tier` are immutable, replication regions are
/// append-only, some regions need replication, and the primary region
/// cannot replicate to itself.
#[must_use]
pub fn storage_zone_rules() -> CustomizeDiff {
    CustomizeDiff::new()
        .rule(DiffRule::validate_change(KEY_NAME, validate_immutable_string))
        .rule(DiffRule::validate_change(KEY_REGION, validate_immutable_string))
        .rule(DiffRule::validate_change(KEY_ZONE_TIER, validate_immutable_string))
        .rule(DiffRule::validate_change(KEY_REPLICATION_REGIONS, |_, old, new| {
            validate_replication_regions_not_removed(old, new)
        }))
        .rule(DiffRule::if_value(
            KEY_REPLICATION_REGIONS,
            |regions| regions.is_none_or(Value::is_empty),
            DiffRule::validate_value(KEY_REGION, |region| {
                region
                    .and_then(Value::as_str)
                    .map_or(Ok(()), |region| validate_replication_required_for_region(region, None))
            }),
        ))
        .rule(DiffRule::if_diff(
            |diff| diff.get(KEY_REGION).is_some(),
            DiffRule::validate("region not replicated to itself", |diff| {
                let region = diff.get(KEY_REGION).and_then(Value::as_str).unwrap_or_default();
                validate_region_not_self_replicating(region, diff.get(KEY_REPLICATION_REGIONS))
            }),
        ))
}

/// Builds the create request from resource data.
///
/// # Errors
///
/// Returns an error if the name is missing.
pub fn storage_zone_add_options(data: &ResourceData) -> Result<StorageZoneAddOptions> {
    let name = data
        .get_str(KEY_NAME)
        .ok_or_else(|| ResourceError::attribute(KEY_NAME, "a storage zone needs a name"))?;

    Ok(StorageZoneAddOptions {
        name: name.to_string(),
        region: data.get_str(KEY_REGION).map(String::from),
        replication_regions: data.get_strings(KEY_REPLICATION_REGIONS),
        origin_url: data.get_str(KEY_ORIGIN_URL).map(String::from),
        zone_tier: data.get_int(KEY_ZONE_TIER),
    })
}

/// Builds the update request from resource data.
#[must_use]
pub fn storage_zone_update_options(data: &ResourceData) -> StorageZoneUpdateOptions {
    StorageZoneUpdateOptions {
        replication_regions: data.get_strings(KEY_REPLICATION_REGIONS),
        origin_url: data.get_str(KEY_ORIGIN_URL).map(String::from),
        custom_404_file_path: data.get_str(KEY_CUSTOM_404_FILE_PATH).map(String::from),
        rewrite_404_to_200: data.get_bool(KEY_REWRITE_404_TO_200),
    }
}

/// Copies an API storage zone into resource data.
///
/// Fields the API leaves out keep their configured value.
pub fn storage_zone_to_resource(zone: &StorageZone, data: &mut ResourceData) {
    if let Some(id) = zone.id {
        data.set_id(id.to_string());
    }

    data.set(KEY_USER_ID, zone.user_id.clone());
    data.set(KEY_NAME, zone.name.clone());
    data.set(KEY_PASSWORD, zone.password.clone());
    data.set(KEY_READ_ONLY_PASSWORD, zone.read_only_password.clone());
    data.set(KEY_DELETED, zone.deleted);
    data.set(KEY_STORAGE_USED, zone.storage_used);
    data.set(KEY_FILES_STORED, zone.files_stored);
    data.set(KEY_REGION, zone.region.clone());
    data.set(KEY_ZONE_TIER, zone.zone_tier);

    let current = data.get_strings(KEY_REPLICATION_REGIONS);
    let remote = zone.replication_regions.as_deref().unwrap_or_default();
    data.set(KEY_REPLICATION_REGIONS, replication_regions_value(&current, remote));

    if let Some(url) = zone.origin_url.as_deref().filter(|url| !url.is_empty()) {
        data.set(KEY_ORIGIN_URL, url);
    }
    if let Some(path) = &zone.custom_404_file_path {
        data.set(KEY_CUSTOM_404_FILE_PATH, path.as_str());
    }
    if let Some(rewrite) = zone.rewrite_404_to_200 {
        data.set(KEY_REWRITE_404_TO_200, rewrite);
    }
}

/// Keeps the configured spelling and order when the API returns the same
/// regions in another order or case.
fn replication_regions_value(current: &[String], remote: &[String]) -> Value {
    let mut regions: Vec<&str> = Vec::new();
    for region in remote {
        if !regions.iter().any(|r| r.eq_ignore_ascii_case(region)) {
            regions.push(region);
        }
    }

    if regions.is_empty() {
        return Value::Null;
    }

    let contains =
        |list: &[&str], region: &str| list.iter().any(|r| r.eq_ignore_ascii_case(region));
    let current_refs: Vec<&str> = current.iter().map(String::as_str).collect();
    let same = current_refs.len() == regions.len()
        && current_refs.iter().all(|region| contains(&regions, region));

    if same {
        Value::string_set(current_refs)
    } else {
        Value::string_set(regions)
    }
}

#[async_trait]
impl Resource for StorageZoneResource {
    fn type_name(&self) -> &'static str {
        STORAGE_ZONE_TYPE
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn customize_diff(&self) -> &CustomizeDiff {
        &self.rules
    }

    async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let options = storage_zone_add_options(data)?;
        info!("Creating storage zone '{}'", options.name);

        let zone = self.client.add_storage_zone(&options).await?;
        let id = zone
            .id
            .ok_or_else(|| ApiError::invalid_response("created storage zone has no Id"))?;
        data.set_id(id.to_string());

        // Only part of the zone can be set on creation; update sets the rest.
        if let Err(e) = self.update(data).await {
            warn!("Storage zone {id} was created but setting its attributes failed: {e}");
            storage_zone_to_resource(&zone, data);
            return Err(ResourceError::PartiallyCreated {
                resource_type: STORAGE_ZONE_TYPE.to_string(),
                id: id.to_string(),
                step: String::from("setting storage zone attributes via update"),
                reason: e.to_string(),
            }
            .into());
        }

        info!("Storage zone '{}' created with id {id}", options.name);
        Ok(())
    }

    async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.id_as_int(STORAGE_ZONE_TYPE)?;
        debug!("Reading storage zone {id}");

        let zone = self.client.get_storage_zone(id).await?;
        storage_zone_to_resource(&zone, data);

        Ok(())
    }

    async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.id_as_int(STORAGE_ZONE_TYPE)?;
        let options = storage_zone_update_options(data);
        info!("Updating storage zone {id}");

        self.client.update_storage_zone(id, &options).await
    }

    async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        let id = data.id_as_int(STORAGE_ZONE_TYPE)?;
        info!("Deleting storage zone {id} and all the data it contains");

        self.client.delete_storage_zone(id).await?;
        data.clear_id();

        Ok(())
    }
}
