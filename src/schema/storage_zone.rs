//! Schema of the `bunny_storagezone` resource.

use crate::catalog::{DEFAULT_REGION, STORAGE_ZONE_REGIONS};

use super::attribute::{AttributeSchema, AttributeType, ResourceSchema};

/// Resource type name.
pub const STORAGE_ZONE_TYPE: &str = "bunny_storagezone";

/// Zone name (immutable).
pub const KEY_NAME: &str = "name";
/// Primary region (immutable).
pub const KEY_REGION: &str = "region";
/// Replication regions (append-only).
pub const KEY_REPLICATION_REGIONS: &str = "replication_regions";
/// Storage tier, 0 for HDD and 1 for SSD (immutable).
pub const KEY_ZONE_TIER: &str = "zone_tier";
/// Fallback origin.
pub const KEY_ORIGIN_URL: &str = "origin_url";
/// Custom 404 page.
pub const KEY_CUSTOM_404_FILE_PATH: &str = "custom_404_file_path";
/// Rewrite 404 to 200 for extensionless URLs.
pub const KEY_REWRITE_404_TO_200: &str = "rewrite_404_to_200";
/// Owning user.
pub const KEY_USER_ID: &str = "user_id";
/// Read/write password.
pub const KEY_PASSWORD: &str = "password";
/// Read-only password.
pub const KEY_READ_ONLY_PASSWORD: &str = "read_only_password";
/// Deletion flag.
pub const KEY_DELETED: &str = "deleted";
/// Bytes stored.
pub const KEY_STORAGE_USED: &str = "storage_used";
/// Number of files stored.
pub const KEY_FILES_STORED: &str = "files_stored";

/// Default custom 404 page served by Bunny.
pub const DEFAULT_CUSTOM_404_FILE_PATH: &str = "/bunnycdn_errors/404.html";

/// Builds the storage zone schema.
#[must_use]
pub fn storage_zone_schema() -> ResourceSchema {
    let regions = STORAGE_ZONE_REGIONS.join(", ");

    ResourceSchema::new(STORAGE_ZONE_TYPE)
        .with_description("A Bunny storage zone.")
        // Immutability of name, region, zone_tier and replication_regions
        // is enforced by the resource's customize-diff rules.
        .attribute(
            AttributeSchema::new(KEY_NAME, AttributeType::String)
                .required()
                .with_description("The name of the storage zone."),
        )
        .attribute(
            AttributeSchema::new(KEY_REGION, AttributeType::String)
                .with_default(DEFAULT_REGION)
                .one_of(STORAGE_ZONE_REGIONS)
                .with_description(format!(
                    "The code of the main storage zone region (Possible values: {regions})."
                )),
        )
        .attribute(
            AttributeSchema::new(
                KEY_REPLICATION_REGIONS,
                AttributeType::Set(Box::new(AttributeType::String)),
            )
            .one_of(STORAGE_ZONE_REGIONS)
            .with_description(format!(
                "The list of replication zones for the storage zone (Possible values: {regions}). \
                 Replication zones cannot be removed once the zone has been created."
            )),
        )
        .attribute(
            AttributeSchema::new(KEY_ZONE_TIER, AttributeType::Int)
                .required()
                .int_between(0, 1)
                .with_description("The zone tier of the storage, 0 for HDD and 1 for SSD."),
        )
        .attribute(
            AttributeSchema::new(KEY_ORIGIN_URL, AttributeType::String).with_description(
                "A URL to which a request is proxied, if a file does not exist in the the storage zone.",
            ),
        )
        .attribute(
            AttributeSchema::new(KEY_CUSTOM_404_FILE_PATH, AttributeType::String)
                .with_default(DEFAULT_CUSTOM_404_FILE_PATH)
                .with_description("The path to the custom file that will be returned in a case of 404."),
        )
        .attribute(
            AttributeSchema::new(KEY_REWRITE_404_TO_200, AttributeType::Bool)
                .with_default(false)
                .with_description("Rewrite 404 status code to 200 for URLs without extension."),
        )
        .attribute(AttributeSchema::new(KEY_USER_ID, AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(KEY_PASSWORD, AttributeType::String)
                .computed()
                .sensitive()
                .with_description("The password granting read/write access to the storage zone."),
        )
        .attribute(AttributeSchema::new(KEY_DELETED, AttributeType::Bool).computed())
        .attribute(
            AttributeSchema::new(KEY_STORAGE_USED, AttributeType::Int)
                .computed()
                .with_description("The amount of storage used in the storage zone in bytes."),
        )
        .attribute(
            AttributeSchema::new(KEY_FILES_STORED, AttributeType::Int)
                .computed()
                .with_description("The number of files stored in the storage zone."),
        )
        .attribute(
            AttributeSchema::new(KEY_READ_ONLY_PASSWORD, AttributeType::String)
                .computed()
                .sensitive()
                .with_description("The password granting read-only access to the storage zone."),
        )
}
