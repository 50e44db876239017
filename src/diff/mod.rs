//! Diff customization for proposed resource changes.
//!
//! This module contains:
//! - The old/new accessor for one proposed change
//! - Rule sets evaluated before any API call
//! - The immutable-field and region-constraint checks of storage zones

mod customize;
mod resource_diff;
mod validate;

pub use customize::{CustomizeDiff, DiffRule};
pub use resource_diff::ResourceDiff;
pub use validate::{
    validate_immutable_string, validate_region_not_self_replicating,
    validate_replication_regions_not_removed, validate_replication_required_for_region,
};
