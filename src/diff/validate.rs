//! Immutable-field and region-constraint checks for storage zones.
//!
//! Each check is a pure predicate over values taken from a
//! [`ResourceDiff`](super::ResourceDiff). None of them touch the network.

use crate::catalog::{region_requires_replication, regions_except};
use crate::error::DiffError;
use crate::schema::Value;
use crate::schema::storage_zone::KEY_REPLICATION_REGIONS;

/// Rejects any change of a scalar once it holds a non-empty value.
///
/// An empty or absent old value means the attribute was never assigned,
/// so the first write always passes. Integers compare by value and are
/// rendered in decimal in the rejection.
///
/// # Errors
///
/// Returns [`DiffError::ImmutableFieldChanged`] if the value changed or was
/// removed.
pub fn validate_immutable_string(
    key: &str,
    old: Option<&Value>,
    new: Option<&Value>,
) -> Result<(), DiffError> {
    let Some(old) = old.filter(|v| !v.is_empty()) else {
        return Ok(());
    };

    let rejected = |new: String| DiffError::ImmutableFieldChanged {
        key: key.to_string(),
        old: old.to_string(),
        new,
    };

    match new {
        Some(new) if new.is_scalar() && new.type_name() == old.type_name() => {
            if new == old {
                Ok(())
            } else {
                Err(rejected(new.to_string()))
            }
        }
        _ => Err(rejected(String::new())),
    }
}

/// Rejects removal of previously configured replication regions.
///
/// Adding regions is always allowed. Membership is case-insensitive; the
/// rejection lists the removed regions exactly as they were applied.
///
/// # Errors
///
/// Returns [`DiffError::ReplicationRegionRemoved`] listing the removed
/// regions.
pub fn validate_replication_regions_not_removed(
    old: Option<&Value>,
    new: Option<&Value>,
) -> Result<(), DiffError> {
    let old_regions = old.map(Value::string_items).unwrap_or_default();
    if old_regions.is_empty() {
        return Ok(());
    }

    let new_regions = new.map(Value::string_items).unwrap_or_default();
    let removed: Vec<String> = old_regions
        .into_iter()
        .filter(|region| !contains_region(&new_regions, region))
        .map(String::from)
        .collect();

    if removed.is_empty() {
        Ok(())
    } else {
        Err(DiffError::ReplicationRegionRemoved {
            key: KEY_REPLICATION_REGIONS.to_string(),
            removed,
        })
    }
}

/// Rejects a primary region that must be replicated when no replication
/// region is configured.
///
/// # Errors
///
/// Returns [`DiffError::ReplicationRequiredButEmpty`] suggesting every
/// other region of the catalog.
pub fn validate_replication_required_for_region(
    region: &str,
    replication_regions: Option<&Value>,
) -> Result<(), DiffError> {
    let has_replication = replication_regions.is_some_and(|v| !v.is_empty());

    if !has_replication && region_requires_replication(region) {
        return Err(DiffError::ReplicationRequiredButEmpty {
            region: region.to_string(),
            available: regions_except(region),
        });
    }

    Ok(())
}

/// Rejects a primary region that is also listed for replication.
///
/// # Errors
///
/// Returns [`DiffError::SelfReplicatingRegion`].
pub fn validate_region_not_self_replicating(
    region: &str,
    replication_regions: Option<&Value>,
) -> Result<(), DiffError> {
    let regions = replication_regions.map(Value::string_items).unwrap_or_default();

    if contains_region(&regions, region) {
        return Err(DiffError::SelfReplicatingRegion {
            region: region.to_string(),
        });
    }

    Ok(())
}

fn contains_region(regions: &[&str], region: &str) -> bool {
    regions.iter().any(|r| r.eq_ignore_ascii_case(region))
}
