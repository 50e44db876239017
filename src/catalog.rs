//! Fixed lookup tables shared by schemas, validators and API mapping.
//!
//! Everything here is process-wide constant data: the storage-zone region
//! catalog and the edge-rule enumerations, each exposed as a name → code
//! table with its reverse mapping and a sorted key list.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Every region a storage zone can be placed in, in catalog order.
pub const STORAGE_ZONE_REGIONS: &[&str] = &["AZ", "BR", "DE", "LA", "NY", "SE", "SG", "SYD", "UK"];

/// Primary regions that cannot be used without at least one replication region.
pub const REGIONS_REQUIRING_REPLICATION: &[&str] = &["AZ", "BR", "SG", "SYD"];

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "DE";

/// Returns true if `region` is a known storage-zone region.
#[must_use]
pub fn is_known_region(region: &str) -> bool {
    STORAGE_ZONE_REGIONS.contains(&region)
}

/// Returns true if a zone in `region` must be replicated elsewhere.
#[must_use]
pub fn region_requires_replication(region: &str) -> bool {
    REGIONS_REQUIRING_REPLICATION.contains(&region)
}

/// Returns the catalog without `region`, preserving catalog order.
#[must_use]
pub fn regions_except(region: &str) -> Vec<String> {
    STORAGE_ZONE_REGIONS
        .iter()
        .filter(|r| **r != region)
        .map(|r| (*r).to_string())
        .collect()
}

/// A bidirectional name ↔ API code table.
#[derive(Debug)]
pub struct CodeTable {
    by_name: BTreeMap<&'static str, i64>,
    by_code: HashMap<i64, &'static str>,
}

impl CodeTable {
    fn new(entries: &[(&'static str, i64)]) -> Self {
        Self {
            by_name: entries.iter().copied().collect(),
            by_code: entries.iter().map(|(name, code)| (*code, *name)).collect(),
        }
    }

    /// Looks up the API code for a name.
    #[must_use]
    pub fn code(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    /// Looks up the name for an API code.
    #[must_use]
    pub fn name(&self, code: i64) -> Option<&'static str> {
        self.by_code.get(&code).copied()
    }

    /// Returns every name, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        self.by_name.keys().copied().collect()
    }
}

/// Edge-rule trigger types.
pub static EDGE_RULE_TRIGGER_TYPES: LazyLock<CodeTable> = LazyLock::new(|| {
    CodeTable::new(&[
        ("url", 0),
        ("request_header", 1),
        ("response_header", 2),
        ("url_extensions", 3),
        ("country_code", 4),
        ("remote_ip", 5),
        ("query_string", 6),
        ("random_chance", 7),
        ("status_code", 8),
        ("request_method", 9),
    ])
});

/// Edge-rule pattern matching types, used for triggers and rules alike.
pub static EDGE_RULE_MATCHING_TYPES: LazyLock<CodeTable> =
    LazyLock::new(|| CodeTable::new(&[("any", 0), ("all", 1), ("none", 2)]));

/// Edge-rule action types.
pub static EDGE_RULE_ACTION_TYPES: LazyLock<CodeTable> = LazyLock::new(|| {
    CodeTable::new(&[
        ("force_ssl", 0),
        ("redirect", 1),
        ("origin_url", 2),
        ("override_cache_time", 3),
        ("block_request", 4),
        ("set_response_header", 5),
        ("set_request_header", 6),
        ("force_download", 7),
        ("disable_token_authentication", 8),
        ("enable_token_authentication", 9),
        ("override_cache_time_public", 10),
        ("ignore_query_string", 11),
        ("disable_optimizer", 12),
        ("force_compression", 13),
        ("set_status_code", 14),
        ("bypass_perma_cache", 15),
    ])
});
