//! Bunny API integration module.
//!
//! This module provides the HTTP client and wire types for the storage zone,
//! pull zone and edge rule endpoints of the Bunny REST API.

mod client;
mod types;

pub use client::BunnyClient;
pub use types::{
    EdgeRule, EdgeRuleTrigger, PullZone, StorageZone, StorageZoneAddOptions,
    StorageZoneUpdateOptions,
};
