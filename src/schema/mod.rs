//! Resource schemas.
//!
//! This module defines the typed attribute model shared by all resources:
//! - Attribute values and snapshots
//! - Attribute and resource schemas with defaults and constraints
//! - The concrete schemas of the storage zone and edge rule resources

mod attribute;
mod value;
pub mod edge_rule;
pub mod storage_zone;

pub use attribute::{AttributeSchema, AttributeType, Constraint, NormalizeMode, ResourceSchema};
pub use edge_rule::{EDGE_RULE_TYPE, edge_rule_schema};
pub use storage_zone::{STORAGE_ZONE_TYPE, storage_zone_schema};
pub use value::{Snapshot, Value};
