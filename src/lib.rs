// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are reported
#![warn(unused_variables)]            // Unused variables are reported
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Bunny Storage Provider
//!
//! Declarative management of Bunny CDN storage zones and pull zone edge rules.
//!
//! ## Overview
//!
//! Every change to a resource goes through the same pipeline:
//!
//! 1. **Schema**: the configuration is normalised (defaults, types, allowed values)
//! 2. **Diff rules**: the normalised configuration is checked against the last
//!    applied state; rejected changes never reach the API
//! 3. **Lifecycle**: create, read, update or delete through the Bunny REST API
//!
//! Storage zones carry the strictest rules: `name`, `region` and `zone_tier`
//! cannot change once set, replication regions can be added but never
//! removed, some primary regions need at least one replication region, and
//! the primary region cannot also be a replication region.
//!
//! ## Modules
//!
//! - [`schema`]: Attribute model and resource schemas
//! - [`diff`]: Old/new accessor, diff rules and the storage zone checks
//! - [`catalog`]: Region catalog and edge rule code tables
//! - [`bunny`]: Bunny API client and wire types
//! - [`resource`]: Storage zone and edge rule resources
//! - [`plan`]: Change planning
//! - [`provider`]: Resource registry and lifecycle driver
//! - [`config`]: Provider settings and document loading
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! name: assets
//! region: DE
//! zone_tier: 0
//! replication_regions:
//!   - NY
//!   - SYD
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod bunny;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;

// ============================================================================
// Re-exports
// ============================================================================

pub use bunny::BunnyClient;
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ProviderConfig};
pub use diff::{CustomizeDiff, DiffRule, ResourceDiff};
pub use error::{ProviderError, Result};
pub use plan::{ChangePlan, PlanAction};
pub use provider::Provider;
pub use resource::{EdgeRuleResource, Resource, ResourceData, StorageZoneResource};
pub use schema::{ResourceSchema, Snapshot, Value};
