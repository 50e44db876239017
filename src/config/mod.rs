//! Configuration module for the Bunny provider.
//!
//! This module handles all configuration-related functionality:
//! - Provider settings from the environment and `.env` files
//! - Loading resource configuration and state documents (JSON or YAML)

mod parser;
mod provider;

pub use parser::{ConfigParser, DocumentFormat};
pub use provider::{
    DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_API_URL, ENV_TIMEOUT_SECS,
    ProviderConfig,
};
