//! Error types for the Bunny storage provider.
//!
//! This module provides the error hierarchy for every stage of a resource
//! lifecycle: configuration, schema normalisation, diff validation,
//! Bunny API calls and the CRUD operations built on top of them.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Schema normalisation errors.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaErrors),

    /// Proposed change rejected during diff customization.
    #[error("{0}")]
    Diff(#[from] DiffErrors),

    /// Bunny API errors.
    #[error("Bunny API error: {0}")]
    Api(#[from] ApiError),

    /// Resource lifecycle errors.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A file could not be parsed.
    #[error("Failed to parse {location}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Source of the content.
        location: String,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid value for {name}: {message}")]
    InvalidValue {
        /// Name of the setting.
        name: String,
        /// Why the value is invalid.
        message: String,
    },
}

/// A single schema violation found while normalising resource input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The attribute is not part of the schema.
    #[error("Unknown attribute '{name}'")]
    UnknownAttribute {
        /// Attribute name.
        name: String,
    },

    /// The value has the wrong type.
    #[error("'{name}': expected {expected}, got {got}")]
    TypeMismatch {
        /// Attribute path.
        name: String,
        /// Expected type name.
        expected: String,
        /// Actual type name.
        got: String,
    },

    /// A required attribute has no value and no default.
    #[error("Required attribute '{name}' is missing")]
    MissingRequired {
        /// Attribute path.
        name: String,
    },

    /// The value is not in the allowed set.
    #[error("'{name}': expected one of [{}], got '{value}'", allowed.join(", "))]
    ValueNotAllowed {
        /// Attribute path.
        name: String,
        /// Offending value.
        value: String,
        /// Allowed values.
        allowed: Vec<String>,
    },

    /// The integer is outside the allowed range.
    #[error("'{name}': expected a value between {min} and {max}, got {value}")]
    OutOfRange {
        /// Attribute path.
        name: String,
        /// Offending value.
        value: i64,
        /// Lower bound (inclusive).
        min: i64,
        /// Upper bound (inclusive).
        max: i64,
    },

    /// The attribute is computed by the provider and cannot be configured.
    #[error("'{name}' is computed and cannot be set")]
    ComputedAttributeSet {
        /// Attribute name.
        name: String,
    },
}

/// All schema violations found for one input document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SchemaErrors(pub Vec<SchemaError>);

/// A proposed change rejected during diff customization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// An immutable scalar changed after it was first assigned.
    #[error(
        "'{key}' is immutable and cannot be changed from '{old}' to '{new}'.\n\
         To change the existing '{key}' the 'bunny_storagezone' must be deleted and recreated.\n\
         WARNING: deleting a 'bunny_storagezone' will also delete all the data it contains"
    )]
    ImmutableFieldChanged {
        /// Field name.
        key: String,
        /// Previously applied value.
        old: String,
        /// Proposed value (empty when absent).
        new: String,
    },

    /// One or more replication regions were removed.
    #[error(
        "'{key}' can be added but not removed once the zone has been created.\n\
         This error occurred when attempting to remove values {} from '{key}'.\n\
         To remove an existing '{key}' the 'bunny_storagezone' must be deleted and recreated.\n\
         WARNING: deleting a 'bunny_storagezone' will also delete all the data it contains",
        quoted_list(removed)
    )]
    ReplicationRegionRemoved {
        /// Field name.
        key: String,
        /// Removed values, verbatim.
        removed: Vec<String>,
    },

    /// The primary region requires replication but none was configured.
    #[error(
        "{region:?} region needs to have at least one replication region.\n\
         Please add one of the available replication regions: {}",
        available.join(", ")
    )]
    ReplicationRequiredButEmpty {
        /// Primary region.
        region: String,
        /// Regions that could be used for replication.
        available: Vec<String>,
    },

    /// The primary region is also listed as a replication region.
    #[error(
        "{region:?} was specified as primary and replication region. \
         The same region can not be both. Please specify different regions"
    )]
    SelfReplicatingRegion {
        /// Primary region.
        region: String,
    },
}

/// Every rejection produced by one diff-customization pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct DiffErrors(pub Vec<DiffError>);

/// Bunny API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed.
    #[error("Bunny authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// The requested object does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of object (storage zone, pull zone, edge rule).
        kind: String,
        /// Identifier that was requested.
        id: String,
    },

    /// API request failed.
    #[error("Bunny API request failed: {status} - {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
    },

    /// Rate limited.
    #[error("Bunny API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("Network error communicating with Bunny: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response from Bunny API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Resource lifecycle errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource has no id yet.
    #[error("{resource_type} has no id")]
    MissingId {
        /// Resource type name.
        resource_type: String,
    },

    /// The stored id cannot be interpreted.
    #[error("Invalid id '{id}' for {resource_type}: {message}")]
    InvalidId {
        /// Resource type name.
        resource_type: String,
        /// The stored id.
        id: String,
        /// Parse failure.
        message: String,
    },

    /// No resource is registered under the requested type name.
    #[error("Unknown resource type '{name}'")]
    UnknownType {
        /// Requested type name.
        name: String,
    },

    /// The object was created but a follow-up step failed.
    #[error("{resource_type} {id} was created but {step} failed: {reason}")]
    PartiallyCreated {
        /// Resource type name.
        resource_type: String,
        /// Id of the created object.
        id: String,
        /// Step that failed.
        step: String,
        /// Underlying failure.
        reason: String,
    },

    /// An attribute required by a lifecycle operation holds no usable value.
    #[error("Attribute '{name}' is missing or invalid: {message}")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Renders values the way the Bunny provider has always listed them:
/// `["A" "B"]`.
fn quoted_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
    format!("[{}]", quoted.join(" "))
}

impl ProviderError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if the error means the remote object no longer exists.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound { .. }))
    }
}

impl ApiError {
    /// Creates a request error.
    #[must_use]
    pub fn request(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns true if the request may succeed when repeated.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::NetworkError { .. })
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            Self::NetworkError { .. } => Some(1),
            _ => None,
        }
    }
}

impl ResourceError {
    /// Creates an invalid-attribute error.
    #[must_use]
    pub fn attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl DiffErrors {
    /// Returns true if no rejection was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of rejections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the rejections in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, DiffError> {
        self.0.iter()
    }
}

impl fmt::Display for DiffErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<DiffError> for ProviderError {
    fn from(error: DiffError) -> Self {
        Self::Diff(DiffErrors(vec![error]))
    }
}
