//! Loader for resource configuration and state documents.
//!
//! Documents are JSON or YAML, chosen by file extension. Provider settings
//! come from the environment, optionally seeded from a `.env` file.

use crate::error::{ConfigError, ProviderError, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::resource::ResourceData;
use crate::schema::Snapshot;

/// Document formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from a file extension; anything but `.yaml`/`.yml`
    /// is read as JSON.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Parser for configuration and state documents.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Loads a resource configuration: attribute name → value.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<Snapshot> {
        self.load(path.as_ref())
    }

    /// Loads previously applied resource data.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_resource_data(&self, path: impl AsRef<Path>) -> Result<ResourceData> {
        self.load(path.as_ref())
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let path = self.resolve(path);
        info!("Loading document from: {}", path.display());

        if !path.exists() {
            return Err(ProviderError::Config(ConfigError::FileNotFound { path }));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: path.display().to_string(),
            })
        })?;

        Self::parse_str(&content, DocumentFormat::from_path(&path), &path.display().to_string())
    }

    /// Parses a document from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid for the format.
    pub fn parse_str<T: DeserializeOwned>(
        content: &str,
        format: DocumentFormat,
        location: &str,
    ) -> Result<T> {
        debug!("Parsing {format:?} document");

        let parsed = match format {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| {
            ProviderError::Config(ConfigError::ParseError {
                message,
                location: location.to_string(),
            })
        })
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ProviderError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: env_path.display().to_string(),
                })
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Value;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("zone.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("zone.YAML")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("zone.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("zone")), DocumentFormat::Json);
    }

    #[test]
    fn test_yaml_and_json_agree() {
        let from_yaml: Snapshot = ConfigParser::parse_str(
            "name: assets\nzone_tier: 1\nreplication_regions:\n  - NY\n",
            DocumentFormat::Yaml,
            "inline",
        )
        .expect("valid yaml");
        let from_json: Snapshot = ConfigParser::parse_str(
            r#"{"name": "assets", "zone_tier": 1, "replication_regions": ["NY"]}"#,
            DocumentFormat::Json,
            "inline",
        )
        .expect("valid json");

        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml["zone_tier"], Value::Int(1));
    }

    #[test]
    fn test_load_relative_to_base() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            dir.path().join("state.json"),
            r#"{"id": "12", "attributes": {"name": "assets"}}"#,
        )
        .expect("write state");

        let data = ConfigParser::new()
            .with_base_path(dir.path())
            .load_resource_data("state.json")
            .expect("state loads");

        assert_eq!(data.id.as_deref(), Some("12"));
        assert_eq!(data.attributes["name"], Value::string("assets"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let err = ConfigParser::new()
            .with_base_path(dir.path())
            .load_snapshot("nope.json")
            .expect_err("missing file");

        assert!(matches!(err, ProviderError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_error_names_location() {
        let err =
            ConfigParser::parse_str::<Snapshot>("{not json", DocumentFormat::Json, "zone.json")
                .expect_err("invalid json");

        assert!(err.to_string().contains("zone.json"));
    }
}
