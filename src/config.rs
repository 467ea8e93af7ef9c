//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::models::Field;
use crate::amazon::regions::Region;
use crate::error::ConfigError;
use crate::tracker::{FieldPolicy, DEFAULT_CONCURRENCY};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon marketplace to fetch from
    #[serde(default)]
    pub region: Region,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay before each product fetch in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Identifiers processed at once within a batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Output format for CLI commands
    #[serde(default)]
    pub format: OutputFormat,

    /// Path of the SQLite observation store
    #[serde(default)]
    pub store: Option<String>,

    /// Address the HTTP service binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Fields whose absence fails an identifier instead of storing "N/A"
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<Field>,
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_required_fields() -> Vec<Field> {
    vec![Field::Title]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::default(),
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            concurrency: default_concurrency(),
            format: OutputFormat::Table,
            store: None,
            bind: default_bind(),
            required_fields: default_required_fields(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("asin-tracker").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(region) = std::env::var("ASIN_TRACKER_REGION") {
            if let Ok(r) = region.parse() {
                self.region = r;
            }
        }

        if let Ok(proxy) = std::env::var("ASIN_TRACKER_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("ASIN_TRACKER_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(store) = std::env::var("ASIN_TRACKER_DB") {
            if !store.trim().is_empty() {
                self.store = Some(store);
            }
        }

        if let Ok(concurrency) = std::env::var("ASIN_TRACKER_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.concurrency = c;
            }
        }

        self
    }

    /// Returns the store target, or the fatal startup error if none is set.
    pub fn store_target(&self) -> Result<&str, ConfigError> {
        self.store
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingStoreTarget)
    }

    /// Required-field policy built from `required_fields`.
    pub fn field_policy(&self) -> FieldPolicy {
        FieldPolicy::new(self.required_fields.iter().copied())
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.region, Region::In);
        assert_eq!(config.delay_ms, 1000);
        assert_eq!(config.delay_jitter_ms, 1000);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.bind, "127.0.0.1:8000");
        assert_eq!(config.required_fields, vec![Field::Title]);
        assert!(config.proxy.is_none());
        assert!(config.store.is_none());
    }

    #[test]
    fn test_missing_store_is_config_error() {
        let config = Config::default();
        assert!(matches!(config.store_target(), Err(ConfigError::MissingStoreTarget)));

        let config = Config { store: Some("   ".to_string()), ..Config::default() };
        assert!(config.store_target().is_err());

        let config = Config { store: Some("tracker.db".to_string()), ..Config::default() };
        assert_eq!(config.store_target().unwrap(), "tracker.db");
    }

    #[test]
    fn test_field_policy_from_config() {
        let config = Config {
            required_fields: vec![Field::Title, Field::Price],
            ..Config::default()
        };
        assert_eq!(config.field_policy().required(), &[Field::Title, Field::Price]);

        let config = Config { required_fields: Vec::new(), ..Config::default() };
        assert_eq!(config.field_policy(), FieldPolicy::tolerant());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            region = "us"
            store = "/var/lib/asin-tracker/observations.db"
            concurrency = 8
            required_fields = ["title", "price"]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.region, Region::Us);
        assert_eq!(config.store.as_deref(), Some("/var/lib/asin-tracker/observations.db"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.required_fields, vec![Field::Title, Field::Price]);
        assert_eq!(config.delay_ms, 1000);
    }

    #[test]
    fn test_config_from_toml_empty_required_fields() {
        let config: Config = toml::from_str("required_fields = []").unwrap();
        assert!(config.required_fields.is_empty());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            region = "uk"
            delay_ms = 4000
            bind = "0.0.0.0:9000"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.region, Region::Uk);
        assert_eq!(config.delay_ms, 4000);
        assert_eq!(config.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_config_from_file_not_found() {
        let err = Config::from_file("/nonexistent/path/config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_from_file_unknown_field_name() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"required_fields = ["brand"]"#).unwrap();

        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"region = "jp""#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.region, Region::Jp);
    }

    #[test]
    fn test_config_with_env() {
        let vars = [
            ("ASIN_TRACKER_REGION", "de"),
            ("ASIN_TRACKER_PROXY", "http://proxy:8080"),
            ("ASIN_TRACKER_DELAY", "5000"),
            ("ASIN_TRACKER_DB", "/tmp/observations.db"),
            ("ASIN_TRACKER_CONCURRENCY", "2"),
        ];
        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, std::env::var(k).ok())).collect();

        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let config = Config::new().with_env();
        assert_eq!(config.region, Region::De);
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:8080"));
        assert_eq!(config.delay_ms, 5000);
        assert_eq!(config.store_target().unwrap(), "/tmp/observations.db");
        assert_eq!(config.concurrency, 2);

        for (key, original) in originals {
            match original {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}
