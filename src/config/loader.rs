//! Layered configuration loading.
//!
//! Layers, lowest precedence first:
//! 1. schema defaults
//! 2. the TOML file given with `--config`
//! 3. `MESH_*` environment variables (`MESH_LOGGING__LEVEL` → `logging.level`)
//! 4. `--set key.path=value` flags
//!
//! Env and flag values are raw text. A key the schema declares as a string
//! keeps that text; other schema keys and free-form `services.*` keys read
//! it as a TOML literal, falling back to a string.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::HostConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix of environment variables treated as configuration overrides.
pub const ENV_PREFIX: &str = "MESH_";

/// Separator between nesting levels in an environment variable name.
pub const ENV_SEPARATOR: &str = "__";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid override `{key}`: {reason}")]
    Override { key: String, reason: String },

    #[error("invalid configuration: {0}")]
    Schema(#[source] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder that merges every configuration layer into a [`HostConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this TOML file as the lowest explicit layer.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Take overrides from environment variables; only `MESH_*` names count.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.extend(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(k, _)| k.starts_with(ENV_PREFIX)),
        );
        // Process environment order is unspecified.
        self.env.sort();
        self
    }

    /// Add flag overrides (`key.path`, raw value).
    pub fn with_overrides<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.overrides.extend(overrides);
        self
    }

    /// Merge all layers, deserialize and validate.
    pub fn load(&self) -> Result<HostConfig, ConfigError> {
        let mut root = match &self.file {
            Some(path) => {
                let table = read_file(path)?;
                tracing::info!(path = %path.display(), "Configuration file loaded");
                table
            }
            None => {
                tracing::info!("No configuration file given, using defaults");
                toml::Table::new()
            }
        };

        let template = schema_template();

        for (name, raw) in &self.env {
            match env_key(name) {
                Some(key) => set_path(&mut root, &key, coerce(&template, &key, raw))?,
                None => tracing::warn!(variable = %name, "Ignoring malformed configuration variable"),
            }
        }

        for (key, raw) in &self.overrides {
            set_path(&mut root, key, coerce(&template, key, raw))?;
        }

        let config: HostConfig = toml::Value::Table(root)
            .try_into()
            .map_err(ConfigError::Schema)?;

        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}

/// Load and validate configuration from a single TOML file.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}

fn read_file(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Syntax {
        path: path.to_path_buf(),
        source,
    })
}

/// Map `MESH_AGENT__NODE_ID` to `agent.node_id`.
fn env_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    let segments: Vec<String> = rest
        .split(ENV_SEPARATOR)
        .map(str::to_ascii_lowercase)
        .collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments.join("."))
}

/// Every schema key with its default, optional keys filled in, so an
/// override can look up the type it targets.
fn schema_template() -> toml::Table {
    let mut config = HostConfig::default();
    config.agent.node_id = Some(String::new());
    match toml::Value::try_from(&config) {
        Ok(toml::Value::Table(table)) => table,
        _ => toml::Table::new(),
    }
}

fn template_leaf<'a>(template: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    let mut segments = key.split('.');
    let mut current = template.get(segments.next()?)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

/// Turn a raw override into the value type its key expects.
fn coerce(template: &toml::Table, key: &str, raw: &str) -> toml::Value {
    match template_leaf(template, key) {
        // A quoted literal still unquotes, so `"abc"` and `abc` agree.
        Some(toml::Value::String(_)) => match parse_value(raw) {
            toml::Value::String(text) => toml::Value::String(text),
            _ => toml::Value::String(raw.to_string()),
        },
        _ => parse_value(raw),
    }
}

/// Interpret a raw override as a TOML literal, falling back to a string.
fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn set_path(root: &mut toml::Table, key: &str, value: toml::Value) -> Result<(), ConfigError> {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(override_error(key, "empty key"));
    };
    if segments.iter().any(|s| s.is_empty()) {
        return Err(override_error(key, "empty key segment"));
    }

    let mut table = root;
    for segment in parents {
        let entry = table
            .entry(segment.to_string())
            .or_insert(toml::Value::Table(toml::Table::new()));
        table = match entry {
            toml::Value::Table(inner) => inner,
            _ => return Err(override_error(key, &format!("`{segment}` is not a table"))),
        };
    }
    table.insert(last.to_string(), value);
    Ok(())
}

fn override_error(key: &str, reason: &str) -> ConfigError {
    ConfigError::Override {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
