//! Shared configuration for gridline tools.
//!
//! TOML profiles (where a backend lives and how to authenticate) and
//! collection definitions (endpoint, columns, import mapping, export
//! layout), merged with `GRIDLINE_` environment variables through figment,
//! and translated into `gridline_core` runtime configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use gridline_core::config::{
    DEFAULT_DEBOUNCE, DEFAULT_IMPORT_CONCURRENCY, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZES,
};
use gridline_core::{
    BackendConfig, CollectionConfig, ColumnConfig, EngineConfig, ExportLayout, FieldMapping,
    ImportMapping, PageLimits, TlsVerification,
};

const KEYRING_SERVICE: &str = "gridline";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("collection '{name}' not found (available: {available})")]
    UnknownCollection { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Named collections (one per table/entity).
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionSection>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_page_sizes")]
    pub page_sizes: Vec<u32>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Simultaneous create requests during an import.
    #[serde(default = "default_import_concurrency")]
    pub import_concurrency: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            page_size: default_page_size(),
            page_sizes: default_page_sizes(),
            debounce_ms: default_debounce_ms(),
            import_concurrency: default_import_concurrency(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_page_sizes() -> Vec<u32> {
    DEFAULT_PAGE_SIZES.to_vec()
}
fn default_debounce_ms() -> u64 {
    u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(500)
}
fn default_import_concurrency() -> usize {
    DEFAULT_IMPORT_CONCURRENCY
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g. "https://api.example.com/v1").
    pub base_url: String,

    /// Bearer token (plaintext, prefer `token_env` or the keyring).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override `defaults.timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// One collection as written under `[collections.<name>]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CollectionSection {
    /// Endpoint path relative to the profile's base URL.
    pub path: String,

    /// Key of the item array inside the list envelope's `data` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_key: Option<String>,

    /// Plural display name ("sub menus").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Declared row fields; columns may only read these when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnConfig>,

    /// Export column order; inferred from the rows when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import: Vec<FieldMapping>,

    /// Fields added to every imported record.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub import_constants: Map<String, Value>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "gridline", "gridline").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("gridline");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Environment overrides use `__` as the nesting separator, e.g.
/// `GRIDLINE_DEFAULTS__PAGE_SIZE=25`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GRIDLINE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Lookups ─────────────────────────────────────────────────────────

impl Config {
    /// Resolve a profile by explicit name, then `default_profile`, then "default".
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.into(),
                available: list_keys(self.profiles.keys()),
            })
    }

    pub fn collection(&self, name: &str) -> Result<&CollectionSection, ConfigError> {
        self.collections
            .get(name)
            .ok_or_else(|| ConfigError::UnknownCollection {
                name: name.into(),
                available: list_keys(self.collections.keys()),
            })
    }

    /// A starter config written by `gridline config init`.
    pub fn example() -> Self {
        let mut config = Self::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                base_url: "https://api.example.com/v1".into(),
                token_env: Some("GRIDLINE_TOKEN".into()),
                ..Profile::default()
            },
        );
        config.collections.insert(
            "products".into(),
            CollectionSection {
                path: "master-data/other-products".into(),
                columns: vec![
                    ColumnConfig {
                        uid: "product_name".into(),
                        label: Some("NAME".into()),
                        ..ColumnConfig::default()
                    },
                    ColumnConfig {
                        uid: "product_code".into(),
                        label: Some("CODE".into()),
                        column_type: gridline_core::ColumnType::Chip,
                        ..ColumnConfig::default()
                    },
                ],
                import: vec![
                    FieldMapping::new("product_name").required(),
                    FieldMapping::new("product_code").required(),
                ],
                import_constants: [("status".to_owned(), Value::from(1))].into_iter().collect(),
                ..CollectionSection::default()
            },
        );
        config
    }
}

fn list_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    let keys: Vec<&str> = keys.map(String::as_str).collect();
    if keys.is_empty() {
        "none".into()
    } else {
        keys.join(", ")
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's bearer token.
///
/// Order: `token_env`, then the plaintext `token`. The system keyring
/// (`gridline` / `<profile>/token`) is consulted only when neither is set.
/// A backend without authentication is valid, so no token is `None`.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<Option<SecretString>, ConfigError> {
    if let Some(ref env_name) = profile.token_env {
        return match std::env::var(env_name) {
            Ok(val) if !val.trim().is_empty() => Ok(Some(SecretString::from(val))),
            _ => Err(ConfigError::Validation {
                field: "token_env".into(),
                reason: format!("environment variable {env_name} is not set"),
            }),
        };
    }

    if let Some(ref token) = profile.token {
        return Ok(Some(SecretString::from(token.clone())));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(Some(SecretString::from(secret)));
        }
    }

    Ok(None)
}

// ── Translation to core config ──────────────────────────────────────

impl Defaults {
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let page_limits = PageLimits::new(self.page_sizes.clone(), self.page_size).map_err(|e| {
            ConfigError::Validation {
                field: "defaults.page_size".into(),
                reason: e.to_string(),
            }
        })?;
        if self.import_concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "defaults.import_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(EngineConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            page_limits,
            import_concurrency: self.import_concurrency,
        })
    }
}

/// Build a `BackendConfig` from a profile. `token` is resolved separately
/// so callers can layer a CLI flag on top.
pub fn profile_to_backend_config(
    profile: &Profile,
    defaults: &Defaults,
    token: Option<SecretString>,
) -> Result<BackendConfig, ConfigError> {
    let base_url: url::Url = profile
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", profile.base_url),
        })?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(BackendConfig {
        base_url,
        token,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        tls,
    })
}

impl CollectionSection {
    /// Translate into core's `CollectionConfig`, validating the column set.
    pub fn to_collection_config(&self, name: &str) -> Result<CollectionConfig, ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("collections.{name}.path"),
                reason: "must not be empty".into(),
            });
        }

        let mut config = CollectionConfig::new(name, self.path.trim());
        if let Some(ref label) = self.label {
            config.label.clone_from(label);
        }
        if let Some(ref items_key) = self.items_key {
            config.items_key.clone_from(items_key);
        }
        config.fields.clone_from(&self.fields);
        config.columns.clone_from(&self.columns);
        config.import = ImportMapping {
            fields: self.import.clone(),
            constants: self.import_constants.clone(),
        };
        if !self.export_fields.is_empty() {
            config.export = ExportLayout::Fields(self.export_fields.clone());
        }

        if !config.columns.is_empty() {
            config.table_spec().map_err(|e| ConfigError::Validation {
                field: format!("collections.{name}.columns"),
                reason: e.to_string(),
            })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "staging"

[defaults]
page_size = 25
page_sizes = [10, 25, 50]

[profiles.staging]
base_url = "https://staging.example.com/api/"
token = "s3cret"
timeout = 5

[collections.sub-menus]
path = "menus/sub-menus"
items_key = "subMenus"
label = "sub menus"
export_fields = ["id", "nameEn"]

[[collections.sub-menus.columns]]
uid = "name"
type = "stacked"
field = "nameEn"
secondary = "headingEn"

[[collections.sub-menus.columns]]
uid = "actions"
type = "actions"

[[collections.sub-menus.import]]
column = "Name"
field = "nameEn"
required = true

[collections.sub-menus.import_constants]
status = 1
"#;

    fn write_sample(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults.page_size, 10);
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn sample_translates_to_core_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir, SAMPLE)).unwrap();

        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "staging");
        let token = resolve_token(profile, name).unwrap().unwrap();
        assert_eq!(token.expose_secret(), "s3cret");

        let backend = profile_to_backend_config(profile, &config.defaults, Some(token)).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(5));
        assert_eq!(backend.tls, TlsVerification::SystemDefaults);

        let engine = config.defaults.engine_config().unwrap();
        assert_eq!(engine.page_limits.default_limit(), 25);
        assert_eq!(engine.page_limits.allowed(), &[10, 25, 50]);

        let collection = config
            .collection("sub-menus")
            .unwrap()
            .to_collection_config("sub-menus")
            .unwrap();
        assert_eq!(collection.items_key, "subMenus");
        assert_eq!(collection.label, "sub menus");
        assert_eq!(collection.columns.len(), 2);
        assert_eq!(collection.import.fields[0].field_name(), "nameEn");
        assert_eq!(collection.import.constants["status"], Value::from(1));
        assert_eq!(
            collection.export,
            ExportLayout::Fields(vec!["id".into(), "nameEn".into()])
        );
    }

    #[test]
    fn unknown_names_list_what_exists() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&write_sample(&dir, SAMPLE)).unwrap();

        let err = config.profile(Some("prod")).unwrap_err();
        assert_eq!(err.to_string(), "profile 'prod' not found (available: staging)");
        let err = config.collection("pages").unwrap_err();
        assert!(err.to_string().contains("available: sub-menus"));
    }

    #[test]
    fn page_size_outside_choices_is_rejected() {
        let defaults = Defaults {
            page_size: 7,
            ..Defaults::default()
        };
        let err = defaults.engine_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "defaults.page_size"));
    }

    #[test]
    fn invalid_column_is_reported_with_its_collection() {
        let section = CollectionSection {
            path: "pages".into(),
            columns: vec![ColumnConfig {
                uid: "link".into(),
                column_type: gridline_core::ColumnType::Link,
                ..ColumnConfig::default()
            }],
            ..CollectionSection::default()
        };
        let err = section.to_collection_config("pages").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "collections.pages.columns"));
    }

    #[test]
    fn bad_base_url_is_a_validation_error() {
        let profile = Profile {
            base_url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_backend_config(&profile, &Defaults::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "base_url"));
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            base_url: "https://localhost:8443".into(),
            ca_cert: Some("/etc/ca.pem".into()),
            insecure: Some(true),
            ..Profile::default()
        };
        let backend = profile_to_backend_config(&profile, &Defaults::default(), None).unwrap();
        assert_eq!(backend.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(backend.timeout, Duration::from_secs(30));
    }

    #[test]
    fn unset_token_env_is_an_error() {
        let profile = Profile {
            base_url: "https://localhost".into(),
            token_env: Some("GRIDLINE_TEST_TOKEN_THAT_IS_NEVER_SET".into()),
            ..Profile::default()
        };
        assert!(resolve_token(&profile, "default").is_err());
    }

    #[test]
    fn example_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        save_config_to(&Config::example(), &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let collection = loaded
            .collection("products")
            .unwrap()
            .to_collection_config("products")
            .unwrap();
        assert_eq!(collection.path, "master-data/other-products");
        assert_eq!(collection.import.fields.len(), 2);
        assert_eq!(loaded.profile(None).unwrap().1.token_env.as_deref(), Some("GRIDLINE_TOKEN"));
    }
}
