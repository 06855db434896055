//! Pipeline settings file.
//!
//! ```toml
//! [denorm]
//! success_topic = "telemetry.content.de_normalized"
//! failed_topic = "telemetry.content.de_normalized.fail"
//! events_to_allow = ["GE_LAUNCH_GAME", "OE_.*"]
//! content_ttl_ms = 60000
//!
//! [denorm.gid_fields]
//! oe = "gdata.id"
//! ge = "edata.eks.gid"
//!
//! [search]
//! endpoint = "http://search-service:9000/v3/search"
//!
//! [store]
//! backend = "lmdb"
//! path = "/var/lib/denorm/content"
//!
//! [logging]
//! format = "json"
//! ```

use std::path::{Path, PathBuf};

use denorm_core::{ConfigError, DenormConfig};
use denorm_search::SearchClientConfig;
use serde::Deserialize;

use crate::classifier::EventClassifier;
use crate::store::StoreSettings;
use crate::telemetry::LoggingConfig;

/// Environment variable naming the settings file.
pub const CONFIG_ENV_VAR: &str = "DENORM_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    pub denorm: DenormConfig,
    pub search: SearchClientConfig,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineSettingsError {
    #[error("Missing configuration file path (use --config or DENORM_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineSettings {
    /// Load from `--config <path>` or `DENORM_CONFIG`, then validate.
    pub fn load() -> Result<Self, PipelineSettingsError> {
        let path = config_path_from_args(std::env::args().skip(1))
            .or_else(config_path_from_env);
        let path = path.ok_or(PipelineSettingsError::MissingConfigPath)?;
        let settings = Self::from_path(&path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineSettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, PipelineSettingsError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate every section, including compiling the allow patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.denorm.validate()?;
        EventClassifier::new(&self.denorm)?;
        self.search.validate()?;
        if let StoreSettings::Lmdb { path, max_size_mb } = &self.store {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: "store.path".to_string(),
                });
            }
            if *max_size_mb == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "store.max_size_mb".to_string(),
                    value: "0".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}
