use crate::constants::{
    get_supported_sources, DEFAULT_COLLECTOR_URL, DEFAULT_CONFIG_FILE, DEFAULT_DATA_ROOT,
    DEFAULT_TIMEOUT_SECONDS, ENV_COLLECTOR_URL, ENV_DATA_ROOT,
};
use crate::error::{Result, RouteError};
use crate::types::Source;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub root: PathBuf,
    pub sources: Vec<String>,
    pub skip_download: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_COLLECTOR_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_DATA_ROOT),
            sources: get_supported_sources().into_iter().map(String::from).collect(),
            skip_download: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `route_sync.toml` when it
    /// exists, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            RouteError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_COLLECTOR_URL).filter(|v| !v.trim().is_empty()) {
            self.collector.url = url.trim().to_string();
        }
        if let Some(root) = lookup(ENV_DATA_ROOT).filter(|v| !v.trim().is_empty()) {
            self.data.root = PathBuf::from(root.trim());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.collector.url.trim().is_empty() {
            return Err(RouteError::Config("collector.url must not be empty".into()));
        }
        if self.collector.timeout_seconds == 0 {
            return Err(RouteError::Config(
                "collector.timeout_seconds must be positive".into(),
            ));
        }
        self.sources()?;
        Ok(())
    }

    /// Configured sources, in processing order
    pub fn sources(&self) -> Result<Vec<Source>> {
        self.data.sources.iter().map(|name| name.parse()).collect()
    }
}
