//! Configuration management for the imagery fetcher
//!
//! This module provides TOML configuration with zero-config defaults that
//! reproduce the Nikumaroro survey, file discovery, default file generation,
//! and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::models::{default_rules, Region, RuleTable, YearRule};
use crate::app::{ClientConfig, CoordinatorConfig};
use crate::constants::{defaults, earth_engine, files, limits};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Area of interest
    pub region: Region,
    /// Year range processed
    pub years: YearsConfig,
    /// Output locations and raster size
    pub output: OutputConfig,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Ordered rule table; earlier rules win for years they cover
    pub rules: Vec<YearRule>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            years: YearsConfig::default(),
            output: OutputConfig::default(),
            client: ClientConfigToml::default(),
            logging: LoggingConfig::default(),
            rules: default_rules(),
        }
    }
}

/// Inclusive year range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearsConfig {
    pub start: i32,
    pub end: i32,
}

impl Default for YearsConfig {
    fn default() -> Self {
        Self {
            start: defaults::START_YEAR,
            end: defaults::END_YEAR,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving rasters and the manifest
    pub dir: PathBuf,
    /// Manifest file name inside `dir`
    pub manifest_file_name: String,
    /// Edge length of exported rasters in pixels
    pub image_px: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::OUTPUT_DIR),
            manifest_file_name: files::MANIFEST_FILE_NAME.to_string(),
            image_px: defaults::IMAGE_PX,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// REST API root
    pub base_url: String,
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retry attempts on throttling and transport errors
    pub max_retries: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        let runtime = ClientConfig::default();
        Self {
            base_url: earth_engine::BASE_URL.to_string(),
            tcp_keepalive_secs: runtime.tcp_keepalive.map(|d| d.as_secs()),
            tcp_nodelay: runtime.tcp_nodelay,
            pool_idle_timeout_secs: runtime.pool_idle_timeout.map(|d| d.as_secs()),
            pool_max_per_host: runtime.pool_max_per_host,
            request_timeout_secs: runtime.request_timeout.as_secs(),
            connect_timeout_secs: runtime.connect_timeout.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            max_retries: limits::MAX_RETRIES,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Load configuration, falling back to defaults when no file is found
    ///
    /// Search order: `config_file_override`, `./imagery-fetcher.toml`, then
    /// `<config dir>/imagery-fetcher/config.toml`.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match config_path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the commented default configuration
    ///
    /// Writes to `path`, or the user config location when `None`. An existing
    /// file is left alone unless `force` is set.
    pub async fn write_default(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::get_default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(AppError::generic(format!(
                "Config file already exists: {} (use --force to overwrite)",
                config_path.display()
            )));
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::generic(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to write config file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;

        info!("Wrote default configuration to {}", config_path.display());
        Ok(config_path)
    }

    /// Find configuration file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Ok(user_config) = Self::get_default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        None
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;

        Ok(config_dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load and validate configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;
        config.validate()?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Serialise the effective configuration
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::from)?)
    }

    /// Check every value, collecting all problems
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        errors.extend(
            self.region
                .validation_errors()
                .into_iter()
                .map(|e| format!("region.{}", e)),
        );
        if self.years.end < self.years.start {
            errors.push(format!(
                "years.end {} is before years.start {}",
                self.years.end, self.years.start
            ));
        }
        if self.output.image_px == 0 {
            errors.push("output.image_px must be positive".to_string());
        }
        if self.output.manifest_file_name.is_empty() {
            errors.push("output.manifest_file_name cannot be empty".to_string());
        }
        if self.client.rate_limit_rps == 0 {
            errors.push("client.rate_limit_rps must be positive".to_string());
        }
        if self.client.max_retries > limits::MAX_CONFIGURED_RETRIES {
            errors.push(format!(
                "client.max_retries {} exceeds {}",
                self.client.max_retries,
                limits::MAX_CONFIGURED_RETRIES
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            errors.push(format!("logging.level '{}' is not a level", self.logging.level));
        }

        if self.rules.is_empty() {
            errors.push("at least one [[rules]] entry is required".to_string());
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if self.rules[..i]
                .iter()
                .any(|earlier| earlier.file_prefix == rule.file_prefix)
            {
                errors.push(format!(
                    "rules[{}] ({}): file_prefix '{}' is already used by an earlier rule",
                    i, rule.label, rule.file_prefix
                ));
            }
            errors.extend(
                validate_rule(rule)
                    .into_iter()
                    .map(|e| format!("rules[{}] ({}): {}", i, rule.label, e)),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Runtime configuration for the yearly run
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            region: self.region.clone(),
            start_year: self.years.start,
            end_year: self.years.end,
            rules: RuleTable::new(self.rules.clone()),
            output_dir: self.output.dir.clone(),
            manifest_file_name: self.output.manifest_file_name.clone(),
            dry_run: false,
        }
    }

    /// Runtime configuration for the Earth Engine client
    pub fn to_client_config(&self) -> ClientConfig {
        let client = &self.client;
        ClientConfig {
            base_url: client.base_url.clone(),
            tcp_keepalive: client.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: client.tcp_nodelay,
            pool_idle_timeout: client.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: client.pool_max_per_host,
            request_timeout: Duration::from_secs(client.request_timeout_secs),
            connect_timeout: Duration::from_secs(client.connect_timeout_secs),
            rate_limit_rps: client.rate_limit_rps,
            max_retries: client.max_retries,
            image_px: self.output.image_px,
        }
    }

    /// Collection probed to verify the session
    pub fn probe_collection(&self) -> Option<&str> {
        self.rules.first().map(|r| r.collection.as_str())
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let region = Region::default();
        let client = ClientConfigToml::default();
        let mut content = format!(
            r#"# Imagery Fetcher Configuration
# Defaults reproduce the Taraia Object survey on Nikumaroro Island.

[region]
name = "{name}"
description = "{description}"
# Center in decimal degrees and buffer radius in meters
lat = {lat:?}
lon = {lon:?}
radius_m = {radius:?}

[years]
# Inclusive range; one image is selected per calendar year
start = {start}
end = {end}

[output]
dir = "{dir}"
manifest_file_name = "{manifest}"
# Exported rasters are image_px x image_px
image_px = {image_px}

[client]
base_url = "{base_url}"
tcp_keepalive_secs = {keepalive}
tcp_nodelay = true
pool_idle_timeout_secs = {idle}
pool_max_per_host = {pool}
request_timeout_secs = {request_timeout}
connect_timeout_secs = {connect_timeout}
rate_limit_rps = {rps}
max_retries = {retries}

[logging]
# Used when no -q/-v flag is given: error, warn, info, debug, trace
level = "warn"

# Rules are checked top to bottom. The first rule covering a year applies;
# later rules covering the same year are tried only if it finds no imagery.
"#,
            name = region.name.as_deref().unwrap_or_default(),
            description = region.description.as_deref().unwrap_or_default(),
            lat = region.lat,
            lon = region.lon,
            radius = region.radius_m,
            start = defaults::START_YEAR,
            end = defaults::END_YEAR,
            dir = defaults::OUTPUT_DIR,
            manifest = files::MANIFEST_FILE_NAME,
            image_px = defaults::IMAGE_PX,
            base_url = client.base_url,
            keepalive = client.tcp_keepalive_secs.unwrap_or(30),
            idle = client.pool_idle_timeout_secs.unwrap_or(90),
            pool = client.pool_max_per_host,
            request_timeout = client.request_timeout_secs,
            connect_timeout = client.connect_timeout_secs,
            rps = client.rate_limit_rps,
            retries = client.max_retries,
        );

        for rule in default_rules() {
            content.push_str(&rule_block(&rule));
        }
        content
    }
}

fn validate_rule(rule: &YearRule) -> Vec<String> {
    let mut errors = Vec::new();
    if rule.last_year < rule.first_year {
        errors.push("last_year is before first_year".to_string());
    }
    if rule.collection.is_empty() {
        errors.push("collection cannot be empty".to_string());
    }
    if !rule.has_plain_file_prefix() {
        errors.push(format!(
            "file_prefix '{}' must be non-empty and use only letters, digits, '_' or '-'",
            rule.file_prefix
        ));
    }
    if rule.cloud_field.is_empty() {
        errors.push("cloud_field cannot be empty".to_string());
    }
    if rule.native_resolution_m <= 0.0 {
        errors.push("native_resolution_m must be positive".to_string());
    }
    if rule.visualization.bands.len() != 3 {
        errors.push(format!(
            "visualization needs 3 bands, got {}",
            rule.visualization.bands.len()
        ));
    }
    if rule.visualization.max <= rule.visualization.min {
        errors.push("visualization.max must exceed visualization.min".to_string());
    }
    if rule.visualization.gamma <= 0.0 {
        errors.push("visualization.gamma must be positive".to_string());
    }
    errors
}

fn rule_block(rule: &YearRule) -> String {
    let bands = rule
        .visualization
        .bands
        .iter()
        .map(|b| format!("\"{}\"", b))
        .collect::<Vec<_>>()
        .join(", ");
    let max_cloud = rule
        .max_cloud_cover
        .map(|v| format!("max_cloud_cover = {:?}\n", v))
        .unwrap_or_default();

    format!(
        r#"
[[rules]]
label = "{label}"
file_prefix = "{prefix}"
collection = "{collection}"
cloud_field = "{cloud_field}"
first_year = {first}
last_year = {last}
{max_cloud}native_resolution_m = {resolution:?}

[rules.visualization]
bands = [{bands}]
min = {min:?}
max = {max:?}
gamma = {gamma:?}
"#,
        label = rule.label,
        prefix = rule.file_prefix,
        collection = rule.collection,
        cloud_field = rule.cloud_field,
        first = rule.first_year,
        last = rule.last_year,
        max_cloud = max_cloud,
        resolution = rule.native_resolution_m,
        bands = bands,
        min = rule.visualization.min,
        max = rule.visualization.max,
        gamma = rule.visualization.gamma,
    )
}
