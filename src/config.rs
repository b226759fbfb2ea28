//! Configuration system for the Chorus Router
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (CHORUS_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::llm::BackendKind;
use crate::persona::PersonaId;

/// Main router configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerSettings,

    /// Text-generation provider settings
    pub llm: LlmSettings,

    /// Persona selection settings
    pub routing: RoutingSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to bind
    pub bind: String,

    /// Tokio worker threads (0 = auto)
    pub worker_threads: usize,
}

/// Text-generation provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider: gemini, openai or mock
    pub provider: String,

    /// API base URL (empty = provider default)
    pub base_url: String,

    /// API key (empty = read the provider's standard environment variable)
    pub api_key: String,

    /// Model identifier (empty = provider default)
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    pub max_retries: u32,
}

/// Persona selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Persona used when nothing better is known
    pub default_persona: String,

    /// Issue the aggregator's persona calls concurrently
    pub parallel_fanout: bool,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            worker_threads: 0, // Auto-detect
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            default_persona: PersonaId::default().slug().to_string(),
            parallel_fanout: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl LlmSettings {
    /// Provider kind; only valid after `AppConfig::validate`
    pub fn kind(&self) -> Result<BackendKind> {
        self.provider
            .parse()
            .map_err(|e: String| Error::config_field_invalid("llm.provider", e))
    }

    /// Configured key, or the provider's standard environment variable
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        self.kind()
            .ok()
            .and_then(|k| k.key_env())
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }
}

impl RoutingSettings {
    pub fn default_persona(&self) -> Result<PersonaId> {
        self.default_persona
            .parse()
            .map_err(|e: String| Error::config_field_invalid("routing.default_persona", e))
    }
}

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_overrides(|key| std::env::var(key).ok());

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Parse a single TOML file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("chorus-router.toml"),
            PathBuf::from("config.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("chorus").join("router.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".chorus").join("router.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/chorus/router.toml"),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply `CHORUS_*` overrides looked up through `var`.
    ///
    /// Unparseable numeric or boolean values are ignored.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server settings
        if let Some(val) = var("CHORUS_BIND") {
            self.server.bind = val;
        }
        if let Some(n) = var("CHORUS_WORKER_THREADS").and_then(|v| v.parse().ok()) {
            self.server.worker_threads = n;
        }

        // LLM settings
        if let Some(val) = var("CHORUS_LLM_PROVIDER") {
            self.llm.provider = val.to_lowercase();
        }
        if let Some(val) = var("CHORUS_LLM_BASE_URL") {
            self.llm.base_url = val;
        }
        if let Some(val) = var("CHORUS_LLM_API_KEY") {
            self.llm.api_key = val;
        }
        if let Some(val) = var("CHORUS_LLM_MODEL") {
            self.llm.model = val;
        }
        if let Some(n) = var("CHORUS_LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.llm.timeout_secs = n;
        }
        if let Some(n) = var("CHORUS_LLM_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.llm.max_retries = n;
        }

        // Routing settings
        if let Some(val) = var("CHORUS_DEFAULT_PERSONA") {
            self.routing.default_persona = val;
        }
        if let Some(val) = var("CHORUS_PARALLEL_FANOUT") {
            self.routing.parallel_fanout = parse_flag(&val);
        }

        // Logging settings
        if let Some(val) = var("CHORUS_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("CHORUS_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Some(val) = var("CHORUS_LOG_JSON") {
            self.logging.json_format = parse_flag(&val);
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            Error::config_field_invalid(
                "server.bind",
                format!("Invalid bind address '{}': {}", self.server.bind, e),
            )
        })?;

        self.llm.kind()?;

        if !self.llm.base_url.is_empty() {
            let url = url::Url::parse(&self.llm.base_url).map_err(|e| {
                Error::config_field_invalid(
                    "llm.base_url",
                    format!("Invalid base URL '{}': {}", self.llm.base_url, e),
                )
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::config_field_invalid(
                    "llm.base_url",
                    "Base URL must start with http:// or https://",
                ));
            }
        }

        if self.llm.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "llm.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        self.routing.default_persona()?;

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Parsed bind address; only valid after `validate`
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|_| Error::config_field_invalid("server.bind", "Invalid bind address"))
    }

    /// Runtime worker thread count
    pub fn worker_threads(&self) -> usize {
        if self.server.worker_threads > 0 {
            self.server.worker_threads
        } else {
            num_cpus::get().clamp(1, 8)
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location written by `config init`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chorus")
        .join("router.toml")
}

/// Initialize a new configuration file, returning where it was written
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# Chorus Router Configuration

[server]
# Socket address for the HTTP API
bind = "127.0.0.1:8080"

# Async worker threads (0 = auto-detect, capped at 8)
worker_threads = 0

[llm]
# Provider: gemini, openai or mock
provider = "gemini"

# API base URL (empty = provider default)
base_url = ""

# API key (empty = read GEMINI_API_KEY or OPENAI_API_KEY)
api_key = ""

# Model identifier (empty = gemini-2.5-flash / gpt-4o-mini)
model = ""

# Request timeout in seconds
timeout_secs = 60

# Maximum retries on transient failures
max_retries = 2

[routing]
# Persona used when no better choice is known
default_persona = "spongebob"

# Ask all four personas at once in aggregator mode
parallel_fanout = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.chorus/logs/router.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
