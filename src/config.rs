//! Configuration for the engagement pipeline.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FEEDPILOT_HOME, GEMINI_API_KEY, credentials)
//! 2. Config file (.feedpilot/config.yaml)
//! 3. Defaults (~/.feedpilot)
//!
//! Config file discovery:
//! - Searches current directory and parents for .feedpilot/config.yaml
//! - The home path in the config file is relative to the .feedpilot/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

use crate::core::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to determine home directory")]
    NoHomeDir,
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub platform: Option<PlatformSettings>,
    #[serde(default)]
    pub engagement: Option<EngagementSettings>,
    #[serde(default)]
    pub ai: Option<AiSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the .feedpilot/ directory)
    pub home: Option<String>,
}

/// Target platform and its credentials.
///
/// Credentials are for the external browser-automation surface; the
/// pipeline itself never logs them.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_platform_name")]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_platform_name() -> String {
    "linkedin".to_string()
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            name: default_platform_name(),
            username: None,
            password: None,
        }
    }
}

impl PlatformSettings {
    /// Overlay `{PLATFORM}_USERNAME` / `{PLATFORM}_PASSWORD` env vars
    fn with_env(mut self) -> Self {
        let prefix = self.name.to_uppercase();
        if let Ok(username) = std::env::var(format!("{prefix}_USERNAME")) {
            self.username = Some(username);
        }
        if let Ok(password) = std::env::var(format!("{prefix}_PASSWORD")) {
            self.password = Some(password);
        }
        self
    }
}

/// Engagement loop knobs
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementSettings {
    /// Maximum confirmed engagements per run
    #[serde(default = "default_budget_limit")]
    pub budget_limit: u32,

    /// Minimum description length to consider engaging, in characters
    #[serde(default = "default_min_description")]
    pub min_description_length: usize,

    /// Platform comment length limit, in characters
    #[serde(default = "default_max_comment_chars")]
    pub max_comment_chars: usize,

    /// Skip evaluations after which a post stops being re-evaluated
    /// (absent = re-evaluate indefinitely)
    #[serde(default)]
    pub skip_replay_limit: Option<u32>,

    /// Pause after each confirmed engagement, in seconds
    #[serde(default = "default_engagement_delay")]
    pub engagement_delay_secs: u64,

    /// Retry policy for transient generation failures
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_budget_limit() -> u32 {
    10
}
fn default_min_description() -> usize {
    1
}
fn default_max_comment_chars() -> usize {
    1250
}
fn default_engagement_delay() -> u64 {
    30
}

impl Default for EngagementSettings {
    fn default() -> Self {
        Self {
            budget_limit: default_budget_limit(),
            min_description_length: default_min_description(),
            max_comment_chars: default_max_comment_chars(),
            skip_replay_limit: None,
            engagement_delay_secs: default_engagement_delay(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    /// API key; usually supplied via GEMINI_API_KEY instead of the file
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_output_tokens() -> u32 {
    256
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AiSettings {
    /// GEMINI_API_KEY overrides any file-provided key
    fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        self
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the state directory
    pub home: PathBuf,
    pub platform: PlatformSettings,
    pub engagement: EngagementSettings,
    pub ai: AiSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Audit log path, namespaced per platform
    /// ($FEEDPILOT_HOME/<platform>/audit.jsonl)
    pub fn audit_log_path(&self) -> PathBuf {
        self.home.join(&self.platform.name).join("audit.jsonl")
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.engagement.budget_limit == 0 {
            return Err(ConfigError::Invalid(
                "engagement.budget_limit must be greater than zero".to_string(),
            ));
        }
        if self.platform.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "platform.name must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".feedpilot").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(&path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig, ConfigError> {
    let default_home = dirs::home_dir()
        .ok_or(ConfigError::NoHomeDir)?
        .join(".feedpilot");

    let config_file = find_config_file();

    let (home, platform, engagement, ai) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        let home = if let Ok(env_home) = std::env::var("FEEDPILOT_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            // home is relative to the .feedpilot/ directory
            let config_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(config_dir, home_path)
        } else {
            default_home
        };

        (
            home,
            config.platform.unwrap_or_default().with_env(),
            config.engagement.unwrap_or_default(),
            config.ai.unwrap_or_default().with_env(),
        )
    } else {
        let home = std::env::var("FEEDPILOT_HOME")
            .map(PathBuf::from)
            .unwrap_or(default_home);

        (
            home,
            PlatformSettings::default().with_env(),
            EngagementSettings::default(),
            AiSettings::default().with_env(),
        )
    };

    ResolvedConfig {
        home,
        platform,
        engagement,
        ai,
        config_file,
    }
    .validate()
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig, ConfigError> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => Err(ConfigError::Invalid(e.clone())),
    }
}
