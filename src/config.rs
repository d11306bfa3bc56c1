//! Configuration for vk-harvest
//!
//! Configuration is read from a TOML file, `vk-harvest.toml` in the working
//! directory unless another path is given. Missing sections and fields use
//! default values; only the access token is required.

use crate::api::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use crate::engine::FetchConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClientConfig, RateLimiterConfig, VK_USER_TOKEN_RPS};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "vk-harvest.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// VK access token
    pub access_token: String,
    /// API client settings
    pub api: ApiSettings,
    /// `groups` command settings
    pub groups: GroupsSettings,
    /// `friends` command settings
    pub friends: FriendsSettings,
    /// `keywords` command settings
    pub keywords: KeywordsSettings,
}

impl Config {
    /// Load and validate configuration from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::missing_field("access_token"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.version.trim().is_empty() {
            return Err(Error::invalid_value("api.version", "must not be empty"));
        }
        if self.api.requests_per_second == 0 {
            return Err(Error::invalid_value(
                "api.requests_per_second",
                "must be greater than 0",
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::invalid_value(
                "api.timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Write the commented default config to `path`.
    ///
    /// An existing file is left untouched.
    pub fn write_template(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(Error::config(format!(
                "{} already exists, not overwriting",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config_content())?;
        Ok(())
    }

    /// Default config file content with comments
    pub fn default_config_content() -> &'static str {
        r#"# vk-harvest configuration

# Access token of the account the requests are made from
access_token = ""

[api]
# base_url = "https://api.vk.com/method"
# version = "5.131"
# Request timeout in seconds
timeout_secs = 30
# Retries for HTTP failures and VK "too many requests" errors
max_retries = 3
# VK allows 3 requests per second for user tokens
requests_per_second = 3
# Pause between successive requests of one walk (milliseconds)
request_delay_ms = 333

[groups]
# Take groups from the users below instead of group_ids
from_user = false
# Users whose likes and comments are looked for
user_ids = []
# Groups to scan when from_user = false
group_ids = []

[friends]
# User whose friends are exported
# user_id = 1

[keywords]
# Groups whose walls are scanned
group_ids = []
# Words looked for in posts (and comments with --comments)
keywords = []
"#
    }

    /// Fetch engine configuration derived from the API settings
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new().with_request_delay(self.api.request_delay())
    }
}

// ============================================================================
// API Settings
// ============================================================================

/// VK API client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Method endpoint
    pub base_url: String,
    /// API version
    pub version: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retries per request
    pub max_retries: u32,
    /// Rate limit
    pub requests_per_second: u32,
    /// Pause between successive requests of one walk
    pub request_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            requests_per_second: VK_USER_TOKEN_RPS,
            request_delay_ms: 333,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Inter-request delay as a Duration
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// HTTP client configuration for these settings
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(self.timeout())
            .max_retries(self.max_retries)
            .backoff(
                BackoffType::Exponential,
                Duration::from_millis(500),
                Duration::from_secs(30),
            )
            .rate_limit(RateLimiterConfig::per_second(self.requests_per_second))
            .build()
    }
}

// ============================================================================
// Command Settings
// ============================================================================

/// Settings for the `groups` command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsSettings {
    /// Scan the groups of each user instead of `group_ids`
    pub from_user: bool,
    /// Users to look for
    pub user_ids: Vec<i64>,
    /// Groups to scan
    pub group_ids: Vec<i64>,
}

/// Settings for the `friends` command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendsSettings {
    /// User whose friend list is exported
    pub user_id: Option<i64>,
}

/// Settings for the `keywords` command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsSettings {
    /// Groups to scan
    pub group_ids: Vec<i64>,
    /// Words to look for
    pub keywords: Vec<String>,
}
