//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub redis: RedisConfig,
    pub azure: AzureConfig,
    pub logging: LoggingConfig,
}

/// Which hosting channel delivers user messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Telegram,
    Console,
}

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub token: String,
    pub mode: ChannelMode,
    pub welcome_message: String,
}

/// Where dialog stacks are persisted between turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Redis,
}

/// Dialog state storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Azure Resource Manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AzureConfig {
    pub management_url: String,
    pub subscription_id: String,
    /// Bearer token for the management endpoint. Acquiring it is left to the operator.
    pub access_token: String,
    pub resource_group_api_version: String,
    pub storage_api_version: String,
    /// OData filter applied when listing resource groups; empty lists all of them
    pub resource_group_filter: String,
    pub locations: Vec<String>,
    pub storage_skus: Vec<String>,
    pub storage_kind: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; stdout only when unset
    pub directory: Option<String>,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("AZBUDDY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("azure.locations")
                    .with_list_parse_key("azure.storage_skus")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::AzBuddyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            storage: StorageConfig::default(),
            redis: RedisConfig::default(),
            azure: AzureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            mode: ChannelMode::Console,
            welcome_message: "Welcome to the Az Buddy Bot. This bot will help you create azure resources."
                .to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Memory }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            prefix: "azbuddy:".to_string(),
            ttl_seconds: 86400,
        }
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            management_url: "https://management.azure.com".to_string(),
            subscription_id: String::new(),
            access_token: String::new(),
            resource_group_api_version: "2021-04-01".to_string(),
            storage_api_version: "2023-01-01".to_string(),
            resource_group_filter: "tagName eq 'hackathon' and tagValue eq 'azbuddy'".to_string(),
            locations: vec!["EastUS".to_string(), "WestUS".to_string(), "EastUS2".to_string()],
            storage_skus: vec![
                "Standard_LRS".to_string(),
                "Standard_ZRS".to_string(),
                "Standard_GRS".to_string(),
                "Standard_RAGRS".to_string(),
            ],
            storage_kind: "StorageV2".to_string(),
            poll_interval_ms: 2000,
            max_poll_attempts: 60,
            timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
