//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{AzBuddyError, Result};
use super::{ChannelMode, Settings, StorageBackend};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    if settings.storage.backend == StorageBackend::Redis {
        validate_redis_config(&settings.redis)?;
    }
    validate_azure_config(&settings.azure)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.mode == ChannelMode::Telegram && config.token.is_empty() {
        return Err(AzBuddyError::Config(
            "Bot token is required in telegram mode".to_string()
        ));
    }

    if config.welcome_message.trim().is_empty() {
        return Err(AzBuddyError::Config(
            "Welcome message must not be empty".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AzBuddyError::Config(
            "Redis URL is required".to_string()
        ));
    }

    if config.ttl_seconds == 0 {
        return Err(AzBuddyError::Config(
            "Redis TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate Azure configuration
fn validate_azure_config(config: &super::AzureConfig) -> Result<()> {
    url::Url::parse(&config.management_url).map_err(|e| {
        AzBuddyError::Config(format!("Invalid Azure management URL: {}", e))
    })?;

    if config.subscription_id.is_empty() {
        return Err(AzBuddyError::Config(
            "Azure subscription ID is required".to_string()
        ));
    }

    if config.access_token.is_empty() {
        return Err(AzBuddyError::Config(
            "Azure access token is required".to_string()
        ));
    }

    if config.locations.is_empty() {
        return Err(AzBuddyError::Config(
            "At least one Azure location must be offered".to_string()
        ));
    }

    if config.storage_skus.is_empty() {
        return Err(AzBuddyError::Config(
            "At least one storage SKU must be offered".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(AzBuddyError::Config(
            "Azure timeout must be greater than 0".to_string()
        ));
    }

    if config.max_poll_attempts == 0 {
        return Err(AzBuddyError::Config(
            "Azure max poll attempts must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AzBuddyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AzBuddyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
