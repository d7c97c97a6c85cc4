//! Error handling for AzBuddy
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for AzBuddy application
#[derive(Error, Debug)]
pub enum AzBuddyError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Resource provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Input did not satisfy the pending prompt: {0}")]
    Validation(String),

    #[error("Dialog state corrupted for {conversation}: {reason}")]
    StateCorruption { conversation: String, reason: String },

    #[error("Dialog '{dialog}' made {transitions} transitions without waiting for input")]
    RunawayFlow { dialog: String, transitions: usize },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised by the Azure Resource Manager client
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{code}: {message} (HTTP {status})")]
    Api { status: u16, code: String, message: String },

    #[error("Invalid response from Azure: {0}")]
    InvalidResponse(String),

    #[error("Request to Azure failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Azure operation failed: {0}")]
    OperationFailed(String),

    #[error("Azure operation still running after {attempts} status checks")]
    PollingExhausted { attempts: u32 },
}

/// Result type alias for AzBuddy operations
pub type Result<T> = std::result::Result<T, AzBuddyError>;

/// Result type alias for resource provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl AzBuddyError {
    /// Build a state corruption error for a conversation key
    pub fn corruption(conversation: impl Into<String>, reason: impl Into<String>) -> Self {
        AzBuddyError::StateCorruption {
            conversation: conversation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the controller should discard the conversation's dialog stack
    pub fn resets_conversation(&self) -> bool {
        matches!(
            self,
            AzBuddyError::StateCorruption { .. } | AzBuddyError::RunawayFlow { .. }
        )
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            AzBuddyError::Telegram(_) => true,
            AzBuddyError::Provider(_) => true,
            AzBuddyError::Config(_) => false,
            AzBuddyError::ConfigSource(_) => false,
            AzBuddyError::Validation(_) => true,
            AzBuddyError::StateCorruption { .. } => true,
            AzBuddyError::RunawayFlow { .. } => true,
            AzBuddyError::Redis(_) => true,
            AzBuddyError::Http(_) => true,
            AzBuddyError::Serialization(_) => false,
            AzBuddyError::Io(_) => true,
            AzBuddyError::UrlParse(_) => false,
            AzBuddyError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AzBuddyError::Config(_) => ErrorSeverity::Critical,
            AzBuddyError::ConfigSource(_) => ErrorSeverity::Critical,
            AzBuddyError::Validation(_) => ErrorSeverity::Info,
            AzBuddyError::InvalidInput(_) => ErrorSeverity::Info,
            AzBuddyError::StateCorruption { .. } => ErrorSeverity::Warning,
            AzBuddyError::Provider(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message_carries_azure_text() {
        let err = ProviderError::Api {
            status: 409,
            code: "ResourceGroupBeingDeleted".to_string(),
            message: "The resource group 'rg1' is in deprovisioning state".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("ResourceGroupBeingDeleted"));
        assert!(text.contains("deprovisioning"));
        assert!(text.contains("409"));
    }

    #[test]
    fn test_corruption_resets_conversation() {
        let err = AzBuddyError::corruption("telegram:1", "unknown dialog 'x'");
        assert!(err.resets_conversation());
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = AzBuddyError::RunawayFlow { dialog: "resource".to_string(), transitions: 65 };
        assert!(err.resets_conversation());

        let err = AzBuddyError::Config("missing token".to_string());
        assert!(!err.resets_conversation());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
