//! AzBuddy
//!
//! A conversational bot that walks a user through creating Azure resource
//! groups and storage accounts. Flows are declared as ordered step lists, a
//! single engine drives each conversation's dialog stack, and the stack is
//! persisted between turns.

pub mod config;
pub mod dialogs;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AzBuddyError, Result};

// Re-export main components for easy access
pub use dialogs::{FlowRegistry, StepEngine, StepServices};
pub use handlers::{ActivitySink, RootController};
pub use services::{ArmClient, ResourceProvider};
pub use state::{DialogStateStore, MemoryStateStore, RedisStateStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
