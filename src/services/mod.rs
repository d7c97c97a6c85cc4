//! Services module
//!
//! This module contains clients for the external systems the dialogs call

pub mod azure;

// Re-export commonly used services
pub use azure::{ArmClient, ResourceProvider};
