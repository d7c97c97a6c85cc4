//! Data models module
//!
//! This module contains the data structures exchanged with the hosting channel
//! and the Azure resource provider

pub mod activity;
pub mod resource;

// Re-export commonly used models
pub use activity::{ActivityKind, InboundActivity, OutboundActivity};
pub use resource::{ResourceGroupSummary, ResourceHandle};
