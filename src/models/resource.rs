//! Azure resource models

use serde::{Deserialize, Serialize};

/// A resource group as returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupSummary {
    pub name: String,
    pub id: String,
}

/// Identifies a resource the provider created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub id: String,
}
