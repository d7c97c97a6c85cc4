//! Scripted resource provider
//!
//! Records every call the dialogs make and answers from a configurable script
//! instead of talking to Azure.

use async_trait::async_trait;
use std::sync::Mutex;

use azbuddy::models::{ResourceGroupSummary, ResourceHandle};
use azbuddy::services::ResourceProvider;
use azbuddy::utils::errors::{ProviderError, ProviderResult};

pub const TEST_SUBSCRIPTION: &str = "test-sub";

/// A call received by [`FakeProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ListResourceGroups {
        filter: Option<String>,
    },
    CreateResourceGroup {
        name: String,
        location: String,
    },
    CreateStorageAccount {
        name: String,
        resource_group: String,
        location: String,
        sku: String,
    },
}

#[derive(Debug)]
pub struct FakeProvider {
    calls: Mutex<Vec<ProviderCall>>,
    groups: Mutex<Vec<ResourceGroupSummary>>,
    create_failure: Mutex<Option<String>>,
    list_failure: Mutex<Option<String>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::with_groups(&["rg1", "rg2"])
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(names: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            groups: Mutex::new(names.iter().map(|name| group(name)).collect()),
            create_failure: Mutex::new(None),
            list_failure: Mutex::new(None),
        }
    }

    /// Make every create call fail with an ARM conflict carrying `message`
    pub fn fail_creates_with(&self, message: &str) {
        *self.create_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_listing_with(&self, message: &str) {
        *self.list_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(&self, slot: &Mutex<Option<String>>) -> ProviderResult<()> {
        match slot.lock().unwrap().clone() {
            Some(message) => Err(ProviderError::Api {
                status: 409,
                code: "Conflict".to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}

pub fn group(name: &str) -> ResourceGroupSummary {
    ResourceGroupSummary {
        name: name.to_string(),
        id: resource_group_id(name),
    }
}

pub fn resource_group_id(name: &str) -> String {
    format!("/subscriptions/{}/resourceGroups/{}", TEST_SUBSCRIPTION, name)
}

pub fn storage_account_id(resource_group: &str, name: &str) -> String {
    format!(
        "{}/providers/Microsoft.Storage/storageAccounts/{}",
        resource_group_id(resource_group),
        name
    )
}

#[async_trait]
impl ResourceProvider for FakeProvider {
    async fn list_resource_groups(&self, filter: Option<&str>) -> ProviderResult<Vec<ResourceGroupSummary>> {
        self.record(ProviderCall::ListResourceGroups {
            filter: filter.map(str::to_string),
        });
        self.failure(&self.list_failure)?;
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn create_resource_group(&self, name: &str, location: &str) -> ProviderResult<ResourceHandle> {
        self.record(ProviderCall::CreateResourceGroup {
            name: name.to_string(),
            location: location.to_string(),
        });
        self.failure(&self.create_failure)?;
        Ok(ResourceHandle {
            id: resource_group_id(name),
        })
    }

    async fn create_storage_account(
        &self,
        name: &str,
        resource_group: &str,
        location: &str,
        sku: &str,
    ) -> ProviderResult<ResourceHandle> {
        self.record(ProviderCall::CreateStorageAccount {
            name: name.to_string(),
            resource_group: resource_group.to_string(),
            location: location.to_string(),
            sku: sku.to_string(),
        });
        self.failure(&self.create_failure)?;
        Ok(ResourceHandle {
            id: storage_account_id(resource_group, name),
        })
    }
}
