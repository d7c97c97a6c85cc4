//! Mock Azure Resource Manager server for testing
//!
//! This module provides a mock HTTP server that simulates the parts of the
//! management API the bot uses. It uses wiremock to create configurable mock
//! responses.

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use azbuddy::config::AzureConfig;

use super::fake_provider::{resource_group_id, storage_account_id, TEST_SUBSCRIPTION};

pub const TEST_TOKEN: &str = "test-token";

/// Mock management endpoint
pub struct ArmMockServer {
    pub server: MockServer,
}

impl ArmMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Azure settings pointing at this server, with fast polling
    pub fn config(&self) -> AzureConfig {
        AzureConfig {
            management_url: self.uri(),
            subscription_id: TEST_SUBSCRIPTION.to_string(),
            access_token: TEST_TOKEN.to_string(),
            poll_interval_ms: 10,
            max_poll_attempts: 3,
            timeout_seconds: 5,
            ..AzureConfig::default()
        }
    }

    pub fn resource_groups_path() -> String {
        format!("/subscriptions/{}/resourcegroups", TEST_SUBSCRIPTION)
    }

    pub fn storage_account_path(resource_group: &str, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}",
            TEST_SUBSCRIPTION, resource_group, name
        )
    }

    pub fn resource_group_body(name: &str, location: &str) -> Value {
        json!({
            "id": resource_group_id(name),
            "name": name,
            "location": location,
            "properties": { "provisioningState": "Succeeded" }
        })
    }

    pub fn storage_account_body(resource_group: &str, name: &str) -> Value {
        json!({
            "id": storage_account_id(resource_group, name),
            "name": name,
            "kind": "StorageV2",
            "properties": { "provisioningState": "Succeeded" }
        })
    }

    /// Answer the first listing page and point at a second one
    pub async fn mock_list_two_pages(&self, filter: &str) {
        let next_link = format!(
            "{}{}?api-version=2021-04-01&page=2",
            self.uri(),
            Self::resource_groups_path()
        );

        Mock::given(method("GET"))
            .and(path(Self::resource_groups_path()))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [ { "id": resource_group_id("rg3"), "name": "rg3" } ]
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(Self::resource_groups_path()))
            .and(query_param("$filter", filter))
            .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    { "id": resource_group_id("rg1"), "name": "rg1" },
                    { "id": resource_group_id("rg2") }
                ],
                "nextLink": next_link
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_create_resource_group(&self, name: &str, location: &str) {
        Mock::given(method("PUT"))
            .and(path(format!("{}/{}", Self::resource_groups_path(), name)))
            .and(query_param("api-version", "2021-04-01"))
            .and(body_json(json!({ "location": location })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(Self::resource_group_body(name, location)),
            )
            .mount(&self.server)
            .await;
    }

    /// Reply with an ARM error envelope
    pub async fn mock_arm_error(&self, http_method: &str, status: u16, code: &str, message: &str) {
        Mock::given(method(http_method))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "code": code, "message": message }
            })))
            .mount(&self.server)
            .await;
    }

    /// Accept the storage PUT and complete it through a Location poll
    pub async fn mock_create_storage_account_lro(&self, resource_group: &str, name: &str, pending_polls: u64) {
        let operation_path = format!(
            "/subscriptions/{}/providers/Microsoft.Storage/locations/eastus/asyncoperations/op-1",
            TEST_SUBSCRIPTION
        );
        let operation_url = format!("{}{}", self.uri(), operation_path);

        Mock::given(method("PUT"))
            .and(path(Self::storage_account_path(resource_group, name)))
            .and(query_param("api-version", "2023-01-01"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Location", operation_url.as_str())
                    .insert_header("Retry-After", "0"),
            )
            .mount(&self.server)
            .await;

        if pending_polls > 0 {
            Mock::given(method("GET"))
                .and(path(operation_path.clone()))
                .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
                .up_to_n_times(pending_polls)
                .mount(&self.server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path(operation_path))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(Self::storage_account_body(resource_group, name)),
            )
            .mount(&self.server)
            .await;
    }
}
