//! Azure Resource Manager client
//!
//! Lists resource groups and creates resource groups and storage accounts
//! through the management REST API. Storage account creation is a
//! long-running operation that is polled until Azure reports completion.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AzureConfig;
use crate::models::{ResourceGroupSummary, ResourceHandle};
use crate::utils::errors::{AzBuddyError, ProviderError, ProviderResult, Result};
use crate::utils::helpers::{resource_name_from_id, truncate_text};

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Operations the dialogs need from a cloud provider
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Resource groups visible to the bot, optionally narrowed by an OData filter
    async fn list_resource_groups(&self, filter: Option<&str>) -> ProviderResult<Vec<ResourceGroupSummary>>;

    async fn create_resource_group(&self, name: &str, location: &str) -> ProviderResult<ResourceHandle>;

    async fn create_storage_account(
        &self,
        name: &str,
        resource_group: &str,
        location: &str,
        sku: &str,
    ) -> ProviderResult<ResourceHandle>;
}

#[derive(Debug, Deserialize)]
struct ResourceGroupPage {
    #[serde(default)]
    value: Vec<ResourceGroupEntry>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceGroupEntry {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// [`ResourceProvider`] backed by the Azure management endpoint
#[derive(Clone)]
pub struct ArmClient {
    client: Client,
    base_url: Url,
    subscription_id: String,
    access_token: String,
    resource_group_api_version: String,
    storage_api_version: String,
    storage_kind: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("base_url", &self.base_url.as_str())
            .field("subscription_id", &self.subscription_id)
            .finish_non_exhaustive()
    }
}

impl ArmClient {
    pub fn new(config: &AzureConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("AzBuddy-Bot/1.0")
            .build()
            .map_err(AzBuddyError::Http)?;

        let base_url = Url::parse(&config.management_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AzBuddyError::Config(format!(
                "Azure management URL cannot be used as a base: {}",
                config.management_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            subscription_id: config.subscription_id.clone(),
            access_token: config.access_token.clone(),
            resource_group_api_version: config.resource_group_api_version.clone(),
            storage_api_version: config.storage_api_version.clone(),
            storage_kind: config.storage_kind.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts,
        })
    }

    /// `{base}/subscriptions/{id}/{segments...}?api-version=...`
    fn subscription_url(&self, segments: &[&str], api_version: &str) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::OperationFailed("management URL has no path".to_string()))?
            .pop_if_empty()
            .push("subscriptions")
            .push(&self.subscription_id)
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    fn resource_group_url(&self, name: &str) -> ProviderResult<Url> {
        self.subscription_url(&["resourcegroups", name], &self.resource_group_api_version)
    }

    fn storage_account_url(&self, name: &str, resource_group: &str) -> ProviderResult<Url> {
        self.subscription_url(
            &[
                "resourceGroups",
                resource_group,
                "providers",
                "Microsoft.Storage",
                "storageAccounts",
                name,
            ],
            &self.storage_api_version,
        )
    }

    async fn get(&self, url: Url) -> ProviderResult<Response> {
        debug!(url = %url, "GET");
        let response = self.client.get(url).bearer_auth(&self.access_token).send().await?;
        check_status(response).await
    }

    async fn put(&self, url: Url, body: &Value) -> ProviderResult<Response> {
        debug!(url = %url, "PUT");
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    /// Poll a long-running operation until it finishes, then fetch the resource
    async fn wait_for_completion(&self, accepted: Response, resource_url: Url) -> ProviderResult<Value> {
        let headers = accepted.headers();
        let async_operation = header_url(headers, ASYNC_OPERATION_HEADER);
        let mut status_url = async_operation
            .clone()
            .or_else(|| header_url(headers, LOCATION.as_str()))
            .unwrap_or_else(|| resource_url.clone());
        let mut delay = retry_after(headers).unwrap_or(self.poll_interval);

        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(delay).await;

            let response = self.get(status_url.clone()).await?;
            debug!(attempt = attempt, status = %response.status(), "Polled Azure operation");

            if response.status() == StatusCode::ACCEPTED {
                delay = retry_after(response.headers()).unwrap_or(self.poll_interval);
                if let Some(next) = header_url(response.headers(), LOCATION.as_str()) {
                    status_url = next;
                }
                continue;
            }

            let body = read_json(response).await?;
            match body.get("status").and_then(Value::as_str) {
                // Azure-AsyncOperation status document
                Some(status) if status.eq_ignore_ascii_case("succeeded") => {
                    return read_json(self.get(resource_url).await?).await;
                }
                Some(status) if is_terminal_failure(status) => {
                    let message = body
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .unwrap_or(status)
                        .to_string();
                    return Err(ProviderError::OperationFailed(message));
                }
                Some(_) => {
                    delay = self.poll_interval;
                }
                None if async_operation.is_some() => {
                    delay = self.poll_interval;
                }
                // Location polling answers with the resource itself
                None => return Ok(body),
            }
        }

        warn!(attempts = self.max_poll_attempts, "Gave up waiting on Azure operation");
        Err(ProviderError::PollingExhausted {
            attempts: self.max_poll_attempts,
        })
    }
}

#[async_trait]
impl ResourceProvider for ArmClient {
    async fn list_resource_groups(&self, filter: Option<&str>) -> ProviderResult<Vec<ResourceGroupSummary>> {
        let mut url = self.subscription_url(&["resourcegroups"], &self.resource_group_api_version)?;
        if let Some(filter) = filter {
            url.query_pairs_mut().append_pair("$filter", filter);
        }

        let mut groups = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page: ResourceGroupPage = serde_json::from_value(read_json(self.get(url).await?).await?)
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

            for entry in page.value {
                let name = match entry.name {
                    Some(name) => name,
                    None => match resource_name_from_id(&entry.id) {
                        Some(name) => name.to_string(),
                        None => continue,
                    },
                };
                groups.push(ResourceGroupSummary { name, id: entry.id });
            }

            next = page
                .next_link
                .filter(|link| !link.is_empty())
                .map(|link| Url::parse(&link))
                .transpose()
                .map_err(|e| ProviderError::InvalidResponse(format!("bad nextLink: {}", e)))?;
        }

        info!(count = groups.len(), "Listed resource groups");
        Ok(groups)
    }

    async fn create_resource_group(&self, name: &str, location: &str) -> ProviderResult<ResourceHandle> {
        let url = self.resource_group_url(name)?;
        let response = self.put(url, &json!({ "location": location })).await?;
        resource_handle(&read_json(response).await?)
    }

    async fn create_storage_account(
        &self,
        name: &str,
        resource_group: &str,
        location: &str,
        sku: &str,
    ) -> ProviderResult<ResourceHandle> {
        let url = self.storage_account_url(name, resource_group)?;
        let body = json!({
            "sku": { "name": sku },
            "kind": self.storage_kind,
            "location": location,
        });

        let response = self.put(url.clone(), &body).await?;
        let resource = if response.status() == StatusCode::ACCEPTED {
            info!(name = name, resource_group = resource_group, "Storage account creation accepted, polling");
            self.wait_for_completion(response, url).await?
        } else {
            read_json(response).await?
        };

        resource_handle(&resource)
    }
}

/// Turn a non-success status into [`ProviderError::Api`]
async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(api_error(status, &body))
}

fn api_error(status: StatusCode, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ProviderError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => {
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                truncate_text(body.trim(), 200)
            };
            ProviderError::Api {
                status: status.as_u16(),
                code: "HttpError".to_string(),
                message,
            }
        }
    }
}

async fn read_json(response: Response) -> ProviderResult<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn resource_handle(resource: &Value) -> ProviderResult<ResourceHandle> {
    resource
        .get("id")
        .and_then(Value::as_str)
        .map(|id| ResourceHandle { id: id.to_string() })
        .ok_or_else(|| ProviderError::InvalidResponse("resource has no id".to_string()))
}

fn header_url(headers: &HeaderMap, name: &str) -> Option<Url> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Url::parse(value).ok())
}

/// `Retry-After` in seconds; HTTP dates are ignored
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn is_terminal_failure(status: &str) -> bool {
    status.eq_ignore_ascii_case("failed") || status.eq_ignore_ascii_case("canceled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client() -> ArmClient {
        let config = AzureConfig {
            subscription_id: "sub-123".to_string(),
            access_token: "token".to_string(),
            ..AzureConfig::default()
        };
        ArmClient::new(&config).unwrap()
    }

    #[test]
    fn test_resource_group_url() {
        let url = client().resource_group_url("my-rg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-123/resourcegroups/my-rg?api-version=2021-04-01"
        );
    }

    #[test]
    fn test_storage_account_url() {
        let url = client().storage_account_url("mystore", "my-rg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-123/resourceGroups/my-rg/providers/Microsoft.Storage/storageAccounts/mystore?api-version=2023-01-01"
        );
    }

    #[test]
    fn test_api_error_parses_arm_body() {
        let body = r#"{"error":{"code":"InvalidResourceGroup","message":"The name is invalid."}}"#;
        let err = api_error(StatusCode::BAD_REQUEST, body);

        assert_eq!(
            err.to_string(),
            "InvalidResourceGroup: The name is invalid. (HTTP 400)"
        );
    }

    #[test]
    fn test_api_error_without_json_body() {
        let err = api_error(StatusCode::UNAUTHORIZED, "");
        match err {
            ProviderError::Api { status, code, message } => {
                assert_eq!(status, 401);
                assert_eq!(code, "HttpError");
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_retry_after_seconds_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("17"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(17)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_resource_handle_requires_id() {
        let handle = resource_handle(&json!({"id": "/subscriptions/s/resourceGroups/rg"})).unwrap();
        assert_eq!(handle.id, "/subscriptions/s/resourceGroups/rg");
        assert!(resource_handle(&json!({"name": "rg"})).is_err());
    }

    #[test]
    fn test_rejects_non_base_management_url() {
        let config = AzureConfig {
            management_url: "mailto:ops@example.com".to_string(),
            ..AzureConfig::default()
        };
        assert!(ArmClient::new(&config).is_err());
    }
}
