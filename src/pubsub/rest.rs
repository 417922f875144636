//! Pub/Sub REST client.
//!
//! Talks to `pubsub.googleapis.com/v1` with an OAuth token from `gcp_auth`,
//! or to a local emulator (plain HTTP, no credentials) when one is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gcp_auth::TokenProvider;
use serde::Deserialize;

use super::{Page, PubSubApi};
use crate::error::{Error, ProviderCode, Result};

const API_ROOT: &str = "https://pubsub.googleapis.com/v1";
const PUBSUB_SCOPE: &str = "https://www.googleapis.com/auth/pubsub";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct RestPubSub {
    client: reqwest::Client,
    base_url: String,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl std::fmt::Debug for RestPubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestPubSub")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token_provider.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTopicsResponse {
    #[serde(default)]
    topics: Vec<TopicResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicResource {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTopicSubscriptionsResponse {
    #[serde(default)]
    subscriptions: Vec<String>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl RestPubSub {
    /// Connects to the production API using ambient credentials.
    pub async fn connect() -> Result<Self> {
        let token_provider = gcp_auth::provider()
            .await
            .map_err(|e| Error::Auth(format!("Failed to initialize GCP auth: {e}")))?;
        Ok(Self {
            client: http_client()?,
            base_url: API_ROOT.to_string(),
            token_provider: Some(token_provider),
        })
    }

    /// Connects to an emulator at `host` (`host:port`, no scheme).
    pub fn emulator(host: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: format!("http://{}/v1", host.trim_end_matches('/')),
            token_provider: None,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        page_token: Option<String>,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        if let Some(provider) = &self.token_provider {
            let token = provider
                .token(&[PUBSUB_SCOPE])
                .await
                .map_err(|e| Error::Auth(format!("Failed to get GCP access token: {e}")))?;
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(transport_error);
        }

        match response.text().await {
            Ok(body) => Err(api_error(status.as_u16(), &body)),
            Err(e) => Err(unreadable_body(status.as_u16(), e)),
        }
    }
}

#[async_trait]
impl PubSubApi for RestPubSub {
    async fn list_topics(&self, project: &str, page_token: Option<String>) -> Result<Page> {
        let path = format!("projects/{}/topics", project);
        let response: ListTopicsResponse = self.get(&path, page_token).await?;
        let names = response.topics.into_iter().map(|t| t.name).collect();
        Ok(Page::new(names, response.next_page_token))
    }

    async fn list_topic_subscriptions(
        &self,
        topic: &str,
        page_token: Option<String>,
    ) -> Result<Page> {
        let path = format!("{}/subscriptions", topic);
        let response: ListTopicSubscriptionsResponse = self.get(&path, page_token).await?;
        Ok(Page::new(response.subscriptions, response.next_page_token))
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))
}

fn transport_error(err: reqwest::Error) -> Error {
    let code = if err.is_timeout() {
        ProviderCode::DeadlineExceeded
    } else if err.is_connect() || err.is_request() {
        ProviderCode::Unavailable
    } else if let Some(status) = err.status() {
        ProviderCode::from_http_status(status.as_u16())
    } else {
        ProviderCode::Other(0)
    };
    Error::pubsub(code, err.to_string())
}

fn api_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => {
            let code = ProviderCode::from_status_name(&parsed.error.status)
                .unwrap_or_else(|| ProviderCode::from_http_status(status));
            Error::pubsub(code, parsed.error.message)
        }
        Err(_) => Error::pubsub(
            ProviderCode::from_http_status(status),
            format!("HTTP {}: {}", status, body.trim()),
        ),
    }
}

/// The call failed with `status` and its error body could not be read.
fn unreadable_body(status: u16, err: impl std::fmt::Display) -> Error {
    Error::pubsub(
        ProviderCode::from_http_status(status),
        format!("HTTP {}: failed to read error body: {}", status, err),
    )
}
