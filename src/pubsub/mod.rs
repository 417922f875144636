//! Pub/Sub provider boundary.
//!
//! The detector only ever lists: topics of a project and subscriptions of a
//! topic. Both are paginated provider-side; [`PubSubApi`] exposes one page per
//! call and [`pager`] turns that into lazy, retried streams.

pub mod memory;
pub mod pager;
pub mod rest;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::{MemoryPubSub, Operation};
pub use pager::{ItemStream, RetryPolicy};
pub use rest::RestPubSub;

/// Full topic resource name, `projects/{project}/topics/{topic}`.
pub type TopicId = String;
/// Full subscription resource name, `projects/{project}/subscriptions/{sub}`.
pub type SubscriptionId = String;

/// One page of resource names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<String>,
    /// Token for the following page. `None` on the last page.
    pub next_page_token: Option<String>,
}

impl Page {
    pub fn new(items: Vec<String>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            // The REST API signals the last page with an empty token.
            next_page_token: next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Single-page listing calls against the messaging provider.
#[async_trait]
pub trait PubSubApi: Send + Sync {
    /// Lists topic names of `project` (the bare project id).
    async fn list_topics(&self, project: &str, page_token: Option<String>) -> Result<Page>;

    /// Lists subscription names attached to `topic` (a full topic name).
    async fn list_topic_subscriptions(
        &self,
        topic: &str,
        page_token: Option<String>,
    ) -> Result<Page>;
}

pub fn topic_name(project: &str, topic: &str) -> TopicId {
    format!("projects/{}/topics/{}", project, topic)
}

pub fn subscription_name(project: &str, subscription: &str) -> SubscriptionId {
    format!("projects/{}/subscriptions/{}", project, subscription)
}
