//! Snapshot collector: walks every topic of a project and its subscriptions.

use futures_util::TryStreamExt;

use super::Snapshot;
use crate::error::Result;
use crate::pubsub::{pager, PubSubApi, RetryPolicy};

/// Lists all topics of `project` and the subscriptions of each.
///
/// Topics without subscriptions are left out. Any error that survives the
/// pager's retries aborts the whole collection.
pub async fn collect(api: &dyn PubSubApi, project: &str, policy: &RetryPolicy) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();

    let mut topics = pager::topics(api, project, policy).await?;
    while let Some(topic) = topics.try_next().await? {
        tracing::debug!(topic = %topic, "topic");

        let mut subscriptions = Vec::new();
        let mut pages = pager::topic_subscriptions(api, &topic, policy).await?;
        while let Some(subscription) = pages.try_next().await? {
            tracing::debug!(topic = %topic, subscription = %subscription, "subscription");
            subscriptions.push(subscription);
        }
        drop(pages);

        if subscriptions.is_empty() {
            tracing::debug!(topic = %topic, "No subscriptions, topic skipped");
        }
        snapshot.record(topic, subscriptions);
    }

    tracing::debug!(
        topics = snapshot.len(),
        subscriptions = snapshot.subscription_count(),
        "Collected current subscriptions"
    );
    Ok(snapshot)
}
