//! Pager/Retry wrapper around the single-page listing calls.
//!
//! Only the request for the first page is retried. Once a stream is handed
//! out, later pages are fetched on demand and any failure surfaces through
//! the stream unchanged.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, BoxStream};
use tokio::time::Instant;

use super::{Page, PubSubApi};
use crate::error::Result;

/// Lazy, single-pass sequence of resource names.
pub type ItemStream<'a> = BoxStream<'a, Result<String>>;

// ========================================
// RETRY POLICY
// ========================================

/// Exponential backoff bounded by attempts and an overall deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Budget measured from the first attempt.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            deadline: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Tight policy for tests and local runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
            deadline: Duration::from_secs(30),
        }
    }

    /// Sleep before attempt `attempt + 1` (attempts are 1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Runs `op` until it succeeds, fails permanently, or the policy is exhausted.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let mut attempt = 1;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() || attempt >= policy.max_attempts {
            return Err(err);
        }

        let delay = policy.backoff(attempt);
        if started.elapsed() + delay > policy.deadline {
            tracing::warn!(what, attempt, "Retry deadline reached");
            return Err(err);
        }

        tracing::warn!(
            what,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient provider error, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

// ========================================
// PAGERS
// ========================================

/// All topic names of `project`.
pub async fn topics<'a>(
    api: &'a dyn PubSubApi,
    project: &'a str,
    policy: &RetryPolicy,
) -> Result<ItemStream<'a>> {
    let first = with_retry(policy, "list_topics", || api.list_topics(project, None)).await?;
    Ok(paginate(first, move |token| api.list_topics(project, Some(token))))
}

/// All subscription names attached to `topic`.
pub async fn topic_subscriptions<'a>(
    api: &'a dyn PubSubApi,
    topic: &'a str,
    policy: &RetryPolicy,
) -> Result<ItemStream<'a>> {
    let first = with_retry(policy, "list_topic_subscriptions", || {
        api.list_topic_subscriptions(topic, None)
    })
    .await?;
    Ok(paginate(first, move |token| {
        api.list_topic_subscriptions(topic, Some(token))
    }))
}

struct Cursor<F> {
    buffered: VecDeque<String>,
    next_page_token: Option<String>,
    fetch: F,
}

fn paginate<'a, F, Fut>(first: Page, fetch: F) -> ItemStream<'a>
where
    F: Fn(String) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Page>> + Send + 'a,
{
    let cursor = Cursor {
        buffered: first.items.into(),
        next_page_token: first.next_page_token,
        fetch,
    };

    Box::pin(stream::try_unfold(cursor, |mut cursor| async move {
        loop {
            if let Some(item) = cursor.buffered.pop_front() {
                return Ok(Some((item, cursor)));
            }
            let Some(token) = cursor.next_page_token.take() else {
                return Ok(None);
            };
            let page = (cursor.fetch)(token).await?;
            cursor.buffered.extend(page.items);
            cursor.next_page_token = page.next_page_token;
        }
    }))
}
