//! In-memory Pub/Sub provider.
//!
//! Deterministic stand-in for the REST API: topics and subscriptions are kept
//! in insertion order, listings are paginated with a fixed page size, and
//! faults can be scheduled per operation to exercise the retry path.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Page, PubSubApi};
use crate::error::{Error, ProviderCode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTopics,
    ListTopicSubscriptions,
}

#[derive(Debug)]
struct Fault {
    op: Operation,
    code: ProviderCode,
    /// Calls of `op` to let through before failing.
    skip: usize,
    remaining: usize,
}

#[derive(Debug, Default)]
struct State {
    /// (topic name, subscription names), in creation order.
    topics: Vec<(String, Vec<String>)>,
    faults: Vec<Fault>,
    calls: HashMap<Operation, usize>,
}

#[derive(Debug)]
pub struct MemoryPubSub {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MemoryPubSub {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    /// Creates `topic` if needed and attaches `subscriptions` to it.
    pub fn add_topic<I, S>(&self, topic: &str, subscriptions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock();
        let subs = subscriptions.into_iter().map(Into::into);
        match state.topics.iter_mut().find(|(name, _)| name == topic) {
            Some((_, existing)) => existing.extend(subs),
            None => state.topics.push((topic.to_string(), subs.collect())),
        }
    }

    pub fn delete_topic(&self, topic: &str) {
        self.state.lock().topics.retain(|(name, _)| name != topic);
    }

    pub fn delete_subscription(&self, subscription: &str) {
        let mut state = self.state.lock();
        for (_, subs) in state.topics.iter_mut() {
            subs.retain(|s| s != subscription);
        }
    }

    /// Fails the next `times` calls of `op` with `code`.
    pub fn fail_next(&self, op: Operation, code: ProviderCode, times: usize) {
        self.fail_after(op, code, 0, times);
    }

    /// Lets `skip` calls of `op` succeed, then fails the following `times`.
    pub fn fail_after(&self, op: Operation, code: ProviderCode, skip: usize, times: usize) {
        self.state.lock().faults.push(Fault {
            op,
            code,
            skip,
            remaining: times,
        });
    }

    /// Number of calls received for `op`, failed ones included.
    pub fn calls(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    fn enter(&self, op: Operation) -> Result<()> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;

        let fault = state
            .faults
            .iter_mut()
            .find(|f| f.op == op && (f.skip > 0 || f.remaining > 0));
        if let Some(fault) = fault {
            if fault.skip > 0 {
                fault.skip -= 1;
            } else {
                fault.remaining -= 1;
                return Err(Error::pubsub(fault.code, format!("injected {:?} failure", op)));
            }
        }
        Ok(())
    }

    fn page(&self, items: Vec<String>, page_token: Option<String>) -> Result<Page> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| Error::pubsub(ProviderCode::InvalidArgument, "bad page token"))?,
            None => 0,
        };
        let end = (offset + self.page_size).min(items.len());
        let slice = items.get(offset..end).unwrap_or_default().to_vec();
        let next = (end < items.len()).then(|| end.to_string());
        Ok(Page::new(slice, next))
    }
}

#[async_trait]
impl PubSubApi for MemoryPubSub {
    async fn list_topics(&self, project: &str, page_token: Option<String>) -> Result<Page> {
        self.enter(Operation::ListTopics)?;
        let prefix = format!("projects/{}/topics/", project);
        let names = self
            .state
            .lock()
            .topics
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, _)| name.clone())
            .collect();
        self.page(names, page_token)
    }

    async fn list_topic_subscriptions(
        &self,
        topic: &str,
        page_token: Option<String>,
    ) -> Result<Page> {
        self.enter(Operation::ListTopicSubscriptions)?;
        let subs = self
            .state
            .lock()
            .topics
            .iter()
            .find(|(name, _)| name == topic)
            .map(|(_, subs)| subs.clone());
        match subs {
            Some(subs) => self.page(subs, page_token),
            None => Err(Error::pubsub(
                ProviderCode::NotFound,
                format!("Resource not found (resource={})", topic),
            )),
        }
    }
}
