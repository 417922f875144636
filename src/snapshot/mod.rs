//! Topic → subscriptions snapshots and everything that produces, compares and
//! persists them.

pub mod collector;
pub mod diff;
pub mod store;

use hashlink::linked_hash_map;
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::pubsub::{SubscriptionId, TopicId};

pub use collector::collect;
pub use diff::{diff, expired, Expired};
pub use store::{SnapshotStore, SNAPSHOT_OBJECT};

/// Subscriptions observed under each topic at one point in time.
///
/// Serialized as a JSON object of topic name → array of subscription names.
/// Topics keep the order they were recorded in, or the order of the keys in
/// the stored object when read back. The collector never records a topic
/// without subscriptions; snapshots read back from storage are taken as they
/// are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(LinkedHashMap<TopicId, Vec<SubscriptionId>>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `topic` with its subscriptions. Empty lists are not recorded.
    pub fn record(&mut self, topic: TopicId, subscriptions: Vec<SubscriptionId>) {
        if subscriptions.is_empty() {
            return;
        }
        self.0.insert(topic, subscriptions);
    }

    pub fn get(&self, topic: &str) -> Option<&[SubscriptionId]> {
        self.0.get(topic).map(Vec::as_slice)
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        self.0.contains_key(topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicId> {
        self.0.keys()
    }

    pub fn iter(&self) -> linked_hash_map::Iter<'_, TopicId, Vec<SubscriptionId>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total subscriptions across all topics.
    pub fn subscription_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Same topics with the same subscription lists. Topic order is ignored.
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(topic, subs)| other.0.get(topic).is_some_and(|o| o == subs))
    }
}

impl Eq for Snapshot {}

impl<T, S> FromIterator<(T, Vec<S>)> for Snapshot
where
    T: Into<TopicId>,
    S: Into<SubscriptionId>,
{
    /// Builds a snapshot verbatim, empty topics included.
    fn from_iter<I: IntoIterator<Item = (T, Vec<S>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(topic, subs)| (topic.into(), subs.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a TopicId, &'a Vec<SubscriptionId>);
    type IntoIter = linked_hash_map::Iter<'a, TopicId, Vec<SubscriptionId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
