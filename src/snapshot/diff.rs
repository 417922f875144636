//! Diff engine: which subscriptions disappeared between two snapshots.

use std::collections::BTreeSet;

use serde::Serialize;

use super::Snapshot;
use crate::pubsub::SubscriptionId;

/// One group per topic of the previous snapshot, in its key order; each group
/// holds the subscriptions of that topic that are gone from the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Expired(Vec<BTreeSet<SubscriptionId>>);

impl Expired {
    pub fn groups(&self) -> &[BTreeSet<SubscriptionId>] {
        &self.0
    }

    /// No groups at all (the snapshots were identical).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of expired subscriptions across all groups.
    pub fn subscription_count(&self) -> usize {
        self.0.iter().map(BTreeSet::len).sum()
    }

    /// The array-of-arrays form written to the log sink.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<Vec<BTreeSet<SubscriptionId>>> for Expired {
    fn from(groups: Vec<BTreeSet<SubscriptionId>>) -> Self {
        Self(groups)
    }
}

/// Set difference `previous[k] - current[k]` for every topic `k` of
/// `previous`. A topic missing from `current` yields all of its previous
/// subscriptions. Topics only present in `current` are never reported.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Expired {
    let groups = previous
        .iter()
        .map(|(topic, before)| {
            let before: BTreeSet<&SubscriptionId> = before.iter().collect();
            match current.get(topic) {
                Some(after) => {
                    let after: BTreeSet<&SubscriptionId> = after.iter().collect();
                    before.difference(&after).map(|s| (*s).clone()).collect()
                }
                None => before.into_iter().cloned().collect(),
            }
        })
        .collect();
    Expired(groups)
}

/// [`diff`], short-circuited to an empty result for identical snapshots.
pub fn expired(previous: &Snapshot, current: &Snapshot) -> Expired {
    if previous == current {
        return Expired::default();
    }
    diff(previous, current)
}
