//! One detection run: collect, load, diff, save, report.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::DetectorConfig;
use crate::error::Result;
use crate::providers::Providers;
use crate::pubsub::RetryPolicy;
use crate::report::Reporter;
use crate::snapshot::{self, Expired, Snapshot};

/// What a completed run observed.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub current: Snapshot,
    pub previous: Snapshot,
    pub expired: Expired,
}

pub struct Detector {
    config: DetectorConfig,
    retry: RetryPolicy,
    providers: Arc<dyn Providers>,
    reporter: Arc<dyn Reporter>,
}

impl Detector {
    pub fn new(
        config: DetectorConfig,
        retry: RetryPolicy,
        providers: Arc<dyn Providers>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            retry,
            providers,
            reporter,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Runs one invocation. The snapshot is saved only after the diff is
    /// computed, so a failure anywhere leaves the previous snapshot in place.
    pub async fn run(&self) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "invocation",
            run_id = %run_id,
            project = %self.config.project_id,
            bucket = %self.config.bucket,
        );
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<RunOutcome> {
        // 1. Configuration
        self.config.check()?;
        tracing::debug!(project_id = %self.config.project_id, "project_id");
        tracing::debug!(bucket_name = %self.config.bucket, "bucket_name");

        // 2. Current state
        let pubsub = self.providers.pubsub().await?;
        let current = snapshot::collect(pubsub.as_ref(), &self.config.project_id, &self.retry).await?;
        tracing::debug!(current = ?current, "current");

        // 3. Previous state
        let store = self.providers.snapshot_store(&self.config.bucket)?;
        let previous = store.load().await?;
        tracing::debug!(previous = ?previous, "previous");

        // 4. Diff
        let expired = snapshot::expired(&previous, &current);

        // 5. Persist, unconditionally
        store.save(&current).await?;

        // 6. Report
        self.reporter.expired(&expired)?;

        tracing::info!(
            topics = current.len(),
            subscriptions = current.subscription_count(),
            expired = expired.subscription_count(),
            "Run completed"
        );

        Ok(RunOutcome {
            run_id,
            current,
            previous,
            expired,
        })
    }
}
