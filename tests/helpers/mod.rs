#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sub_expire_detect::config::DetectorConfig;
use sub_expire_detect::detector::Detector;
use sub_expire_detect::providers::{MemoryProviders, Providers};
use sub_expire_detect::pubsub::{self, MemoryPubSub, RetryPolicy};
use sub_expire_detect::report::MemoryReporter;
use sub_expire_detect::snapshot::Snapshot;

pub const PROJECT: &str = "demo-project";
pub const BUCKET: &str = "demo-bucket";

pub fn topic(name: &str) -> String {
    pubsub::topic_name(PROJECT, name)
}

pub fn sub(name: &str) -> String {
    pubsub::subscription_name(PROJECT, name)
}

/// Snapshot literal, kept verbatim (empty topics included).
pub fn snap(entries: Vec<(&str, Vec<&str>)>) -> Snapshot {
    entries.into_iter().collect()
}

pub fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ========================================
// DETECTOR HARNESS
// ========================================

pub struct Harness {
    pub pubsub: Arc<MemoryPubSub>,
    pub providers: Arc<MemoryProviders>,
    pub reporter: Arc<MemoryReporter>,
    pub detector: Arc<Detector>,
}

impl Harness {
    /// Writes `previous` as if an earlier run had saved it.
    pub async fn seed_previous(&self, previous: &Snapshot) {
        self.providers
            .snapshot_store(BUCKET)
            .unwrap()
            .save(previous)
            .await
            .unwrap();
    }

    /// Snapshot currently persisted in the bucket.
    pub async fn stored(&self) -> Snapshot {
        self.providers
            .snapshot_store(BUCKET)
            .unwrap()
            .load()
            .await
            .unwrap()
    }
}

pub fn setup_detector(page_size: usize) -> Harness {
    setup_detector_with(DetectorConfig::new(PROJECT, BUCKET), page_size)
}

pub fn setup_detector_with(config: DetectorConfig, page_size: usize) -> Harness {
    let pubsub = Arc::new(MemoryPubSub::new(page_size));
    let providers = Arc::new(MemoryProviders::new(pubsub.clone()));
    let reporter = Arc::new(MemoryReporter::new());
    let detector = Arc::new(Detector::new(
        config,
        RetryPolicy::immediate(3),
        providers.clone(),
        reporter.clone(),
    ));
    Harness {
        pubsub,
        providers,
        reporter,
        detector,
    }
}

// ========================================
// BENCHMARK
// ========================================

pub struct Benchmark {
    pub name: String,
    pub start: Instant,
    pub count: usize,
    pub samples: Vec<Duration>,
}

impl Benchmark {
    pub fn start(name: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
            count,
            samples: Vec::with_capacity(count),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.samples.push(duration);
    }

    pub fn stop(mut self) {
        let total_duration = self.start.elapsed();
        let secs = total_duration.as_secs_f64();
        let ops_sec = self.count as f64 / secs;

        self.samples.sort();
        let len = self.samples.len();

        let p50 = self.samples.get(len * 50 / 100).unwrap_or(&Duration::ZERO).as_micros();
        let p99 = self.samples.get(len * 99 / 100).unwrap_or(&Duration::ZERO).as_micros();
        let max = self.samples.last().unwrap_or(&Duration::ZERO).as_micros();

        println!("\n{}", self.name);
        println!(" Throughput:  {:.0} ops/sec", ops_sec);
        println!(" Total Time:  {:.2?}", total_duration);
        println!(" Latency (µs): p50: {} | p99: {} | MAX: {}", p50, p99, max);
        println!(" Count:       {}\n", self.count);
    }
}
