//! Where the expired-subscription result of a run goes.
//!
//! Constructed once at start-up and handed to the detector, instead of the
//! detector writing to a process-wide logger directly.

use parking_lot::Mutex;

use crate::error::Result;
use crate::snapshot::Expired;

/// Label attached to the result record, used by downstream log filters.
pub const PAYLOAD_DESC: &str = "expired subscriptions";

pub trait Reporter: Send + Sync {
    fn expired(&self, expired: &Expired) -> Result<()>;
}

/// Emits the result as one info record tagged with [`PAYLOAD_DESC`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn expired(&self, expired: &Expired) -> Result<()> {
        let payload = expired.to_json()?;
        tracing::info!(
            payload_desc = PAYLOAD_DESC,
            expired_count = expired.subscription_count(),
            "{}",
            payload
        );
        Ok(())
    }
}

/// Keeps every reported result in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Expired>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Expired> {
        self.reports.lock().clone()
    }

    pub fn last(&self) -> Option<Expired> {
        self.reports.lock().last().cloned()
    }
}

impl Reporter for MemoryReporter {
    fn expired(&self, expired: &Expired) -> Result<()> {
        self.reports.lock().push(expired.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io;
    use std::sync::Arc;

    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_reporter_emits_one_tagged_json_record() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        let expired = Expired::from(vec![
            BTreeSet::from(["S2".to_string()]),
            BTreeSet::new(),
        ]);
        tracing::subscriber::with_default(subscriber, || LogReporter.expired(&expired).unwrap());

        let output = String::from_utf8(capture.0.lock().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);

        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["fields"]["message"], r#"[["S2"],[]]"#);
        assert_eq!(record["fields"]["payload_desc"], PAYLOAD_DESC);
        assert_eq!(record["fields"]["expired_count"], 1);
    }
}
