mod helpers;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use helpers::{set, setup_detector, setup_detector_with, snap, sub, topic, BUCKET, PROJECT};
use sub_expire_detect::config::{DetectorConfig, PROJECT_PLACEHOLDER};
use sub_expire_detect::error::{Error, ProviderCode};
use sub_expire_detect::pubsub::Operation;
use sub_expire_detect::snapshot::{Snapshot, SNAPSHOT_OBJECT};

// =========================================================================================
// 1. END-TO-END SCENARIOS
// =========================================================================================

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_removed_subscription() {
        let h = setup_detector(10);
        h.seed_previous(&snap(vec![(&topic("T1"), vec![&sub("S1"), &sub("S2")])])).await;
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);

        let outcome = h.detector.run().await.unwrap();

        assert_eq!(outcome.expired.groups(), &[set(&[&sub("S2")])]);
        assert_eq!(h.reporter.last().unwrap(), outcome.expired);
        assert_eq!(h.stored().await, snap(vec![(&topic("T1"), vec![&sub("S1")])]));
    }

    #[tokio::test]
    async fn test_removed_topic() {
        let h = setup_detector(10);
        h.seed_previous(&snap(vec![(&topic("T1"), vec![&sub("S1")])])).await;

        let outcome = h.detector.run().await.unwrap();

        assert_eq!(outcome.expired.groups(), &[set(&[&sub("S1")])]);
        assert_eq!(h.stored().await, Snapshot::new());
    }

    #[tokio::test]
    async fn test_new_topic_is_not_reported() {
        let h = setup_detector(10);
        h.seed_previous(&Snapshot::new()).await;
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);

        let outcome = h.detector.run().await.unwrap();

        assert!(outcome.expired.is_empty());
        assert_eq!(h.reporter.last().unwrap().to_json().unwrap(), "[]");
        assert_eq!(h.stored().await, snap(vec![(&topic("T1"), vec![&sub("S1")])]));
    }

    #[tokio::test]
    async fn test_unchanged_state_reports_nothing_and_keeps_snapshot() {
        let h = setup_detector(10);
        let state = snap(vec![(&topic("T1"), vec![&sub("S1")])]);
        h.seed_previous(&state).await;
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);

        let outcome = h.detector.run().await.unwrap();

        assert!(outcome.expired.is_empty());
        assert_eq!(h.reporter.reports().len(), 1);
        assert_eq!(h.stored().await, state);
    }
}

// =========================================================================================
// 2. RUN LIFECYCLE
// =========================================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_first_run_creates_snapshot() {
        let h = setup_detector(10);
        h.pubsub.add_topic(&topic("orders"), [sub("billing"), sub("audit")]);
        h.pubsub.add_topic(&topic("idle"), Vec::<String>::new());

        let outcome = h.detector.run().await.unwrap();

        assert!(outcome.previous.is_empty());
        assert!(outcome.expired.is_empty());
        let stored = h.stored().await;
        assert_eq!(stored, outcome.current);
        assert!(!stored.contains_topic(&topic("idle")));
    }

    #[tokio::test]
    async fn test_consecutive_runs_report_disappearance_once() {
        let h = setup_detector(2);
        h.pubsub.add_topic(&topic("orders"), [sub("billing"), sub("audit"), sub("etl")]);
        h.pubsub.add_topic(&topic("events"), [sub("sink")]);

        h.detector.run().await.unwrap();

        h.pubsub.delete_subscription(&sub("audit"));
        h.pubsub.delete_topic(&topic("events"));
        let second = h.detector.run().await.unwrap();

        // Previous keys in listing order: orders, events.
        assert_eq!(
            second.expired.groups(),
            &[set(&[&sub("audit")]), set(&[&sub("sink")])]
        );

        let third = h.detector.run().await.unwrap();
        assert!(third.expired.is_empty());
        assert_eq!(h.reporter.reports().len(), 3);
    }

    #[tokio::test]
    async fn test_each_run_has_its_own_id() {
        let h = setup_detector(10);
        let a = h.detector.run().await.unwrap();
        let b = h.detector.run().await.unwrap();
        assert_ne!(a.run_id, b.run_id);
    }

    #[tokio::test]
    async fn test_transient_provider_errors_do_not_fail_the_run() {
        let h = setup_detector(10);
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);
        h.pubsub.fail_next(Operation::ListTopics, ProviderCode::RateLimited, 2);

        let outcome = h.detector.run().await.unwrap();
        assert_eq!(outcome.current.len(), 1);
    }
}

// =========================================================================================
// 3. FAILURES
// =========================================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_collection_failure_keeps_previous_snapshot() {
        let h = setup_detector(10);
        let previous = snap(vec![(&topic("T1"), vec![&sub("S1")])]);
        h.seed_previous(&previous).await;
        h.pubsub.fail_next(Operation::ListTopics, ProviderCode::PermissionDenied, 1);

        let err = h.detector.run().await.unwrap_err();

        assert!(matches!(err, Error::PubSub { code: ProviderCode::PermissionDenied, .. }));
        assert_eq!(h.stored().await, previous);
        assert!(h.reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failure_reproduces_the_same_diff() {
        let h = setup_detector(10);
        h.seed_previous(&snap(vec![(&topic("T1"), vec![&sub("S1"), &sub("S2")])])).await;
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);
        h.pubsub.fail_after(Operation::ListTopicSubscriptions, ProviderCode::InvalidArgument, 0, 1);

        assert!(h.detector.run().await.is_err());
        let outcome = h.detector.run().await.unwrap();

        assert_eq!(outcome.expired.groups(), &[set(&[&sub("S2")])]);
    }

    #[tokio::test]
    async fn test_corrupt_previous_snapshot_aborts_before_saving() {
        let h = setup_detector(10);
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);
        let bucket = h.providers.bucket(BUCKET);
        bucket
            .put(&ObjectPath::from(SNAPSHOT_OBJECT), PutPayload::from(Bytes::from("{oops")))
            .await
            .unwrap();

        let err = h.detector.run().await.unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert!(h.reporter.reports().is_empty());
    }

    #[tokio::test]
    async fn test_strict_mode_fails_fast_on_missing_configuration() {
        let mut config = DetectorConfig::new(PROJECT_PLACEHOLDER, BUCKET);
        config.missing = vec!["PROJECT_ID"];
        config.strict = true;
        let h = setup_detector_with(config, 10);

        let err = h.detector.run().await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert_eq!(h.pubsub.calls(Operation::ListTopics), 0);
    }

    #[tokio::test]
    async fn test_permissive_mode_runs_with_placeholder() {
        let mut config = DetectorConfig::new(PROJECT_PLACEHOLDER, BUCKET);
        config.missing = vec!["PROJECT_ID"];
        let h = setup_detector_with(config, 10);
        h.pubsub.add_topic(&topic("T1"), [sub("S1")]);

        let outcome = h.detector.run().await.unwrap();

        // The placeholder names no real project, so nothing is found.
        assert_eq!(h.pubsub.calls(Operation::ListTopics), 1);
        assert!(outcome.current.is_empty());
        assert_eq!(h.detector.config().project_id, PROJECT_PLACEHOLDER);
        assert_ne!(PROJECT, PROJECT_PLACEHOLDER);
    }
}
