//! In-memory integration tests for task status writes.

use super::helpers::{TrackingHarness, harness};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use tasktrail::config::TaskTrackingConfig;
use tasktrail::task::{
    domain::{Message, TaskFields, TaskQuery, TaskStatus},
    services::{ProcessOutcome, TaskStatusMiddleware},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_updates_keep_one_record_per_message(#[future] harness: TrackingHarness) {
    let harness = harness.await;
    let message = harness.message("default", "send_email");

    let created = harness
        .record(&message, TaskStatus::Enqueued)
        .await
        .expect("enqueue write should succeed");
    harness.clock.advance(TimeDelta::seconds(5));
    let updated = harness
        .record(&message, TaskStatus::Running)
        .await
        .expect("running write should succeed");

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.status(), TaskStatus::Running);
    assert_eq!(updated.created_at(), created.created_at());
    assert_eq!(
        updated.updated_at() - created.updated_at(),
        TimeDelta::seconds(5)
    );
    let count = harness
        .manager
        .count(&TaskQuery::all())
        .await
        .expect("count should succeed");
    assert_eq!(count, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_payload_decodes_to_the_sent_message(#[future] harness: TrackingHarness) {
    let harness = harness.await;
    let message = harness
        .message("emails", "send_email")
        .with_args([json!("ada@example.com")])
        .with_kwarg("subject", json!("Welcome"));

    harness
        .record(&message, TaskStatus::Enqueued)
        .await
        .expect("write should succeed");
    let stored = harness
        .manager
        .find_by_id(message.message_id())
        .await
        .expect("lookup should succeed")
        .expect("record should exist");

    assert_eq!(stored.message().expect("payload should decode"), &message);
    assert_eq!(stored.actor_name(), Some("send_email"));
    assert_eq!(stored.queue_name(), Some("emails"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unset_fields_keep_their_stored_values(#[future] harness: TrackingHarness) {
    let harness = harness.await;
    let message = harness.message("emails", "send_email");
    harness
        .record(&message, TaskStatus::Running)
        .await
        .expect("write should succeed");

    let updated = harness
        .manager
        .create_or_update_from_message(&message, TaskFields::new())
        .await
        .expect("payload-only write should succeed");

    assert_eq!(updated.status(), TaskStatus::Running);
    assert_eq!(updated.actor_name(), Some("send_email"));
    assert_eq!(updated.queue_name(), Some("emails"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn middleware_walks_a_message_through_its_lifecycle() {
    let config = TaskTrackingConfig::default().with_excluded_actors(["heartbeat"]);
    let harness = TrackingHarness::with_config(&config)
        .await
        .expect("manager construction should succeed");
    let TrackingHarness { manager, clock } = harness;
    let middleware = TaskStatusMiddleware::new(Arc::new(manager));
    let tracked = Message::new("default", "send_email", &*clock);
    let excluded = Message::new("default", "heartbeat", &*clock);

    for message in [&tracked, &excluded] {
        middleware
            .after_enqueue(message, None)
            .await
            .expect("enqueue hook should succeed");
        middleware
            .before_process_message(message)
            .await
            .expect("process hook should succeed");
        middleware
            .after_process_message(message, ProcessOutcome::Succeeded)
            .await
            .expect("completion hook should succeed");
    }

    let records = middleware
        .manager()
        .list(&TaskQuery::all())
        .await
        .expect("listing should succeed");
    assert_eq!(records.len(), 1);
    let record = records.first().expect("one record is stored");
    assert_eq!(record.id(), tracked.message_id());
    assert_eq!(record.status(), TaskStatus::Done);
}
