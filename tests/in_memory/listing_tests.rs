//! In-memory integration tests for listing and counting task records.

use super::helpers::{TrackingHarness, harness};
use chrono::TimeDelta;
use rstest::rstest;
use tasktrail::task::domain::{TaskId, TaskQuery, TaskRecord, TaskStatus};

/// Records three messages one minute apart and returns their ids, oldest
/// first.
async fn seed(harness: &TrackingHarness) -> Vec<TaskId> {
    let seeds = [
        ("emails", "send_email", TaskStatus::Done),
        ("images", "resize_image", TaskStatus::Failed),
        ("emails", "send_digest", TaskStatus::Done),
    ];
    let mut ids = Vec::new();
    for (queue_name, actor_name, status) in seeds {
        let message = harness.message(queue_name, actor_name);
        harness
            .record(&message, status)
            .await
            .expect("seed write should succeed");
        ids.push(message.message_id());
        harness.clock.advance(TimeDelta::minutes(1));
    }
    ids
}

fn ids_of(records: &[TaskRecord]) -> Vec<TaskId> {
    records.iter().map(|record| record.id()).collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_orders_most_recent_first(#[future] harness: TrackingHarness) {
    let harness = harness.await;
    let ids = seed(&harness).await;

    let records = harness
        .manager
        .list(&TaskQuery::all())
        .await
        .expect("listing should succeed");

    let expected: Vec<_> = ids.into_iter().rev().collect();
    assert_eq!(ids_of(&records), expected);
}

#[rstest]
#[case(TaskQuery::all().with_status(TaskStatus::Done), 2)]
#[case(TaskQuery::all().with_status(TaskStatus::Running), 0)]
#[case(TaskQuery::all().with_queue_name("emails"), 2)]
#[case(TaskQuery::all().with_actor_name("resize_image"), 1)]
#[case(TaskQuery::all().with_queue_name("emails").with_actor_name("send_digest"), 1)]
#[tokio::test(flavor = "multi_thread")]
async fn filters_narrow_listing_and_count(
    #[future] harness: TrackingHarness,
    #[case] query: TaskQuery,
    #[case] expected: u64,
) {
    let harness = harness.await;
    seed(&harness).await;

    let count = harness
        .manager
        .count(&query)
        .await
        .expect("count should succeed");
    let records = harness
        .manager
        .list(&query)
        .await
        .expect("listing should succeed");

    assert_eq!(count, expected);
    assert_eq!(u64::try_from(records.len()).ok(), Some(expected));
    assert!(records.iter().all(|record| query.matches(record)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_window_is_half_open(#[future] harness: TrackingHarness) {
    let harness = harness.await;
    let ids = seed(&harness).await;
    let start = crate::test_helpers::epoch();

    let query = TaskQuery::all().updated_between(
        Some(start + TimeDelta::minutes(1)),
        Some(start + TimeDelta::minutes(2)),
    );
    let records = harness
        .manager
        .list(&query)
        .await
        .expect("listing should succeed");

    assert_eq!(records.len(), 1);
    assert_eq!(ids_of(&records).first(), ids.get(1));
}

#[rstest]
#[case(2, 0, 2)]
#[case(2, 2, 1)]
#[case(5, 3, 0)]
#[tokio::test(flavor = "multi_thread")]
async fn pagination_applies_after_ordering(
    #[future] harness: TrackingHarness,
    #[case] limit: u32,
    #[case] offset: u32,
    #[case] expected_len: usize,
) {
    let harness = harness.await;
    seed(&harness).await;

    let page = harness
        .manager
        .list(&TaskQuery::all().paginate(limit, offset))
        .await
        .expect("listing should succeed");
    let full = harness
        .manager
        .list(&TaskQuery::all())
        .await
        .expect("listing should succeed");
    let expected: Vec<_> = ids_of(&full)
        .into_iter()
        .skip(usize::try_from(offset).expect("offset fits usize"))
        .take(expected_len)
        .collect();

    assert_eq!(ids_of(&page), expected);
    let total = harness
        .manager
        .count(&TaskQuery::all().paginate(limit, offset))
        .await
        .expect("count should succeed");
    assert_eq!(total, 3);
}
