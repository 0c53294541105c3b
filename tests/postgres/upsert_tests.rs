//! `PostgreSQL` integration tests for task record upserts.

use crate::postgres::helpers::{BoxError, PostgresContext, context};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use tasktrail::config::TaskTrackingConfig;
use tasktrail::task::{
    domain::{TaskFields, TaskQuery, TaskStatus},
    ports::{TaskRecordRepository, UpsertCapability},
    services::UpsertStrategy,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detection_selects_native_upsert_on_supported_servers(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };

    let capability = ctx.repository().upsert_capability().await?;
    let manager = ctx
        .manager(ctx.repository(), &TaskTrackingConfig::default())
        .await?;

    assert_eq!(capability, UpsertCapability::NativeUpsert);
    assert_eq!(manager.strategy(), UpsertStrategy::OnConflict);
    Ok(())
}

#[rstest]
#[case(UpsertCapability::NativeUpsert, UpsertStrategy::OnConflict)]
#[case(UpsertCapability::UpdateOrCreate, UpsertStrategy::UpdateOrCreate)]
#[tokio::test(flavor = "multi_thread")]
async fn both_strategies_insert_then_update_one_row(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
    #[case] capability: UpsertCapability,
    #[case] expected_strategy: UpsertStrategy,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let manager = ctx
        .manager(
            ctx.pinned_repository(capability),
            &TaskTrackingConfig::default(),
        )
        .await?;
    assert_eq!(manager.strategy(), expected_strategy);
    let message = ctx
        .message("emails", "send_email")
        .with_args([json!("ada@example.com")]);

    let created = manager
        .create_or_update_from_message(
            &message,
            TaskFields::with_status_only(TaskStatus::Enqueued)
                .with_actor_name("send_email")
                .with_queue_name("emails"),
        )
        .await?;
    ctx.clock.advance(TimeDelta::seconds(30));
    let updated = manager
        .create_or_update_from_message(&message, TaskFields::with_status_only(TaskStatus::Done))
        .await?;

    assert_eq!(created.status(), TaskStatus::Enqueued);
    assert_eq!(updated.id(), message.message_id());
    assert_eq!(updated.status(), TaskStatus::Done);
    assert_eq!(updated.created_at(), created.created_at());
    assert_eq!(
        updated.updated_at() - created.created_at(),
        TimeDelta::seconds(30)
    );
    assert_eq!(updated.actor_name(), Some("send_email"));
    assert_eq!(updated.queue_name(), Some("emails"));
    assert_eq!(updated.message()?, &message);
    assert_eq!(manager.count(&TaskQuery::all()).await?, 1);
    Ok(())
}

#[rstest]
#[case(UpsertCapability::NativeUpsert)]
#[case(UpsertCapability::UpdateOrCreate)]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_deliveries_leave_one_row(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
    #[case] capability: UpsertCapability,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let manager = Arc::new(
        ctx.manager(
            ctx.pinned_repository(capability),
            &TaskTrackingConfig::default().with_upsert_retry_limit(5),
        )
        .await?,
    );
    let delivery = Arc::new(ctx.message("default", "send_email"));

    let handles = (0..8)
        .map(|_| {
            let task_manager = Arc::clone(&manager);
            let message = Arc::clone(&delivery);
            tokio::spawn(async move {
                task_manager
                    .upsert_from_message(&*message, TaskFields::with_status_only(TaskStatus::Running))
                    .await
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.await??;
    }

    assert_eq!(manager.count(&TaskQuery::all()).await?, 1);
    let stored = manager
        .find_by_id(delivery.message_id())
        .await?
        .ok_or("record should exist")?;
    assert_eq!(stored.status(), TaskStatus::Running);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn excluded_actor_is_never_written(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let config = TaskTrackingConfig::default().with_excluded_actors(["heartbeat"]);
    let manager = ctx.manager(ctx.repository(), &config).await?;
    let message = ctx.message("default", "heartbeat");

    let written = manager
        .upsert_from_message(&message, TaskFields::with_status_only(TaskStatus::Done))
        .await?;

    assert!(written.is_none());
    assert_eq!(manager.count(&TaskQuery::all()).await?, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_records_are_not_found(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let manager = ctx
        .manager(ctx.repository(), &TaskTrackingConfig::default())
        .await?;

    let found = manager
        .find_by_id(ctx.message("default", "send_email").message_id())
        .await?;

    assert!(found.is_none());
    Ok(())
}
