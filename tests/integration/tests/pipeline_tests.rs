//! Retrieval pipeline scenarios
//!
//! Run against in-memory repositories and a scripted platform; no external
//! services needed.
//!
//! Run with: cargo test -p integration-tests --test pipeline_tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use integration_tests::*;
use tokio_util::sync::CancellationToken;
use vault_core::{ArchiveFileRef, ChatId, MessageId, SubscriptionStatus};
use vault_service::{
    ApprovalService, RetrievalOutcome, RetrievalPipeline, ServiceContext, ServiceError,
    SubscriptionVerifier, TokenService,
};

fn files(ids: &[MessageId]) -> Vec<ArchiveFileRef> {
    ids.iter().map(|&id| ArchiveFileRef::new(ARCHIVE, id)).collect()
}

async fn issue(ctx: &ServiceContext, ids: &[MessageId]) -> String {
    TokenService::new(ctx)
        .create(files(ids), None, None)
        .await
        .unwrap()
        .token
}

async fn open(ctx: &ServiceContext, user: ChatId, token: &str) -> RetrievalOutcome {
    RetrievalPipeline::new(ctx)
        .run(user, token, &CancellationToken::new())
        .await
        .unwrap()
}

fn missing_ids(outcome: &RetrievalOutcome) -> Vec<ChatId> {
    match outcome {
        RetrievalOutcome::Denied { missing } => missing.iter().map(|m| m.channel_id).collect(),
        other => panic!("expected denial, got {other:?}"),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_member_of_all_channels_receives_file() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let ctx = test_context(platform.clone(), &config).unwrap();
    let token = issue(&ctx, &[11]).await;

    let outcome = open(&ctx, U1, &token).await;

    let summary = outcome.summary().expect("delivery summary");
    assert!(outcome.is_delivered());
    assert_eq!((summary.delivered, summary.requested), (1, 1));
    assert!(summary.delete_at.is_some());
    assert_eq!(platform.copied_files(), vec![11]);
    assert!(platform.copies()[0].2, "copies are content-protected by default");

    assert_eq!(ctx.delivery_repo().count().await.unwrap(), 1);
    assert_eq!(ctx.scheduler().pending(), 1);
    let user = ctx.user_repo().find_by_id(U1).await.unwrap().unwrap();
    assert_eq!(user.files_received, 1);
}

#[tokio::test]
async fn test_missing_one_channel_lists_exactly_that_channel() {
    let platform = Arc::new(FakePlatform::new());
    platform.join(C1, U2);
    platform.join(C3, U2);
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let ctx = test_context(platform.clone(), &config).unwrap();
    let token = issue(&ctx, &[11]).await;

    let outcome = open(&ctx, U2, &token).await;

    assert_eq!(missing_ids(&outcome), vec![C2]);
    assert!(platform.copies().is_empty());
    assert_eq!(ctx.delivery_repo().count().await.unwrap(), 0);

    let prompt = platform.sent_to(U2).pop().unwrap();
    assert!(prompt.contains("https://t.me/second_channel"));
    assert!(!prompt.contains("https://t.me/first_channel"));
    assert!(prompt.contains(&format!("https://t.me/VaultTestBot?start={token}")));
}

#[tokio::test]
async fn test_approval_lets_retry_succeed_without_live_query() {
    let platform = Arc::new(FakePlatform::new());
    platform.join(C1, U3);
    platform.join(C2, U3);
    let config = test_config(&[]).unwrap();
    let ctx = test_context(platform.clone(), &config).unwrap();
    let token = issue(&ctx, &[31, 32]).await;

    let first = open(&ctx, U3, &token).await;
    assert_eq!(missing_ids(&first), vec![C3]);
    match &first {
        RetrievalOutcome::Denied { missing } => {
            assert_eq!(missing[0].status, SubscriptionStatus::NotMember);
        }
        _ => unreachable!(),
    }

    let approvals = ApprovalService::new(&ctx);
    approvals.on_join_request(U3, C3, Utc::now()).await.unwrap();
    approvals.on_approved(U3, C3, Utc::now()).await.unwrap();

    let checks_before_retry = platform.membership_checks();
    let retry = open(&ctx, U3, &token).await;

    assert!(retry.is_delivered());
    assert_eq!(platform.membership_checks(), checks_before_retry);
    assert_eq!(platform.copied_files(), vec![31, 32]);
}

#[tokio::test]
async fn test_permanent_failure_delivers_the_rest() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    platform.break_file(22);
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let ctx = test_context(platform.clone(), &config).unwrap();
    let token = issue(&ctx, &[21, 22, 23]).await;

    let outcome = open(&ctx, U1, &token).await;

    let summary = outcome.summary().unwrap();
    assert!(outcome.is_delivered());
    assert_eq!((summary.delivered, summary.requested), (2, 3));
    assert_eq!(summary.failed, files(&[22]));
    assert_eq!(summary.message_ids.len(), 2);
    assert_eq!(platform.copied_files(), vec![21, 23]);

    let pending = ctx.delivery_repo().list_pending().await.unwrap();
    let mut scheduled: Vec<MessageId> = pending.iter().map(|r| r.message_id).collect();
    scheduled.sort_unstable();
    let mut delivered = summary.message_ids.clone();
    delivered.sort_unstable();
    assert_eq!(scheduled, delivered);

    assert!(platform
        .sent_to(U1)
        .iter()
        .any(|text| text.contains("Sent 2 out of 3 files.")));
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn test_new_user_is_missing_every_channel_in_order() {
    let platform = Arc::new(FakePlatform::new());
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();

    let decision = SubscriptionVerifier::new(&ctx).verify(U2).await.unwrap();

    assert_eq!(decision.missing_ids(), vec![C1, C2, C3]);
}

#[tokio::test]
async fn test_pending_then_declined_request() {
    let platform = Arc::new(FakePlatform::new());
    platform.join(C1, U3);
    platform.join(C2, U3);
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();
    let approvals = ApprovalService::new(&ctx);
    let token = issue(&ctx, &[1]).await;

    approvals.on_join_request(U3, C3, Utc::now()).await.unwrap();
    match open(&ctx, U3, &token).await {
        RetrievalOutcome::Denied { missing } => {
            assert_eq!(missing[0].status, SubscriptionStatus::Pending);
        }
        other => panic!("expected denial, got {other:?}"),
    }

    approvals.on_declined(U3, C3, Utc::now()).await.unwrap();
    match open(&ctx, U3, &token).await {
        RetrievalOutcome::Denied { missing } => {
            assert_eq!(missing[0].status, SubscriptionStatus::NotMember);
        }
        other => panic!("expected denial, got {other:?}"),
    }
    assert!(platform.copies().is_empty());
}

#[tokio::test]
async fn test_platform_outage_is_reported_not_dropped() {
    let platform = Arc::new(FakePlatform::new());
    platform.fail_membership(vault_core::PlatformError::Unavailable("down".into()));
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();
    let token = issue(&ctx, &[1]).await;

    let result = RetrievalPipeline::new(&ctx)
        .run(U1, &token, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::PlatformUnavailable(_))));
    // Bounded retry on the first channel only
    assert_eq!(platform.membership_checks(), 3);
    assert!(platform.copies().is_empty());
}

// ============================================================================
// Tokens and delivery
// ============================================================================

#[tokio::test]
async fn test_files_arrive_in_token_order() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();
    let token = issue(&ctx, &[3, 1, 2]).await;

    assert!(open(&ctx, U1, &token).await.is_delivered());
    assert_eq!(platform.copied_files(), vec![3, 1, 2]);
}

#[tokio::test]
async fn test_transient_copy_failures_are_retried() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    platform.flaky_copies(2);
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();
    let token = issue(&ctx, &[7, 8]).await;

    let outcome = open(&ctx, U1, &token).await;

    assert_eq!(outcome.summary().unwrap().delivered, 2);
    assert_eq!(platform.copied_files(), vec![7, 8]);
}

#[tokio::test]
async fn test_every_file_failing_reports_delivery_failure() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    platform.break_file(1);
    platform.break_file(2);
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let ctx = test_context(platform.clone(), &config).unwrap();
    let token = issue(&ctx, &[1, 2]).await;

    let outcome = open(&ctx, U1, &token).await;

    assert!(matches!(outcome, RetrievalOutcome::DeliveryFailed { .. }));
    assert_eq!(outcome.summary().unwrap().delivered, 0);
    assert_eq!(ctx.delivery_repo().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let platform = Arc::new(FakePlatform::new());
    let ctx = test_context(platform, &test_config(&[]).unwrap()).unwrap();
    let service = TokenService::new(&ctx);
    let token = issue(&ctx, &[5, 6]).await;

    for _ in 0..5 {
        assert_eq!(service.resolve(&token).await.unwrap(), files(&[5, 6]));
    }
}

#[tokio::test]
async fn test_same_link_opened_twice_delivers_twice() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();
    let token = issue(&ctx, &[9]).await;

    assert!(open(&ctx, U1, &token).await.is_delivered());
    assert!(open(&ctx, U1, &token).await.is_delivered());
    assert_eq!(platform.copied_files(), vec![9, 9]);
}

#[tokio::test]
async fn test_expired_link_after_earlier_success() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();
    let token = TokenService::new(&ctx)
        .create(files(&[4]), Some(Duration::from_millis(300)), None)
        .await
        .unwrap()
        .token;

    assert!(open(&ctx, U1, &token).await.is_delivered());
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(open(&ctx, U1, &token).await, RetrievalOutcome::ExpiredLink);
    assert_eq!(open(&ctx, U1, &token).await, RetrievalOutcome::ExpiredLink);
    assert_eq!(platform.copied_files(), vec![4]);
}

#[tokio::test]
async fn test_unknown_token_is_invalid_link() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();

    let outcome = open(&ctx, U1, "ZmFrZS10b2tlbi10aGF0LWRvZXMtbm90LWV4aXN0").await;

    assert_eq!(outcome, RetrievalOutcome::InvalidLink);
    assert_eq!(platform.sent_to(U1).len(), 1);
}

#[tokio::test]
async fn test_cancelled_retrieval_schedules_nothing() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    platform.slow_copies(Duration::from_millis(200));
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let ctx = Arc::new(test_context(platform.clone(), &config).unwrap());
    let token = issue(&ctx, &[1, 2, 3]).await;

    let cancel = CancellationToken::new();
    let run = {
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { RetrievalPipeline::new(&ctx).run(U1, &token, &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = run.await.unwrap();
    assert!(matches!(result, Err(ServiceError::Cancelled)));
    assert_eq!(ctx.delivery_repo().count().await.unwrap(), 0);
    assert_eq!(ctx.scheduler().pending(), 0);
    // The copy in flight completes, nothing after it starts
    assert_eq!(platform.copied_files(), vec![1]);
}

#[tokio::test]
async fn test_concurrent_retrievals_are_independent() {
    let platform = Arc::new(FakePlatform::new());
    let users: Vec<ChatId> = (1..=8).map(|n| ChatId::new(1_000 + n)).collect();
    for &user in &users {
        platform.join_all(user);
    }
    let ctx = Arc::new(test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap());
    let token = issue(&ctx, &[1, 2]).await;

    let tasks: Vec<_> = users
        .iter()
        .map(|&user| {
            let ctx = ctx.clone();
            let token = token.clone();
            tokio::spawn(async move {
                RetrievalPipeline::new(&ctx)
                    .run(user, &token, &CancellationToken::new())
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().unwrap().is_delivered());
    }
    assert_eq!(platform.copied_files().len(), 16);
    assert_eq!(ctx.user_repo().count().await.unwrap(), 8);
}

// ============================================================================
// Deletion scheduling
// ============================================================================

#[tokio::test]
async fn test_copies_deleted_after_delay() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let config = test_config(&[
        ("AUTO_DELETE_TIME", "1"),
        ("AUTO_DEL_SUCCESS_MSG", "Your files were removed."),
    ])
    .unwrap();
    let ctx = test_context(platform.clone(), &config).unwrap();
    let shutdown = CancellationToken::new();
    let task = ctx.scheduler().clone().start(shutdown.clone()).unwrap();
    let token = issue(&ctx, &[1, 2]).await;

    let started = Instant::now();
    let outcome = open(&ctx, U1, &token).await;
    let delivered = outcome.summary().unwrap().message_ids.clone();
    assert!(platform.deleted().is_empty());

    // Delay plus one tick, with slack for a loaded machine
    assert!(wait_until(Duration::from_secs(3), || platform.deleted().len() == 2).await);
    assert!(started.elapsed() >= Duration::from_millis(990));

    let mut deleted: Vec<MessageId> = platform.deleted().iter().map(|(_, id)| *id).collect();
    deleted.sort_unstable();
    assert_eq!(deleted, delivered);
    assert!(wait_until(Duration::from_secs(1), || {
        platform.sent_to(U1).iter().any(|t| t == "Your files were removed.")
    })
    .await);
    assert!(wait_until(Duration::from_secs(1), || ctx.scheduler().pending() == 0).await);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_restored_overdue_deletions_fire_immediately() {
    let platform = Arc::new(FakePlatform::new());
    let ctx = test_context(platform.clone(), &test_config(&[]).unwrap()).unwrap();

    let now = Utc::now();
    for message_id in [40, 41] {
        let record = vault_core::DeliveryRecord::new(
            U1,
            message_id,
            now - chrono::Duration::minutes(20),
            chrono::Duration::minutes(10),
        );
        ctx.delivery_repo().insert(&record).await.unwrap();
    }

    assert_eq!(ctx.scheduler().restore().await.unwrap(), 2);
    let fired = ctx.scheduler().run_due(Utc::now()).await;

    assert_eq!(fired, 2);
    assert_eq!(platform.deleted().len(), 2);
    assert_eq!(ctx.delivery_repo().count().await.unwrap(), 0);
}
