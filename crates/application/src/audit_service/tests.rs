use chrono::{Duration, Utc};
use scholaris_core::TenantId;
use scholaris_domain::{AuditAction, RoleKind, RoleScope};

use crate::test_support::TestWorld;
use crate::{ActionErrorKind, AuditService, ListActivityRequest, PurgeActivityRequest};

fn service(world: &TestWorld) -> AuditService {
    AuditService::new(world.envelope(), world.store.clone())
}

#[tokio::test]
async fn purge_deletes_exactly_the_older_records_once() {
    let world = TestWorld::new();
    let now = Utc::now();
    world
        .seed_audit(AuditAction::JournalCreated, now - Duration::days(400))
        .await;
    world
        .seed_audit(AuditAction::JournalUpdated, now - Duration::days(91))
        .await;
    world
        .seed_audit(AuditAction::JournalUpdated, now - Duration::days(89))
        .await;
    world
        .seed_audit(AuditAction::IssueCreated, now - Duration::hours(1))
        .await;
    let caller = world.super_admin().await;
    let service = service(&world);

    let first = service
        .purge_activity(Some(&caller), PurgeActivityRequest { days: 90 })
        .await;
    let second = service
        .purge_activity(Some(&caller), PurgeActivityRequest { days: 90 })
        .await;

    let Some(first) = first.data else {
        panic!("purge should succeed: {:?}", first.error);
    };
    assert_eq!(first.deleted, 2);
    assert!(first.cutoff <= now - Duration::days(90) + Duration::minutes(1));
    assert_eq!(second.data.map(|summary| summary.deleted), Some(0));
    assert_eq!(
        world.audit_actions().await,
        vec![
            AuditAction::JournalUpdated,
            AuditAction::IssueCreated,
            AuditAction::ActivityLogPurged,
            AuditAction::ActivityLogPurged,
        ]
    );
    assert_eq!(
        world.invalidated().await[..2],
        ["/admin/activity".to_owned(), "/admin".to_owned()]
    );
}

#[tokio::test]
async fn purge_window_is_bounded() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    let service = service(&world);

    let none = service
        .purge_activity(Some(&caller), PurgeActivityRequest { days: 0 })
        .await;
    let forever = service
        .purge_activity(Some(&caller), PurgeActivityRequest { days: 3651 })
        .await;

    assert_eq!(none.error_kind, Some(ActionErrorKind::Validation));
    assert_eq!(forever.error_kind, Some(ActionErrorKind::Validation));
    assert!(world.audit_actions().await.is_empty());
}

#[tokio::test]
async fn activity_is_filtered_by_action_newest_first() {
    let world = TestWorld::new();
    let now = Utc::now();
    world
        .seed_audit(AuditAction::JournalCreated, now - Duration::days(2))
        .await;
    world
        .seed_audit(AuditAction::JournalUpdated, now - Duration::days(1))
        .await;
    world.seed_audit(AuditAction::JournalCreated, now).await;
    let caller = world.super_admin().await;

    let outcome = service(&world)
        .list_activity(
            Some(&caller),
            ListActivityRequest {
                action: Some("journal.created".to_owned()),
                ..ListActivityRequest::default()
            },
        )
        .await;

    let Some(records) = outcome.data else {
        panic!("activity should be listed: {:?}", outcome.error);
    };
    assert_eq!(records.len(), 2);
    assert!(records[0].created_at > records[1].created_at);
}

#[tokio::test]
async fn unknown_action_filter_is_a_field_error() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;

    let outcome = service(&world)
        .list_activity(
            Some(&caller),
            ListActivityRequest {
                action: Some("journal.exploded".to_owned()),
                ..ListActivityRequest::default()
            },
        )
        .await;

    assert!(
        outcome
            .details
            .is_some_and(|details| details.get("action").is_some())
    );
}

#[tokio::test]
async fn journal_manager_cannot_purge() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    world
        .seed_audit(AuditAction::JournalCreated, Utc::now() - Duration::days(400))
        .await;
    let caller = world
        .login_as(
            "manager",
            RoleKind::JournalManager,
            RoleScope::Journal(journal.journal_id),
        )
        .await;

    let outcome = service(&world)
        .purge_activity(Some(&caller), PurgeActivityRequest { days: 1 })
        .await;

    assert_eq!(outcome.error.as_deref(), Some("Unauthorized"));
    assert_eq!(world.store.state.lock().await.audit.len(), 1);
}
