use scholaris_core::TenantId;
use scholaris_domain::{RoleKind, RoleScope, SubmissionStatus};

use crate::DashboardService;
use crate::test_support::TestWorld;

#[tokio::test]
async fn counters_reflect_stored_rows() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    world.seed_issue(journal.journal_id).await;
    world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    world
        .seed_submission(journal.journal_id, SubmissionStatus::Submitted)
        .await;
    world
        .seed_submission(journal.journal_id, SubmissionStatus::Published)
        .await;
    let caller = world.super_admin().await;

    let outcome = DashboardService::new(world.envelope(), world.store.clone())
        .dashboard_stats(Some(&caller))
        .await;

    let Some(stats) = outcome.data else {
        panic!("stats should load: {:?}", outcome.error);
    };
    assert_eq!(stats.journals, 1);
    assert_eq!(stats.issues, 1);
    assert_eq!(stats.published_issues, 0);
    assert_eq!(stats.submissions_by_status.get("submitted"), Some(&2));
    assert_eq!(stats.submissions_by_status.get("published"), Some(&1));
    assert!(world.audit_actions().await.is_empty());
}

#[tokio::test]
async fn editors_do_not_see_site_counters() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let caller = world
        .login_as(
            "editor",
            RoleKind::Editor,
            RoleScope::Journal(journal.journal_id),
        )
        .await;

    let outcome = DashboardService::new(world.envelope(), world.store.clone())
        .dashboard_stats(Some(&caller))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Unauthorized"));
}
