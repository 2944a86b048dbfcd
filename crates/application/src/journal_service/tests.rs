use scholaris_core::{JournalId, TenantId};
use scholaris_domain::{AuditAction, RoleKind, RoleScope};

use crate::test_support::TestWorld;
use crate::{
    ActionErrorKind, CreateJournalRequest, JournalService, JournalTarget, ListJournalsRequest,
    SetJournalActiveRequest, UpdateJournalRequest,
};

fn service(world: &TestWorld) -> JournalService {
    JournalService::new(world.envelope(), world.store.clone())
}

fn create_request(tenant_id: TenantId, path: &str) -> CreateJournalRequest {
    CreateJournalRequest {
        tenant_id,
        path: path.to_owned(),
        title: " Journal of Systems ".to_owned(),
        description: None,
        online_issn: Some("2049-3630".to_owned()),
        print_issn: None,
        contact_name: Some("Managing Editor".to_owned()),
        contact_email: Some("Editor@Journals.test".to_owned()),
    }
}

fn update_request(journal_id: JournalId) -> UpdateJournalRequest {
    UpdateJournalRequest {
        journal_id,
        title: None,
        description: None,
        online_issn: None,
        print_issn: None,
        contact_name: None,
        contact_email: None,
    }
}

#[tokio::test]
async fn super_admin_creates_journal_with_sanitized_fields() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;

    let outcome = service(&world)
        .create_journal(Some(&caller), create_request(TenantId::new(), "jsys"))
        .await;

    let Some(journal) = outcome.data else {
        panic!("journal should be created: {:?}", outcome.error);
    };
    assert_eq!(journal.title, "Journal of Systems");
    assert_eq!(journal.contact.email.as_deref(), Some("editor@journals.test"));
    assert!(journal.is_active);
    assert_eq!(world.audit_actions().await, vec![AuditAction::JournalCreated]);
    assert_eq!(
        world.invalidated().await,
        vec!["/admin/journals".to_owned(), "/admin".to_owned()]
    );
}

#[tokio::test]
async fn duplicate_path_conflicts() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    world.seed_journal(TenantId::new(), "jsys").await;

    let outcome = service(&world)
        .create_journal(Some(&caller), create_request(TenantId::new(), "jsys"))
        .await;

    assert_eq!(outcome.error_kind, Some(ActionErrorKind::Conflict));
    assert_eq!(
        outcome.error.as_deref(),
        Some("journal path 'jsys' is already taken")
    );
    assert_eq!(world.writes(), 0);
}

#[tokio::test]
async fn invalid_fields_are_reported_together() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    let mut request = create_request(TenantId::new(), "Bad Path");
    request.online_issn = Some("1234-5678".to_owned());

    let outcome = service(&world)
        .create_journal(Some(&caller), request)
        .await;

    assert_eq!(outcome.error.as_deref(), Some("Validation failed"));
    let details = outcome.details.unwrap_or_default();
    assert!(details.get("path").is_some());
    assert!(details.get("online_issn").is_some());
    assert_eq!(world.writes(), 0);
}

#[tokio::test]
async fn tenant_admin_cannot_create_journals() {
    let world = TestWorld::new();
    let tenant_id = TenantId::new();
    let caller = world
        .login_as("manager", RoleKind::TenantAdmin, RoleScope::Tenant(tenant_id))
        .await;

    let outcome = service(&world)
        .create_journal(Some(&caller), create_request(tenant_id, "jsys"))
        .await;

    assert_eq!(outcome.error_kind, Some(ActionErrorKind::Forbidden));
    assert_eq!(world.writes(), 0);
    assert!(world.audit_actions().await.is_empty());
}

#[tokio::test]
async fn journal_manager_updates_own_journal_and_clears_blank_fields() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    {
        let mut state = world.store.state.lock().await;
        state.journals[0].description = Some("Old".to_owned());
    }
    let caller = world
        .login_as(
            "manager",
            RoleKind::JournalManager,
            RoleScope::Journal(journal.journal_id),
        )
        .await;

    let mut request = update_request(journal.journal_id);
    request.title = Some("Biology Letters".to_owned());
    request.description = Some("   ".to_owned());
    let outcome = service(&world)
        .update_journal(Some(&caller), request)
        .await;

    let Some(updated) = outcome.data else {
        panic!("update should succeed: {:?}", outcome.error);
    };
    assert_eq!(updated.title, "Biology Letters");
    assert_eq!(updated.description, None);
    assert_eq!(world.audit_actions().await, vec![AuditAction::JournalUpdated]);
    assert!(world.invalidated().await.contains(&"/journals/bio".to_owned()));
}

#[tokio::test]
async fn journal_manager_cannot_update_other_journal() {
    let world = TestWorld::new();
    let own = world.seed_journal(TenantId::new(), "own").await;
    let other = world.seed_journal(TenantId::new(), "other").await;
    let caller = world
        .login_as(
            "manager",
            RoleKind::JournalManager,
            RoleScope::Journal(own.journal_id),
        )
        .await;

    let outcome = service(&world)
        .update_journal(Some(&caller), update_request(other.journal_id))
        .await;

    assert_eq!(outcome.error.as_deref(), Some("Unauthorized"));
    assert_eq!(world.writes(), 0);
}

#[tokio::test]
async fn update_of_missing_journal_is_not_found_for_super_admin() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    let journal_id = JournalId::new();

    let outcome = service(&world)
        .update_journal(Some(&caller), update_request(journal_id))
        .await;

    assert_eq!(outcome.error_kind, Some(ActionErrorKind::NotFound));
    assert_eq!(
        outcome.error,
        Some(format!("journal '{journal_id}' was not found"))
    );
}

#[tokio::test]
async fn deactivation_is_audited_once() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let caller = world.super_admin().await;
    let service = service(&world);
    let request = SetJournalActiveRequest {
        journal_id: journal.journal_id,
        is_active: false,
    };

    let first = service.set_journal_active(Some(&caller), request).await;
    let second = service.set_journal_active(Some(&caller), request).await;

    assert!(first.success && second.success);
    assert_eq!(first.data.map(|journal| journal.is_active), Some(false));
    assert_eq!(
        world.audit_actions().await,
        vec![AuditAction::JournalDeactivated]
    );
}

#[tokio::test]
async fn journal_with_issues_cannot_be_deleted() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    world.seed_issue(journal.journal_id).await;
    world.seed_issue(journal.journal_id).await;
    let caller = world.super_admin().await;

    let outcome = service(&world)
        .delete_journal(
            Some(&caller),
            JournalTarget {
                journal_id: journal.journal_id,
            },
        )
        .await;

    assert_eq!(
        outcome.error.as_deref(),
        Some("cannot delete journal 'bio': it still has 2 issue(s)")
    );
    assert_eq!(world.writes(), 0);
}

#[tokio::test]
async fn empty_journal_is_deleted() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let caller = world.super_admin().await;

    let outcome = service(&world)
        .delete_journal(
            Some(&caller),
            JournalTarget {
                journal_id: journal.journal_id,
            },
        )
        .await;

    assert_eq!(outcome.data, Some(journal.journal_id));
    assert!(world.store.state.lock().await.journals.is_empty());
    assert_eq!(world.audit_actions().await, vec![AuditAction::JournalDeleted]);
}

#[tokio::test]
async fn listing_hides_inactive_journals_by_default() {
    let world = TestWorld::new();
    let tenant_id = TenantId::new();
    world.seed_journal(tenant_id, "live").await;
    world.seed_journal(tenant_id, "retired").await;
    world.store.state.lock().await.journals[1].is_active = false;
    let caller = world.super_admin().await;
    let service = service(&world);

    let active = service
        .list_journals(Some(&caller), ListJournalsRequest::default())
        .await;
    let all = service
        .list_journals(
            Some(&caller),
            ListJournalsRequest {
                include_inactive: true,
                ..ListJournalsRequest::default()
            },
        )
        .await;

    assert_eq!(active.data.map(|journals| journals.len()), Some(1));
    assert_eq!(all.data.map(|journals| journals.len()), Some(2));
    assert!(world.audit_actions().await.is_empty());
}
