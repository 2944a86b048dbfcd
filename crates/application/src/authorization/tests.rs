use std::sync::atomic::Ordering;

use scholaris_core::{JournalId, TenantId};
use scholaris_domain::{RoleKind, RoleScope};

use crate::test_support::{TestWorld, credential};
use crate::{
    AccessRequirement, AuthorizationDecision, AuthorizationGuard, EDITORIAL_ROLES,
    ISSUE_MANAGER_ROLES, JOURNAL_ADMIN_ROLES,
};

fn guard(world: &TestWorld) -> AuthorizationGuard {
    AuthorizationGuard::new(world.store.clone(), world.store.clone())
}

#[tokio::test]
async fn missing_credential_is_unauthorized_without_lookup() {
    let world = TestWorld::new();
    let decision = guard(&world)
        .authorize(None, &AccessRequirement::super_admin())
        .await;

    assert_eq!(decision, AuthorizationDecision::Unauthorized);
    assert_eq!(world.actor_lookups(), 0);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let world = TestWorld::new();
    let decision = guard(&world)
        .authorize(
            Some(&credential("forged")),
            &AccessRequirement::super_admin(),
        )
        .await;

    assert_eq!(decision, AuthorizationDecision::Unauthorized);
}

#[tokio::test]
async fn deactivated_account_is_unauthorized() {
    let world = TestWorld::new();
    let (user_id, caller) = world.add_user("dormant").await;
    world
        .grant(user_id, RoleKind::SuperAdmin, RoleScope::Global)
        .await;
    for user in &mut world.store.state.lock().await.users {
        user.is_active = false;
    }

    let decision = guard(&world)
        .authorize(Some(&caller), &AccessRequirement::super_admin())
        .await;
    assert_eq!(decision, AuthorizationDecision::Unauthorized);
}

#[tokio::test]
async fn super_admin_passes_every_scope() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    let guard = guard(&world);

    for requirement in [
        AccessRequirement::super_admin(),
        AccessRequirement::tenant(TenantId::new(), JOURNAL_ADMIN_ROLES),
        AccessRequirement::journal(JournalId::new(), EDITORIAL_ROLES),
    ] {
        let decision = guard.authorize(Some(&caller), &requirement).await;
        assert!(matches!(decision, AuthorizationDecision::Authorized(_)));
    }
}

#[tokio::test]
async fn authenticated_caller_without_roles_is_forbidden() {
    let world = TestWorld::new();
    let (_, caller) = world.add_user("reader").await;

    let decision = guard(&world)
        .authorize(Some(&caller), &AccessRequirement::super_admin())
        .await;
    assert_eq!(decision, AuthorizationDecision::Forbidden);
}

#[tokio::test]
async fn journal_role_is_confined_to_its_journal() {
    let world = TestWorld::new();
    let tenant_id = TenantId::new();
    let own = world.seed_journal(tenant_id, "own").await;
    let other = world.seed_journal(tenant_id, "other").await;
    let caller = world
        .login_as("editor", RoleKind::Editor, RoleScope::Journal(own.journal_id))
        .await;
    let guard = guard(&world);

    let allowed = guard
        .authorize(
            Some(&caller),
            &AccessRequirement::journal(own.journal_id, ISSUE_MANAGER_ROLES),
        )
        .await;
    let denied = guard
        .authorize(
            Some(&caller),
            &AccessRequirement::journal(other.journal_id, ISSUE_MANAGER_ROLES),
        )
        .await;
    let site = guard
        .authorize(Some(&caller), &AccessRequirement::super_admin())
        .await;

    assert!(matches!(allowed, AuthorizationDecision::Authorized(_)));
    assert_eq!(denied, AuthorizationDecision::Forbidden);
    assert_eq!(site, AuthorizationDecision::Forbidden);
}

#[tokio::test]
async fn role_outside_the_required_set_is_forbidden() {
    let world = TestWorld::new();
    let journal = world.seed_journal(TenantId::new(), "bio").await;
    let caller = world
        .login_as(
            "section",
            RoleKind::SectionEditor,
            RoleScope::Journal(journal.journal_id),
        )
        .await;

    let decision = guard(&world)
        .authorize(
            Some(&caller),
            &AccessRequirement::journal(journal.journal_id, ISSUE_MANAGER_ROLES),
        )
        .await;
    assert_eq!(decision, AuthorizationDecision::Forbidden);
}

#[tokio::test]
async fn tenant_admin_covers_journals_of_the_tenant_only() {
    let world = TestWorld::new();
    let tenant_id = TenantId::new();
    let inside = world.seed_journal(tenant_id, "inside").await;
    let outside = world.seed_journal(TenantId::new(), "outside").await;
    let caller = world
        .login_as("tenant", RoleKind::TenantAdmin, RoleScope::Tenant(tenant_id))
        .await;
    let guard = guard(&world);

    let inside_decision = guard
        .authorize(
            Some(&caller),
            &AccessRequirement::journal(inside.journal_id, JOURNAL_ADMIN_ROLES),
        )
        .await;
    let outside_decision = guard
        .authorize(
            Some(&caller),
            &AccessRequirement::journal(outside.journal_id, JOURNAL_ADMIN_ROLES),
        )
        .await;

    assert!(matches!(
        inside_decision,
        AuthorizationDecision::Authorized(_)
    ));
    assert_eq!(outside_decision, AuthorizationDecision::Forbidden);
}

#[tokio::test]
async fn inactive_assignment_grants_nothing() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    for assignment in &mut world.store.state.lock().await.assignments {
        assignment.is_active = false;
    }

    let decision = guard(&world)
        .authorize(Some(&caller), &AccessRequirement::super_admin())
        .await;
    assert_eq!(decision, AuthorizationDecision::Forbidden);
}

#[tokio::test]
async fn self_access_skips_role_checks() {
    let world = TestWorld::new();
    let (user_id, caller) = world.add_user("reviewer").await;

    let decision = guard(&world)
        .authorize(
            Some(&caller),
            &AccessRequirement::journal(JournalId::new(), EDITORIAL_ROLES).or_self(user_id),
        )
        .await;
    assert!(matches!(decision, AuthorizationDecision::Authorized(actor) if actor.user_id() == user_id));
}

#[tokio::test]
async fn each_check_resolves_the_actor_again() {
    let world = TestWorld::new();
    let caller = world.super_admin().await;
    let guard = guard(&world);

    let _ = guard
        .authorize(Some(&caller), &AccessRequirement::super_admin())
        .await;
    let _ = guard
        .authorize(Some(&caller), &AccessRequirement::super_admin())
        .await;

    assert_eq!(world.store.actor_lookups.load(Ordering::SeqCst), 2);
}
