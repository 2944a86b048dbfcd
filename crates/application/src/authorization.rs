use std::sync::Arc;

use async_trait::async_trait;
use scholaris_core::{Actor, AppResult, Credential, JournalId, TenantId, UserId};
use scholaris_domain::{RoleAssignment, RoleKind, RoleScope};
use tracing::{debug, warn};

/// Roles that administer one journal.
pub const JOURNAL_ADMIN_ROLES: &[RoleKind] = &[RoleKind::TenantAdmin, RoleKind::JournalManager];

/// Roles that manage issues of one journal.
pub const ISSUE_MANAGER_ROLES: &[RoleKind] = &[
    RoleKind::TenantAdmin,
    RoleKind::JournalManager,
    RoleKind::Editor,
];

/// Roles that run the editorial workflow of one journal.
pub const EDITORIAL_ROLES: &[RoleKind] = &[
    RoleKind::TenantAdmin,
    RoleKind::JournalManager,
    RoleKind::Editor,
    RoleKind::SectionEditor,
];

/// Port resolving a bearer credential to an actor.
///
/// Implementations return `None` for unknown or expired credentials and for
/// disabled accounts.
#[async_trait]
pub trait ActorResolver: Send + Sync {
    /// Resolves the actor behind a credential.
    async fn resolve_actor(&self, credential: &Credential) -> AppResult<Option<Actor>>;
}

/// Port for role lookups used by the guard.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Lists active role assignments of one user.
    async fn list_active_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Returns the tenant owning a journal.
    async fn journal_tenant(&self, journal_id: JournalId) -> AppResult<Option<TenantId>>;
}

/// Role and scope an operation requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequirement {
    roles: Vec<RoleKind>,
    scope: RoleScope,
    self_user: Option<UserId>,
}

impl AccessRequirement {
    /// Only a global super admin passes.
    #[must_use]
    pub fn super_admin() -> Self {
        Self {
            roles: Vec::new(),
            scope: RoleScope::Global,
            self_user: None,
        }
    }

    /// One of `roles` in the tenant, or a global grant of those roles.
    #[must_use]
    pub fn tenant(tenant_id: TenantId, roles: &[RoleKind]) -> Self {
        Self {
            roles: roles.to_vec(),
            scope: RoleScope::Tenant(tenant_id),
            self_user: None,
        }
    }

    /// One of `roles` for the journal, its tenant, or globally.
    #[must_use]
    pub fn journal(journal_id: JournalId, roles: &[RoleKind]) -> Self {
        Self {
            roles: roles.to_vec(),
            scope: RoleScope::Journal(journal_id),
            self_user: None,
        }
    }

    /// Journal requirement when a journal is given, super admin otherwise.
    #[must_use]
    pub fn journal_or_site(journal_id: Option<JournalId>, roles: &[RoleKind]) -> Self {
        match journal_id {
            Some(journal_id) => Self::journal(journal_id, roles),
            None => Self::super_admin(),
        }
    }

    /// Also lets `user_id` act on their own record.
    #[must_use]
    pub fn or_self(mut self, user_id: UserId) -> Self {
        self.self_user = Some(user_id);
        self
    }

    /// Required scope.
    #[must_use]
    pub fn scope(&self) -> RoleScope {
        self.scope
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// Actor holds a sufficient role.
    Authorized(Actor),
    /// Missing, invalid or unresolvable credential.
    Unauthorized,
    /// Known actor without a sufficient role.
    Forbidden,
}

/// Fail-closed role guard for privileged operations.
#[derive(Clone)]
pub struct AuthorizationGuard {
    actor_resolver: Arc<dyn ActorResolver>,
    role_assignments: Arc<dyn RoleAssignmentRepository>,
}

impl AuthorizationGuard {
    /// Creates a guard from its lookup ports.
    #[must_use]
    pub fn new(
        actor_resolver: Arc<dyn ActorResolver>,
        role_assignments: Arc<dyn RoleAssignmentRepository>,
    ) -> Self {
        Self {
            actor_resolver,
            role_assignments,
        }
    }

    /// Resolves and checks the caller in one step.
    pub async fn authorize(
        &self,
        credential: Option<&Credential>,
        requirement: &AccessRequirement,
    ) -> AuthorizationDecision {
        match self.authenticate(credential).await {
            Some(actor) => self.check(actor, requirement).await,
            None => AuthorizationDecision::Unauthorized,
        }
    }

    /// Resolves the actor behind a credential; lookup errors count as no actor.
    pub async fn authenticate(&self, credential: Option<&Credential>) -> Option<Actor> {
        let Some(credential) = credential else {
            debug!("request carried no credential");
            return None;
        };

        match self.actor_resolver.resolve_actor(credential).await {
            Ok(Some(actor)) => Some(actor),
            Ok(None) => {
                debug!("credential did not resolve to an active actor");
                None
            }
            Err(error) => {
                warn!(%error, "actor lookup failed; treating caller as unauthenticated");
                None
            }
        }
    }

    /// Decides whether an already resolved actor meets the requirement.
    pub async fn check(&self, actor: Actor, requirement: &AccessRequirement) -> AuthorizationDecision {
        if requirement.self_user == Some(actor.user_id()) {
            return AuthorizationDecision::Authorized(actor);
        }

        let assignments = match self
            .role_assignments
            .list_active_assignments(actor.user_id())
            .await
        {
            Ok(assignments) => assignments,
            Err(error) => {
                warn!(%error, user_id = %actor.user_id(), "role lookup failed; denying");
                return AuthorizationDecision::Forbidden;
            }
        };

        match self.satisfies(&assignments, requirement).await {
            Ok(true) => AuthorizationDecision::Authorized(actor),
            Ok(false) => {
                debug!(
                    user_id = %actor.user_id(),
                    scope = requirement.scope.kind_str(),
                    "actor lacks a sufficient role"
                );
                AuthorizationDecision::Forbidden
            }
            Err(error) => {
                warn!(%error, user_id = %actor.user_id(), "scope lookup failed; denying");
                AuthorizationDecision::Forbidden
            }
        }
    }

    async fn satisfies(
        &self,
        assignments: &[RoleAssignment],
        requirement: &AccessRequirement,
    ) -> AppResult<bool> {
        let active = || assignments.iter().filter(|assignment| assignment.is_active);

        if active().any(RoleAssignment::is_global_super_admin) {
            return Ok(true);
        }

        let mut journal_tenant: Option<Option<TenantId>> = None;
        for assignment in active().filter(|assignment| requirement.roles.contains(&assignment.role)) {
            let covered = match (assignment.scope, requirement.scope) {
                (RoleScope::Global, _) => true,
                (RoleScope::Tenant(held), RoleScope::Tenant(required)) => held == required,
                (RoleScope::Tenant(held), RoleScope::Journal(journal_id)) => {
                    if journal_tenant.is_none() {
                        journal_tenant =
                            Some(self.role_assignments.journal_tenant(journal_id).await?);
                    }
                    journal_tenant.flatten() == Some(held)
                }
                (RoleScope::Journal(held), RoleScope::Journal(required)) => held == required,
                _ => false,
            };

            if covered {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests;
