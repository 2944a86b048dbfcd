use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppError, AppResult, Credential, FieldErrors, JournalId, TenantId};
use scholaris_domain::{
    AuditAction, Journal, JournalContact, ViewPath, validate_issn, validate_journal_path,
};
use serde::Deserialize;
use validator::{Validate, ValidateEmail};

use crate::validation::{check_field, finish_fields, trimmed_optional, trimmed_required};
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed, InputSchema,
    JOURNAL_ADMIN_ROLES, JournalListQuery, JournalRepository, PageQuery,
};

/// Listing request for journals.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListJournalsRequest {
    /// Restrict to one tenant.
    pub tenant_id: Option<TenantId>,
    /// Include deactivated journals.
    #[serde(default)]
    pub include_inactive: bool,
    /// Page size.
    #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
    pub limit: Option<u32>,
    /// Rows skipped.
    pub offset: Option<u32>,
}

impl InputSchema for ListJournalsRequest {
    type Valid = JournalListQuery;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(JournalListQuery {
            tenant_id: self.tenant_id,
            include_inactive: self.include_inactive,
            page: PageQuery::from_parts(self.limit, self.offset),
        })
    }
}

/// Request addressing one journal.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct JournalTarget {
    /// Journal identifier.
    pub journal_id: JournalId,
}

impl InputSchema for JournalTarget {
    type Valid = JournalId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.journal_id)
    }
}

/// Request creating a journal.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateJournalRequest {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique URL path.
    #[validate(length(min = 1, max = 64, message = "path must be 1 to 64 characters"))]
    pub path: String,
    /// Display title.
    #[validate(length(min = 1, max = 255, message = "title must be 1 to 255 characters"))]
    pub title: String,
    /// Optional description.
    #[validate(length(max = 5000, message = "description must not exceed 5000 characters"))]
    pub description: Option<String>,
    /// Electronic ISSN.
    pub online_issn: Option<String>,
    /// Print ISSN.
    pub print_issn: Option<String>,
    /// Contact person.
    #[validate(length(max = 255, message = "contact name must not exceed 255 characters"))]
    pub contact_name: Option<String>,
    /// Contact email.
    #[validate(email(message = "contact email must be a valid address"))]
    pub contact_email: Option<String>,
}

/// Sanitized journal creation values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournal {
    tenant_id: TenantId,
    path: String,
    title: String,
    description: Option<String>,
    online_issn: Option<String>,
    print_issn: Option<String>,
    contact: JournalContact,
}

impl InputSchema for CreateJournalRequest {
    type Valid = NewJournal;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let path = self.path.trim().to_owned();
        let online_issn = normalized_issn(self.online_issn);
        let print_issn = normalized_issn(self.print_issn);

        let mut errors = FieldErrors::default();
        check_field(&mut errors, "path", validate_journal_path(&path));
        check_issns(&mut errors, online_issn.as_deref(), print_issn.as_deref());
        finish_fields(errors)?;

        Ok(NewJournal {
            tenant_id: self.tenant_id,
            path,
            title: trimmed_required("title", self.title)?,
            description: trimmed_optional(self.description),
            online_issn,
            print_issn,
            contact: JournalContact {
                name: trimmed_optional(self.contact_name),
                email: trimmed_optional(self.contact_email).map(|email| email.to_lowercase()),
            },
        })
    }
}

/// Request updating journal metadata. Absent fields are kept; blank optional
/// fields are cleared.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateJournalRequest {
    /// Journal identifier.
    pub journal_id: JournalId,
    /// New title.
    #[validate(length(min = 1, max = 255, message = "title must be 1 to 255 characters"))]
    pub title: Option<String>,
    /// New description.
    #[validate(length(max = 5000, message = "description must not exceed 5000 characters"))]
    pub description: Option<String>,
    /// New electronic ISSN.
    pub online_issn: Option<String>,
    /// New print ISSN.
    pub print_issn: Option<String>,
    /// New contact person.
    #[validate(length(max = 255, message = "contact name must not exceed 255 characters"))]
    pub contact_name: Option<String>,
    /// New contact email; blank clears it.
    pub contact_email: Option<String>,
}

/// Sanitized journal patch; the inner `Option` of clearable fields is the new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalPatch {
    journal_id: JournalId,
    title: Option<String>,
    description: Option<Option<String>>,
    online_issn: Option<Option<String>>,
    print_issn: Option<Option<String>>,
    contact_name: Option<Option<String>>,
    contact_email: Option<Option<String>>,
}

impl InputSchema for UpdateJournalRequest {
    type Valid = JournalPatch;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let title = self
            .title
            .map(|title| trimmed_required("title", title))
            .transpose()?;
        let online_issn = self.online_issn.map(|value| normalized_issn(Some(value)));
        let print_issn = self.print_issn.map(|value| normalized_issn(Some(value)));
        let contact_email = self
            .contact_email
            .map(|email| trimmed_optional(Some(email)).map(|email| email.to_lowercase()));

        let mut errors = FieldErrors::default();
        check_issns(
            &mut errors,
            online_issn.clone().flatten().as_deref(),
            print_issn.clone().flatten().as_deref(),
        );
        if let Some(Some(email)) = &contact_email
            && !email.validate_email()
        {
            errors.push("contact_email", "contact email must be a valid address");
        }
        finish_fields(errors)?;

        Ok(JournalPatch {
            journal_id: self.journal_id,
            title,
            description: self.description.map(|value| trimmed_optional(Some(value))),
            online_issn,
            print_issn,
            contact_name: self.contact_name.map(|value| trimmed_optional(Some(value))),
            contact_email,
        })
    }
}

/// Request switching a journal on or off.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct SetJournalActiveRequest {
    /// Journal identifier.
    pub journal_id: JournalId,
    /// Desired state.
    pub is_active: bool,
}

impl InputSchema for SetJournalActiveRequest {
    type Valid = Self;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self)
    }
}

fn normalized_issn(value: Option<String>) -> Option<String> {
    trimmed_optional(value).map(|issn| issn.to_uppercase())
}

fn check_issns(errors: &mut FieldErrors, online_issn: Option<&str>, print_issn: Option<&str>) {
    if let Some(issn) = online_issn {
        check_field(errors, "online_issn", validate_issn(issn));
    }
    if let Some(issn) = print_issn {
        check_field(errors, "print_issn", validate_issn(issn));
    }
    if online_issn.is_some() && online_issn == print_issn {
        errors.push("print_issn", "print ISSN must differ from the online ISSN");
    }
}

fn journal_not_found(journal_id: JournalId) -> AppError {
    AppError::NotFound(format!("journal '{journal_id}' was not found"))
}

/// Journal administration.
#[derive(Clone)]
pub struct JournalService {
    envelope: ActionEnvelope,
    journals: Arc<dyn JournalRepository>,
}

impl JournalService {
    /// Creates the service.
    #[must_use]
    pub fn new(envelope: ActionEnvelope, journals: Arc<dyn JournalRepository>) -> Self {
        Self { envelope, journals }
    }

    /// Lists journals across tenants.
    pub async fn list_journals(
        &self,
        credential: Option<&Credential>,
        request: ListJournalsRequest,
    ) -> ActionOutcome<Vec<Journal>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, query| self.list_journals_impl(query),
            )
            .await
    }

    /// Creates a journal with a unique path.
    pub async fn create_journal(
        &self,
        credential: Option<&Credential>,
        request: CreateJournalRequest,
    ) -> ActionOutcome<Journal> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, new_journal| self.create_journal_impl(new_journal),
            )
            .await
    }

    /// Updates journal metadata.
    pub async fn update_journal(
        &self,
        credential: Option<&Credential>,
        request: UpdateJournalRequest,
    ) -> ActionOutcome<Journal> {
        self.envelope
            .run(
                credential,
                request,
                |patch| AccessRequirement::journal(patch.journal_id, JOURNAL_ADMIN_ROLES),
                |_, patch| self.update_journal_impl(patch),
            )
            .await
    }

    /// Activates or deactivates a journal.
    pub async fn set_journal_active(
        &self,
        credential: Option<&Credential>,
        request: SetJournalActiveRequest,
    ) -> ActionOutcome<Journal> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, request| self.set_journal_active_impl(request),
            )
            .await
    }

    /// Deletes a journal that no longer owns issues.
    pub async fn delete_journal(
        &self,
        credential: Option<&Credential>,
        request: JournalTarget,
    ) -> ActionOutcome<JournalId> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, journal_id| self.delete_journal_impl(journal_id),
            )
            .await
    }

    async fn list_journals_impl(&self, query: JournalListQuery) -> AppResult<Completed<Vec<Journal>>> {
        let journals = self.journals.list_journals(query).await?;
        Ok(Completed::read(journals))
    }

    async fn create_journal_impl(&self, new_journal: NewJournal) -> AppResult<Completed<Journal>> {
        if self
            .journals
            .find_journal_by_path(&new_journal.path)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "journal path '{}' is already taken",
                new_journal.path
            )));
        }

        let journal = Journal {
            journal_id: JournalId::new(),
            tenant_id: new_journal.tenant_id,
            path: new_journal.path,
            title: new_journal.title,
            description: new_journal.description,
            online_issn: new_journal.online_issn,
            print_issn: new_journal.print_issn,
            contact: new_journal.contact,
            is_active: true,
            created_at: Utc::now(),
        };
        self.journals.insert_journal(&journal).await?;

        let audit = AuditDraft::new(AuditAction::JournalCreated, "journal", journal.journal_id)
            .with_details(serde_json::json!({
                "path": journal.path,
                "title": journal.title,
                "tenant_id": journal.tenant_id,
            }));
        Ok(Completed::changed(journal, audit)
            .invalidating([ViewPath::admin_journals(), ViewPath::admin()]))
    }

    async fn update_journal_impl(&self, patch: JournalPatch) -> AppResult<Completed<Journal>> {
        let mut journal = self
            .journals
            .find_journal(patch.journal_id)
            .await?
            .ok_or_else(|| journal_not_found(patch.journal_id))?;

        if let Some(title) = patch.title {
            journal.title = title;
        }
        if let Some(description) = patch.description {
            journal.description = description;
        }
        if let Some(online_issn) = patch.online_issn {
            journal.online_issn = online_issn;
        }
        if let Some(print_issn) = patch.print_issn {
            journal.print_issn = print_issn;
        }
        if let Some(name) = patch.contact_name {
            journal.contact.name = name;
        }
        if let Some(email) = patch.contact_email {
            journal.contact.email = email;
        }

        if !self.journals.save_journal(&journal).await? {
            return Err(journal_not_found(journal.journal_id));
        }

        let audit = AuditDraft::new(AuditAction::JournalUpdated, "journal", journal.journal_id);
        let home = ViewPath::journal_home(&journal.path);
        Ok(Completed::changed(journal, audit).invalidating([ViewPath::admin_journals(), home]))
    }

    async fn set_journal_active_impl(
        &self,
        request: SetJournalActiveRequest,
    ) -> AppResult<Completed<Journal>> {
        let mut journal = self
            .journals
            .find_journal(request.journal_id)
            .await?
            .ok_or_else(|| journal_not_found(request.journal_id))?;

        if journal.is_active == request.is_active {
            return Ok(Completed::read(journal));
        }

        journal.is_active = request.is_active;
        if !self.journals.save_journal(&journal).await? {
            return Err(journal_not_found(journal.journal_id));
        }

        let action = if journal.is_active {
            AuditAction::JournalActivated
        } else {
            AuditAction::JournalDeactivated
        };
        let audit = AuditDraft::new(action, "journal", journal.journal_id);
        let home = ViewPath::journal_home(&journal.path);
        Ok(Completed::changed(journal, audit).invalidating([ViewPath::admin_journals(), home]))
    }

    async fn delete_journal_impl(&self, journal_id: JournalId) -> AppResult<Completed<JournalId>> {
        let journal = self
            .journals
            .find_journal(journal_id)
            .await?
            .ok_or_else(|| journal_not_found(journal_id))?;

        let issue_count = self.journals.count_issues(journal_id).await?;
        if issue_count > 0 {
            return Err(AppError::Conflict(format!(
                "cannot delete journal '{}': it still has {issue_count} issue(s)",
                journal.path
            )));
        }

        if !self.journals.delete_journal(journal_id).await? {
            return Err(journal_not_found(journal_id));
        }

        let audit = AuditDraft::new(AuditAction::JournalDeleted, "journal", journal_id)
            .with_details(serde_json::json!({ "path": journal.path }));
        Ok(Completed::changed(journal_id, audit).invalidating([
            ViewPath::admin_journals(),
            ViewPath::admin(),
            ViewPath::journal_home(&journal.path),
        ]))
    }
}

#[cfg(test)]
mod tests;
