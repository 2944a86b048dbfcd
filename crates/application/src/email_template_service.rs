use std::sync::Arc;

use chrono::Utc;
use scholaris_core::{AppError, AppResult, Credential, JournalId};
use scholaris_domain::{AuditAction, EmailTemplate, EmailTemplateId, ViewPath};
use serde::Deserialize;
use validator::Validate;

use crate::validation::trimmed_required;
use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, AuditDraft, Completed,
    EmailTemplateRepository, InputSchema, JOURNAL_ADMIN_ROLES,
};

/// Listing request for the templates of one scope.
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct ListEmailTemplatesRequest {
    /// Journal scope; site defaults when absent.
    pub journal_id: Option<JournalId>,
}

impl InputSchema for ListEmailTemplatesRequest {
    type Valid = Option<JournalId>;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.journal_id)
    }
}

/// Request addressing one template.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct EmailTemplateTarget {
    /// Template identifier.
    pub template_id: EmailTemplateId,
}

impl InputSchema for EmailTemplateTarget {
    type Valid = EmailTemplateId;

    fn into_valid(self) -> AppResult<Self::Valid> {
        Ok(self.template_id)
    }
}

/// Request editing a template.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateEmailTemplateRequest {
    /// Template identifier.
    pub template_id: EmailTemplateId,
    /// Subject line.
    #[validate(length(min = 1, max = 998, message = "subject must be 1 to 998 characters"))]
    pub subject: String,
    /// Body text with `{$placeholder}` variables.
    #[validate(length(min = 1, max = 65535, message = "body must be 1 to 65535 characters"))]
    pub body: String,
    /// Whether the template is sent at all; unchanged when absent.
    pub is_enabled: Option<bool>,
}

/// Sanitized template edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEdit {
    template_id: EmailTemplateId,
    subject: String,
    body: String,
    is_enabled: Option<bool>,
}

impl InputSchema for UpdateEmailTemplateRequest {
    type Valid = TemplateEdit;

    fn into_valid(self) -> AppResult<Self::Valid> {
        let body = self.body.trim_end().to_owned();
        if body.trim().is_empty() {
            return Err(AppError::Validation("body is required".to_owned()));
        }

        Ok(TemplateEdit {
            template_id: self.template_id,
            subject: trimmed_required("subject", self.subject)?,
            body,
            is_enabled: self.is_enabled,
        })
    }
}

/// Editing of outgoing email texts.
#[derive(Clone)]
pub struct EmailTemplateService {
    envelope: ActionEnvelope,
    templates: Arc<dyn EmailTemplateRepository>,
}

impl EmailTemplateService {
    /// Creates the service.
    #[must_use]
    pub fn new(envelope: ActionEnvelope, templates: Arc<dyn EmailTemplateRepository>) -> Self {
        Self {
            envelope,
            templates,
        }
    }

    /// Lists the templates of one scope ordered by key.
    pub async fn list_email_templates(
        &self,
        credential: Option<&Credential>,
        request: ListEmailTemplatesRequest,
    ) -> ActionOutcome<Vec<EmailTemplate>> {
        self.envelope
            .run(
                credential,
                request,
                |journal_id| AccessRequirement::journal_or_site(*journal_id, JOURNAL_ADMIN_ROLES),
                |_, journal_id| self.list_email_templates_impl(journal_id),
            )
            .await
    }

    /// Replaces subject and body of a template.
    pub async fn update_email_template(
        &self,
        credential: Option<&Credential>,
        request: UpdateEmailTemplateRequest,
    ) -> ActionOutcome<EmailTemplate> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |edit| self.template_requirement(edit.template_id),
                |_, edit| self.update_email_template_impl(edit),
            )
            .await
    }

    /// Restores the shipped subject and body.
    pub async fn reset_email_template(
        &self,
        credential: Option<&Credential>,
        request: EmailTemplateTarget,
    ) -> ActionOutcome<EmailTemplate> {
        self.envelope
            .run_scoped(
                credential,
                request,
                |template_id| self.template_requirement(*template_id),
                |_, template_id| self.reset_email_template_impl(template_id),
            )
            .await
    }

    async fn template_requirement(
        &self,
        template_id: EmailTemplateId,
    ) -> AppResult<AccessRequirement> {
        let template = self.find_template(template_id).await?;
        Ok(AccessRequirement::journal_or_site(
            template.journal_id,
            JOURNAL_ADMIN_ROLES,
        ))
    }

    async fn find_template(&self, template_id: EmailTemplateId) -> AppResult<EmailTemplate> {
        self.templates
            .find_email_template(template_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("email template '{template_id}' was not found"))
            })
    }

    async fn store(&self, template: &EmailTemplate) -> AppResult<()> {
        if self.templates.save_email_template(template).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "email template '{}' was not found",
                template.template_id
            )))
        }
    }

    async fn list_email_templates_impl(
        &self,
        journal_id: Option<JournalId>,
    ) -> AppResult<Completed<Vec<EmailTemplate>>> {
        let templates = self.templates.list_email_templates(journal_id).await?;
        Ok(Completed::read(templates))
    }

    async fn update_email_template_impl(
        &self,
        edit: TemplateEdit,
    ) -> AppResult<Completed<EmailTemplate>> {
        let mut template = self.find_template(edit.template_id).await?;
        let is_enabled = edit.is_enabled.unwrap_or(template.is_enabled);
        if template.subject == edit.subject
            && template.body == edit.body
            && template.is_enabled == is_enabled
        {
            return Ok(Completed::read(template));
        }

        template.subject = edit.subject;
        template.body = edit.body;
        template.is_enabled = is_enabled;
        template.updated_at = Utc::now();
        self.store(&template).await?;

        let audit = AuditDraft::new(
            AuditAction::EmailTemplateUpdated,
            "email_template",
            template.template_id,
        )
        .with_details(serde_json::json!({
            "key": template.key,
            "journal_id": template.journal_id,
            "is_enabled": template.is_enabled,
            "customized": template.is_customized(),
        }));
        Ok(Completed::changed(template, audit).invalidating([ViewPath::admin_email_templates()]))
    }

    async fn reset_email_template_impl(
        &self,
        template_id: EmailTemplateId,
    ) -> AppResult<Completed<EmailTemplate>> {
        let mut template = self.find_template(template_id).await?;
        if !template.is_customized() && template.is_enabled {
            return Ok(Completed::read(template));
        }

        template.reset(Utc::now());
        self.store(&template).await?;

        let audit = AuditDraft::new(AuditAction::EmailTemplateReset, "email_template", template_id)
            .with_details(serde_json::json!({
                "key": template.key,
                "journal_id": template.journal_id,
            }));
        Ok(Completed::changed(template, audit).invalidating([ViewPath::admin_email_templates()]))
    }
}
