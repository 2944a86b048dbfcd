use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use scholaris_application::EmailTemplateRepository;
use scholaris_core::{AppError, AppResult, JournalId};
use scholaris_domain::{EmailTemplate, EmailTemplateId};

use super::PostgresConfigurationRepository;

#[derive(Debug, FromRow)]
struct EmailTemplateRow {
    id: uuid::Uuid,
    journal_id: Option<uuid::Uuid>,
    key: String,
    subject: String,
    body: String,
    default_subject: String,
    default_body: String,
    is_enabled: bool,
    updated_at: DateTime<Utc>,
}

impl From<EmailTemplateRow> for EmailTemplate {
    fn from(row: EmailTemplateRow) -> Self {
        Self {
            template_id: EmailTemplateId::from_uuid(row.id),
            journal_id: row.journal_id.map(JournalId::from_uuid),
            key: row.key,
            subject: row.subject,
            body: row.body,
            default_subject: row.default_subject,
            default_body: row.default_body,
            is_enabled: row.is_enabled,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl EmailTemplateRepository for PostgresConfigurationRepository {
    async fn list_email_templates(
        &self,
        journal_id: Option<JournalId>,
    ) -> AppResult<Vec<EmailTemplate>> {
        let rows = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            SELECT id, journal_id, key, subject, body, default_subject, default_body,
                   is_enabled, updated_at
            FROM email_templates
            WHERE journal_id IS NOT DISTINCT FROM $1
            ORDER BY key
            "#,
        )
        .bind(journal_id.map(|journal_id| journal_id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list email templates: {error}"))
        })?;

        Ok(rows.into_iter().map(EmailTemplate::from).collect())
    }

    async fn find_email_template(
        &self,
        template_id: EmailTemplateId,
    ) -> AppResult<Option<EmailTemplate>> {
        let row = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            SELECT id, journal_id, key, subject, body, default_subject, default_body,
                   is_enabled, updated_at
            FROM email_templates
            WHERE id = $1
            "#,
        )
        .bind(template_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find email template: {error}")))?;

        Ok(row.map(EmailTemplate::from))
    }

    async fn save_email_template(&self, template: &EmailTemplate) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE email_templates
            SET subject = $2, body = $3, is_enabled = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(template.template_id.as_uuid())
        .bind(template.subject.as_str())
        .bind(template.body.as_str())
        .bind(template.is_enabled)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save email template: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}
