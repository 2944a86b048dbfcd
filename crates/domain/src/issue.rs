use chrono::{DateTime, Utc};
use scholaris_core::{AppError, AppResult, JournalId};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// Issue identifier.
    IssueId
);

/// Issue of a journal, optionally published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue identifier.
    pub issue_id: IssueId,
    /// Owning journal.
    pub journal_id: JournalId,
    /// Volume number.
    pub volume: Option<i32>,
    /// Issue number within the volume (may be non-numeric, e.g. "S1").
    pub number: Option<String>,
    /// Publication year.
    pub year: Option<i32>,
    /// Optional issue title.
    pub title: Option<String>,
    /// Publication flag.
    pub is_published: bool,
    /// First publication timestamp; kept across unpublish/republish.
    pub published_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Issue {
    /// Marks the issue as published.
    ///
    /// `published_date` is only set when it has never been set before.
    pub fn publish(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.is_published {
            return Err(AppError::Conflict(format!(
                "issue '{}' is already published",
                self.issue_id
            )));
        }

        self.is_published = true;
        if self.published_date.is_none() {
            self.published_date = Some(now);
        }

        Ok(())
    }

    /// Withdraws the issue from public view.
    pub fn unpublish(&mut self) -> AppResult<()> {
        if !self.is_published {
            return Err(AppError::Conflict(format!(
                "issue '{}' is not published",
                self.issue_id
            )));
        }

        self.is_published = false;
        Ok(())
    }

    /// Rejects deletion while articles still reference the issue.
    pub fn ensure_deletable(&self, article_count: u64) -> AppResult<()> {
        if article_count > 0 {
            return Err(AppError::Conflict(format!(
                "cannot delete issue '{}': it still contains {article_count} article(s)",
                self.issue_id
            )));
        }

        Ok(())
    }

    /// Human-readable citation label such as `Vol. 3 No. 2 (2024)`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(volume) = self.volume {
            parts.push(format!("Vol. {volume}"));
        }
        if let Some(number) = self.number.as_deref() {
            parts.push(format!("No. {number}"));
        }
        if let Some(year) = self.year {
            parts.push(format!("({year})"));
        }

        match (parts.is_empty(), self.title.as_deref()) {
            (true, Some(title)) => title.to_owned(),
            (true, None) => "Untitled issue".to_owned(),
            (false, _) => parts.join(" "),
        }
    }
}
