mod issues;
mod journals;
mod submissions;

pub use issues::{IssueListQuery, IssueRepository};
pub use journals::{JournalListQuery, JournalRepository};
pub use submissions::{ReviewRepository, SubmissionListQuery, SubmissionRepository};
