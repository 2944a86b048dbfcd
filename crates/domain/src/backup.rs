use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

record_identifier!(
    /// Backup identifier.
    BackupId
);

/// Database snapshot listed from the optional `backups` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    /// Backup identifier.
    pub backup_id: BackupId,
    /// Operator label.
    pub label: String,
    /// Archive size.
    pub size_bytes: i64,
    /// Snapshot timestamp.
    pub created_at: DateTime<Utc>,
}
