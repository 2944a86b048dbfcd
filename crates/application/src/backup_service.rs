use std::sync::Arc;

use scholaris_core::{AppResult, Credential};
use scholaris_domain::Backup;
use tracing::debug;

use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, BackupRepository, Completed,
    FeatureCapabilities, PageQuery, PageRequest,
};

/// Read-only listing of database snapshots.
#[derive(Clone)]
pub struct BackupService {
    envelope: ActionEnvelope,
    backups: Arc<dyn BackupRepository>,
    capabilities: FeatureCapabilities,
}

impl BackupService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        envelope: ActionEnvelope,
        backups: Arc<dyn BackupRepository>,
        capabilities: FeatureCapabilities,
    ) -> Self {
        Self {
            envelope,
            backups,
            capabilities,
        }
    }

    /// Lists backups newest first; empty when the deployment has no backup table.
    pub async fn list_backups(
        &self,
        credential: Option<&Credential>,
        request: PageRequest,
    ) -> ActionOutcome<Vec<Backup>> {
        self.envelope
            .run(
                credential,
                request,
                |_| AccessRequirement::super_admin(),
                |_, page| self.list_backups_impl(page),
            )
            .await
    }

    async fn list_backups_impl(&self, page: PageQuery) -> AppResult<Completed<Vec<Backup>>> {
        if !self.capabilities.backups {
            debug!("backup table not present; listing nothing");
            return Ok(Completed::read(Vec::new()));
        }

        let backups = self.backups.list_backups(page).await?;
        Ok(Completed::read(backups))
    }
}

#[cfg(test)]
mod tests;
