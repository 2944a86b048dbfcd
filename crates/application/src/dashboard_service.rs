use std::sync::Arc;

use scholaris_core::{AppResult, Credential};

use crate::{
    AccessRequirement, ActionEnvelope, ActionOutcome, Completed, DashboardRepository,
    DashboardStats, NoInput,
};

/// Counters for the admin landing page.
#[derive(Clone)]
pub struct DashboardService {
    envelope: ActionEnvelope,
    dashboard: Arc<dyn DashboardRepository>,
}

impl DashboardService {
    /// Creates the service.
    #[must_use]
    pub fn new(envelope: ActionEnvelope, dashboard: Arc<dyn DashboardRepository>) -> Self {
        Self {
            envelope,
            dashboard,
        }
    }

    /// Computes the dashboard counters.
    pub async fn dashboard_stats(
        &self,
        credential: Option<&Credential>,
    ) -> ActionOutcome<DashboardStats> {
        self.envelope
            .run(
                credential,
                NoInput::default(),
                |_| AccessRequirement::super_admin(),
                |_, ()| self.dashboard_stats_impl(),
            )
            .await
    }

    async fn dashboard_stats_impl(&self) -> AppResult<Completed<DashboardStats>> {
        let stats = self.dashboard.dashboard_stats().await?;
        Ok(Completed::read(stats))
    }
}

#[cfg(test)]
mod tests;
