/// Optional features detected once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureCapabilities {
    /// The deployment carries a `backups` table.
    pub backups: bool,
}
