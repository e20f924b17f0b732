use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{OrgMigrationSummary, RevertSummary, RunSummary};

#[async_trait]
pub trait AlertMigrator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Migrates every org not migrated yet. With `force`, migrated orgs are
    /// reverted and migrated again.
    async fn run(&self, force: bool, now: DateTime<Utc>) -> Result<RunSummary, Self::Error>;
    async fn migrate_org(
        &self,
        org_id: i64,
        now: DateTime<Utc>,
    ) -> Result<OrgMigrationSummary, Self::Error>;
    async fn revert_org(&self, org_id: i64) -> Result<RevertSummary, Self::Error>;
}
