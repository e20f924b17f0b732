use async_trait::async_trait;

use unimig_core::alertmanager::AlertmanagerConfig;
use unimig_core::datasource::{Datasource, DatasourceRef};
use unimig_core::folder::{AclItem, Dashboard, Folder};
use unimig_core::legacy::{DashAlert, LegacyChannel};
use unimig_core::rule::AlertRule;
use unimig_core::silence::Silence;
use unimig_core::state::OrgMigrationState;

use crate::error::PortError;

/// Read-only access to legacy alerting rows.
#[async_trait]
pub trait LegacyStore: Send + Sync {
    /// Every org that owns a legacy channel, alert or dashboard.
    async fn list_org_ids(&self) -> Result<Vec<i64>, PortError>;
    async fn list_channels(&self, org_id: i64) -> Result<Vec<LegacyChannel>, PortError>;
    async fn list_dash_alerts(&self, org_id: i64) -> Result<Vec<DashAlert>, PortError>;
}

#[async_trait]
pub trait FolderService: Send + Sync {
    async fn get_dashboard(&self, org_id: i64, id: i64) -> Result<Option<Dashboard>, PortError>;
    async fn get_folder_by_id(&self, org_id: i64, id: i64) -> Result<Option<Folder>, PortError>;
    async fn get_folder_by_title(
        &self,
        org_id: i64,
        title: &str,
    ) -> Result<Option<Folder>, PortError>;
    async fn create_folder(&self, org_id: i64, uid: &str, title: &str)
        -> Result<Folder, PortError>;
    async fn delete_folder(&self, org_id: i64, uid: &str) -> Result<(), PortError>;
    async fn get_acl(&self, org_id: i64, dashboard_id: i64) -> Result<Vec<AclItem>, PortError>;
    async fn set_acl(&self, org_id: i64, folder_id: i64, items: &[AclItem])
        -> Result<(), PortError>;
}

#[async_trait]
pub trait DatasourceCache: Send + Sync {
    async fn get_datasource(
        &self,
        org_id: i64,
        reference: &DatasourceRef,
    ) -> Result<Option<Datasource>, PortError>;
}

/// Encryption without any special scope.
#[async_trait]
pub trait SecretsService: Send + Sync {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, PortError>;
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, PortError>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn insert_rules(&self, rules: &[AlertRule]) -> Result<(), PortError>;
    async fn list_rules(&self, org_id: i64) -> Result<Vec<AlertRule>, PortError>;
    async fn delete_rules(&self, org_id: i64, uids: &[String]) -> Result<(), PortError>;
}

#[async_trait]
pub trait AlertmanagerConfigStore: Send + Sync {
    async fn save_config(&self, org_id: i64, config: &AlertmanagerConfig)
        -> Result<(), PortError>;
    async fn get_config(&self, org_id: i64) -> Result<Option<AlertmanagerConfig>, PortError>;
    async fn delete_config(&self, org_id: i64) -> Result<(), PortError>;
}

#[async_trait]
pub trait MigrationStateStore: Send + Sync {
    /// Returns a not-migrated state for orgs never seen before.
    async fn get_state(&self, org_id: i64) -> Result<OrgMigrationState, PortError>;
    async fn save_state(&self, state: &OrgMigrationState) -> Result<(), PortError>;
}

#[async_trait]
pub trait SilenceWriter: Send + Sync {
    async fn write_silences(&self, org_id: i64, silences: &[Silence]) -> Result<(), PortError>;
    async fn remove_silences(&self, org_id: i64) -> Result<(), PortError>;
}
