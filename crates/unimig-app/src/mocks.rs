//! In-memory port implementations shared by the service tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use unimig_core::alertmanager::AlertmanagerConfig;
use unimig_core::datasource::{Datasource, DatasourceRef};
use unimig_core::folder::{AclItem, Dashboard, Folder, Permission};
use unimig_core::legacy::{DashAlert, LegacyChannel};
use unimig_core::rule::AlertRule;
use unimig_core::silence::Silence;
use unimig_core::state::OrgMigrationState;
use unimig_ports::error::PortError;
use unimig_ports::outbound::{
    AlertmanagerConfigStore, DatasourceCache, FolderService, LegacyStore, MigrationStateStore,
    RuleStore, SecretsService, SilenceWriter,
};

pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn channel(id: i64, uid: &str, name: &str, kind: &str, is_default: bool) -> LegacyChannel {
    let settings = match kind {
        "email" => json!({"addresses": format!("{name}@example.com")}),
        "slack" => json!({"recipient": "#alerts", "url": "https://hooks.slack.test/x"}),
        "pagerduty" => json!({"integrationKey": "pd-key"}),
        _ => json!({"url": "https://example.com/hook"}),
    };
    LegacyChannel {
        id,
        org_id: 1,
        uid: uid.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        is_default,
        disable_resolve_message: false,
        settings,
        secure_settings: BTreeMap::new(),
        send_reminder: false,
        frequency: Duration::ZERO,
    }
}

pub fn alert_settings(notifications: Value) -> Value {
    json!({
        "conditions": [{
            "evaluator": {"params": [3], "type": "gt"},
            "operator": {"type": "and"},
            "query": {
                "params": ["A", "5m", "now"],
                "datasourceId": 1,
                "model": {"refId": "A", "expr": "up"}
            },
            "reducer": {"type": "avg"}
        }],
        "noDataState": "no_data",
        "executionErrorState": "alerting",
        "notifications": notifications
    })
}

pub fn dash_alert(id: i64, dashboard_id: i64, name: &str, settings: Value) -> DashAlert {
    DashAlert {
        id,
        org_id: 1,
        dashboard_id,
        panel_id: id,
        name: name.to_string(),
        message: String::new(),
        state: "ok".into(),
        frequency_secs: 60,
        for_secs: 0,
        settings,
    }
}

pub fn dashboard(id: i64, uid: &str, title: &str, folder_id: i64, has_acl: bool) -> Dashboard {
    Dashboard {
        id,
        org_id: 1,
        uid: uid.to_string(),
        title: title.to_string(),
        folder_id,
        has_acl,
    }
}

pub fn prometheus() -> Datasource {
    Datasource {
        id: 1,
        org_id: 1,
        uid: "prom".into(),
        name: "Prometheus".into(),
        kind: "prometheus".into(),
        is_default: true,
    }
}

#[derive(Default)]
pub struct MockLegacyStore {
    pub orgs: Vec<i64>,
    pub channels: Vec<LegacyChannel>,
    pub alerts: Vec<DashAlert>,
}

#[async_trait]
impl LegacyStore for MockLegacyStore {
    async fn list_org_ids(&self) -> Result<Vec<i64>, PortError> {
        Ok(self.orgs.clone())
    }
    async fn list_channels(&self, org_id: i64) -> Result<Vec<LegacyChannel>, PortError> {
        Ok(self
            .channels
            .iter()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect())
    }
    async fn list_dash_alerts(&self, org_id: i64) -> Result<Vec<DashAlert>, PortError> {
        Ok(self
            .alerts
            .iter()
            .filter(|a| a.org_id == org_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockFolderService {
    pub dashboards: Vec<Dashboard>,
    pub folders: Mutex<Vec<Folder>>,
    /// Keyed by dashboard or folder id.
    pub acls: Mutex<HashMap<i64, Vec<AclItem>>>,
    pub fail_create: bool,
}

impl MockFolderService {
    pub fn with_dashboards(dashboards: Vec<Dashboard>) -> Self {
        Self {
            dashboards,
            ..Self::default()
        }
    }

    pub fn folder_titles(&self) -> Vec<String> {
        self.folders
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.title.clone())
            .collect()
    }
}

pub fn editor_acl() -> Vec<AclItem> {
    vec![AclItem {
        user_id: None,
        team_id: Some(7),
        role: None,
        permission: Permission::Edit,
    }]
}

#[async_trait]
impl FolderService for MockFolderService {
    async fn get_dashboard(&self, org_id: i64, id: i64) -> Result<Option<Dashboard>, PortError> {
        Ok(self
            .dashboards
            .iter()
            .find(|d| d.org_id == org_id && d.id == id)
            .cloned())
    }
    async fn get_folder_by_id(&self, org_id: i64, id: i64) -> Result<Option<Folder>, PortError> {
        let folders = self.folders.lock().unwrap();
        Ok(folders
            .iter()
            .find(|f| f.org_id == org_id && f.id == id)
            .cloned())
    }
    async fn get_folder_by_title(
        &self,
        org_id: i64,
        title: &str,
    ) -> Result<Option<Folder>, PortError> {
        let folders = self.folders.lock().unwrap();
        Ok(folders
            .iter()
            .find(|f| f.org_id == org_id && f.title == title)
            .cloned())
    }
    async fn create_folder(
        &self,
        org_id: i64,
        uid: &str,
        title: &str,
    ) -> Result<Folder, PortError> {
        if self.fail_create {
            return Err(PortError::Persistence("folder store down".into()));
        }
        let mut folders = self.folders.lock().unwrap();
        let folder = Folder {
            id: 1000 + folders.len() as i64,
            org_id,
            uid: uid.to_string(),
            title: title.to_string(),
        };
        folders.push(folder.clone());
        Ok(folder)
    }
    async fn delete_folder(&self, org_id: i64, uid: &str) -> Result<(), PortError> {
        self.folders
            .lock()
            .unwrap()
            .retain(|f| !(f.org_id == org_id && f.uid == uid));
        Ok(())
    }
    async fn get_acl(&self, _org_id: i64, dashboard_id: i64) -> Result<Vec<AclItem>, PortError> {
        Ok(self
            .acls
            .lock()
            .unwrap()
            .get(&dashboard_id)
            .cloned()
            .unwrap_or_default())
    }
    async fn set_acl(
        &self,
        _org_id: i64,
        folder_id: i64,
        items: &[AclItem],
    ) -> Result<(), PortError> {
        self.acls.lock().unwrap().insert(folder_id, items.to_vec());
        Ok(())
    }
}

pub struct MockDatasources {
    pub datasources: Vec<Datasource>,
}

impl Default for MockDatasources {
    fn default() -> Self {
        Self {
            datasources: vec![prometheus()],
        }
    }
}

#[async_trait]
impl DatasourceCache for MockDatasources {
    async fn get_datasource(
        &self,
        org_id: i64,
        reference: &DatasourceRef,
    ) -> Result<Option<Datasource>, PortError> {
        Ok(self
            .datasources
            .iter()
            .filter(|d| d.org_id == org_id)
            .find(|d| match reference {
                DatasourceRef::Default => d.is_default,
                DatasourceRef::Id(id) => d.id == *id,
                DatasourceRef::Uid(uid) => &d.uid == uid,
                DatasourceRef::Name(name) => &d.name == name,
            })
            .cloned())
    }
}

/// Reversible "encryption" that tags the payload.
#[derive(Default)]
pub struct MockSecrets;

const SECRET_PREFIX: &[u8] = b"enc:";

#[async_trait]
impl SecretsService for MockSecrets {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, PortError> {
        Ok([SECRET_PREFIX, plaintext].concat())
    }
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, PortError> {
        ciphertext
            .strip_prefix(SECRET_PREFIX)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| PortError::Encryption("not encrypted by mock".into()))
    }
}

#[derive(Default)]
pub struct MockRuleStore {
    pub rules: Mutex<Vec<AlertRule>>,
    pub fail_insert: bool,
}

#[async_trait]
impl RuleStore for MockRuleStore {
    async fn insert_rules(&self, rules: &[AlertRule]) -> Result<(), PortError> {
        if self.fail_insert {
            return Err(PortError::Persistence("rule store down".into()));
        }
        self.rules.lock().unwrap().extend(rules.iter().cloned());
        Ok(())
    }
    async fn list_rules(&self, org_id: i64) -> Result<Vec<AlertRule>, PortError> {
        Ok(self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.org_id == org_id)
            .cloned()
            .collect())
    }
    async fn delete_rules(&self, org_id: i64, uids: &[String]) -> Result<(), PortError> {
        self.rules
            .lock()
            .unwrap()
            .retain(|r| !(r.org_id == org_id && uids.contains(&r.uid)));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockConfigStore {
    pub configs: Mutex<HashMap<i64, AlertmanagerConfig>>,
    pub fail_save: bool,
}

#[async_trait]
impl AlertmanagerConfigStore for MockConfigStore {
    async fn save_config(
        &self,
        org_id: i64,
        config: &AlertmanagerConfig,
    ) -> Result<(), PortError> {
        if self.fail_save {
            return Err(PortError::Persistence("config store down".into()));
        }
        self.configs.lock().unwrap().insert(org_id, config.clone());
        Ok(())
    }
    async fn get_config(&self, org_id: i64) -> Result<Option<AlertmanagerConfig>, PortError> {
        Ok(self.configs.lock().unwrap().get(&org_id).cloned())
    }
    async fn delete_config(&self, org_id: i64) -> Result<(), PortError> {
        self.configs.lock().unwrap().remove(&org_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockStateStore {
    pub states: Mutex<HashMap<i64, OrgMigrationState>>,
}

#[async_trait]
impl MigrationStateStore for MockStateStore {
    async fn get_state(&self, org_id: i64) -> Result<OrgMigrationState, PortError> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(&org_id)
            .cloned()
            .unwrap_or_else(|| OrgMigrationState::new(org_id)))
    }
    async fn save_state(&self, state: &OrgMigrationState) -> Result<(), PortError> {
        self.states
            .lock()
            .unwrap()
            .insert(state.org_id, state.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSilences {
    pub written: Mutex<HashMap<i64, Vec<Silence>>>,
    pub fail: bool,
}

#[async_trait]
impl SilenceWriter for MockSilences {
    async fn write_silences(&self, org_id: i64, silences: &[Silence]) -> Result<(), PortError> {
        if self.fail {
            return Err(PortError::Io("disk full".into()));
        }
        self.written
            .lock()
            .unwrap()
            .insert(org_id, silences.to_vec());
        Ok(())
    }
    async fn remove_silences(&self, org_id: i64) -> Result<(), PortError> {
        self.written.lock().unwrap().remove(&org_id);
        Ok(())
    }
}
