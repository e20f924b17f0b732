use thiserror::Error;
use unimig_core::error::DomainError;
use unimig_ports::error::PortError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("port error: {0}")]
    Port(#[from] PortError),
    #[error("failed to migrate alert {alert_id}: {source}")]
    Migration {
        alert_id: i64,
        #[source]
        source: Box<AppError>,
    },
    #[error("failed to migrate alert rule '{name}' of dashboard {dashboard_uid} in org {org_id}: {source}")]
    Translate {
        name: String,
        dashboard_uid: String,
        org_id: i64,
        #[source]
        source: Box<AppError>,
    },
    #[error("invalid receiver {receiver}: {source}")]
    InvalidReceiver {
        receiver: String,
        #[source]
        source: DomainError,
    },
    #[error("dashboard {dashboard_id} not found in org {org_id}")]
    DashboardNotFound { dashboard_id: i64, org_id: i64 },
    #[error("folder resolved for dashboard {0} has an empty uid")]
    EmptyFolderUid(String),
    #[error("datasource not found: {0}")]
    DatasourceNotFound(String),
    #[error("duplicate alert rule uid {0}")]
    DuplicateRuleUid(String),
    #[error("secure setting {0} is not valid utf-8")]
    InvalidSecureSetting(String),
    #[error("org {0} is already migrated")]
    AlreadyMigrated(i64),
}

impl AppError {
    /// Wraps a failure with the legacy alert it came from.
    pub fn for_alert(alert_id: i64, source: AppError) -> Self {
        Self::Migration {
            alert_id,
            source: Box::new(source),
        }
    }

    /// Legacy alert id carried by the error, if any.
    pub fn alert_id(&self) -> Option<i64> {
        match self {
            Self::Migration { alert_id, .. } => Some(*alert_id),
            _ => None,
        }
    }
}
