pub mod settings;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::error::DomainError;

pub use settings::{
    Condition, ConditionQuery, DashAlertSettings, ExecutionErrorOption, NoDataOption,
    NotificationRef,
};

/// A legacy notification channel row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyChannel {
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    pub name: String,
    pub kind: String,
    pub is_default: bool,
    pub disable_resolve_message: bool,
    pub settings: Value,
    /// Values are encrypted with the secrets service.
    pub secure_settings: BTreeMap<String, Vec<u8>>,
    pub send_reminder: bool,
    pub frequency: Duration,
}

/// A legacy dashboard alert row.
#[derive(Debug, Clone, PartialEq)]
pub struct DashAlert {
    pub id: i64,
    pub org_id: i64,
    pub dashboard_id: i64,
    pub panel_id: i64,
    pub name: String,
    pub message: String,
    pub state: String,
    pub frequency_secs: i64,
    pub for_secs: i64,
    pub settings: Value,
}

impl DashAlert {
    pub fn parse_settings(&self) -> Result<DashAlertSettings, DomainError> {
        if self.settings.is_null() {
            return Ok(DashAlertSettings::default());
        }
        serde_json::from_value(self.settings.clone())
            .map_err(|e| DomainError::InvalidSettings(e.to_string()))
    }

    pub fn is_paused(&self) -> bool {
        self.state == "paused"
    }
}

/// Legacy alerts point at channels by either id or uid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelRef {
    Id(i64),
    Uid(String),
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Uid(uid) => write!(f, "{uid}"),
        }
    }
}

impl LegacyChannel {
    /// Every reference an alert could use to point at this channel.
    pub fn refs(&self) -> Vec<ChannelRef> {
        let mut refs = Vec::with_capacity(2);
        if !self.uid.is_empty() {
            refs.push(ChannelRef::Uid(self.uid.clone()));
        }
        if self.id != 0 {
            refs.push(ChannelRef::Id(self.id));
        }
        refs
    }
}
