use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ChannelRef;

/// The JSON settings blob stored on a legacy dashboard alert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashAlertSettings {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub no_data_state: String,
    #[serde(default)]
    pub execution_error_state: String,
    #[serde(default)]
    pub notifications: Vec<NotificationRef>,
    #[serde(default)]
    pub alert_rule_tags: Value,
}

impl DashAlertSettings {
    /// Tags become labels only when stored as a JSON object; the older array
    /// form carries no values and is ignored.
    pub fn tags(&self) -> BTreeMap<String, String> {
        let Some(tags) = self.alert_rule_tags.as_object() else {
            return BTreeMap::new();
        };
        tags.iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }

    pub fn channel_refs(&self) -> Vec<ChannelRef> {
        self.notifications
            .iter()
            .filter_map(NotificationRef::channel_ref)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationRef {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub uid: String,
}

impl NotificationRef {
    pub fn channel_ref(&self) -> Option<ChannelRef> {
        if self.id > 0 {
            Some(ChannelRef::Id(self.id))
        } else if !self.uid.is_empty() {
            Some(ChannelRef::Uid(self.uid.clone()))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub evaluator: Value,
    #[serde(default)]
    pub operator: Value,
    pub query: ConditionQuery,
    #[serde(default)]
    pub reducer: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionQuery {
    /// `[refId, from, to]`, e.g. `["A", "5m", "now"]`.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub datasource_id: i64,
    #[serde(default)]
    pub model: Value,
}

impl ConditionQuery {
    pub fn ref_id(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    pub fn from(&self) -> Option<&str> {
        self.params.get(1).map(String::as_str)
    }

    pub fn to(&self) -> Option<&str> {
        self.params.get(2).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataOption {
    Ok,
    NoData,
    Alerting,
    KeepState,
}

impl NoDataOption {
    /// Returns `None` for values legacy alerting never wrote.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Self::Ok),
            "" | "no_data" => Some(Self::NoData),
            "alerting" => Some(Self::Alerting),
            "keep_state" => Some(Self::KeepState),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorOption {
    Alerting,
    KeepState,
    Ok,
}

impl ExecutionErrorOption {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "alerting" => Some(Self::Alerting),
            "keep_state" => Some(Self::KeepState),
            "ok" => Some(Self::Ok),
            _ => None,
        }
    }
}
