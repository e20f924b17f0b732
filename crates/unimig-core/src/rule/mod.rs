pub mod condition;
pub mod query;
pub mod template;
pub mod title;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::legacy::{ExecutionErrorOption, NoDataOption};
use crate::text::truncate;

pub use condition::{plan_conditions, ConditionPlan, PlannedQuery};
pub use query::{migrate_queries, QueryNote};
pub use template::migrate_message_template;
pub use title::TitleDeduplicator;

pub const MAX_TITLE_LENGTH: usize = 190;
pub const EXPRESSION_DATASOURCE_UID: &str = "__expr__";
const BASE_INTERVAL_SECONDS: i64 = 10;

pub const USE_LEGACY_CHANNELS_LABEL: &str = "__legacy_use_channels__";
pub const SILENCE_RULE_UID_LABEL: &str = "__legacy_silence_rule_uid__";

pub const DASHBOARD_UID_ANNOTATION: &str = "__dashboardUid__";
pub const PANEL_ID_ANNOTATION: &str = "__panelId__";
pub const ALERT_ID_ANNOTATION: &str = "__alertId__";
pub const MESSAGE_ANNOTATION: &str = "message";

/// Label marking a rule as routed to one specific legacy channel.
pub fn channel_label(channel_uid: &str) -> String {
    format!("__contacts_{channel_uid}__")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataState {
    Alerting,
    NoData,
    #[serde(rename = "OK")]
    Ok,
}

impl From<NoDataOption> for NoDataState {
    fn from(option: NoDataOption) -> Self {
        match option {
            NoDataOption::Ok => Self::Ok,
            NoDataOption::NoData => Self::NoData,
            NoDataOption::Alerting => Self::Alerting,
            // a NoData state now raises its own alert, which is the closest
            // thing to keeping the last state
            NoDataOption::KeepState => Self::NoData,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecErrState {
    Alerting,
    Error,
    #[serde(rename = "OK")]
    Ok,
}

impl From<ExecutionErrorOption> for ExecErrState {
    fn from(option: ExecutionErrorOption) -> Self {
        match option {
            ExecutionErrorOption::Alerting => Self::Alerting,
            ExecutionErrorOption::KeepState => Self::Error,
            ExecutionErrorOption::Ok => Self::Ok,
        }
    }
}

/// Seconds relative to evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RelativeTimeRange {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    pub ref_id: String,
    #[serde(default)]
    pub query_type: String,
    pub relative_time_range: RelativeTimeRange,
    pub datasource_uid: String,
    pub model: Value,
}

impl AlertQuery {
    pub fn is_expression(&self) -> bool {
        self.datasource_uid == EXPRESSION_DATASOURCE_UID
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub org_id: i64,
    pub uid: String,
    pub title: String,
    pub condition: String,
    pub data: Vec<AlertQuery>,
    pub interval_seconds: i64,
    pub version: i64,
    pub namespace_uid: String,
    pub dashboard_uid: Option<String>,
    pub panel_id: Option<i64>,
    pub rule_group: String,
    pub rule_group_index: i64,
    pub for_seconds: i64,
    pub updated: DateTime<Utc>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub is_paused: bool,
    pub no_data_state: NoDataState,
    pub exec_err_state: ExecErrState,
}

/// Rounds a legacy frequency down to the scheduler's base interval.
pub fn adjust_interval(frequency_secs: i64) -> i64 {
    if frequency_secs <= BASE_INTERVAL_SECONDS {
        return BASE_INTERVAL_SECONDS;
    }
    frequency_secs - frequency_secs % BASE_INTERVAL_SECONDS
}

pub fn truncate_title(name: &str) -> &str {
    truncate(name, MAX_TITLE_LENGTH)
}

/// One group per dashboard panel, so every migrated rule sits alone.
pub fn rule_group_name(dashboard_title: &str, panel_id: i64) -> String {
    format!("{dashboard_title} - {panel_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_has_a_floor_of_ten_seconds() {
        assert_eq!(adjust_interval(0), 10);
        assert_eq!(adjust_interval(10), 10);
    }

    #[test]
    fn interval_rounds_down_to_base() {
        assert_eq!(adjust_interval(65), 60);
        assert_eq!(adjust_interval(120), 120);
    }

    #[test]
    fn long_titles_are_truncated() {
        let name = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(truncate_title(&name).len(), MAX_TITLE_LENGTH);
    }

    #[test]
    fn no_data_mapping() {
        assert_eq!(NoDataState::from(NoDataOption::Ok), NoDataState::Ok);
        assert_eq!(NoDataState::from(NoDataOption::NoData), NoDataState::NoData);
        assert_eq!(NoDataState::from(NoDataOption::Alerting), NoDataState::Alerting);
        assert_eq!(NoDataState::from(NoDataOption::KeepState), NoDataState::NoData);
    }

    #[test]
    fn exec_err_mapping() {
        assert_eq!(
            ExecErrState::from(ExecutionErrorOption::Alerting),
            ExecErrState::Alerting
        );
        assert_eq!(
            ExecErrState::from(ExecutionErrorOption::KeepState),
            ExecErrState::Error
        );
        assert_eq!(ExecErrState::from(ExecutionErrorOption::Ok), ExecErrState::Ok);
    }

    #[test]
    fn states_serialize_with_wire_names() {
        assert_eq!(serde_json::to_string(&NoDataState::Ok).unwrap(), "\"OK\"");
        assert_eq!(
            serde_json::to_string(&ExecErrState::Error).unwrap(),
            "\"Error\""
        );
    }

    #[test]
    fn rule_group_combines_dashboard_and_panel() {
        assert_eq!(rule_group_name("dash", 42), "dash - 42");
    }
}
