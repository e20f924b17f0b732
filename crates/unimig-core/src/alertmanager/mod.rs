pub mod contacts;
pub mod duration;
pub mod router;

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::DomainError;

pub use contacts::{
    contact_list_to_string, contact_matcher, select_contacts, ContactSelection, ReceiverNames,
};
pub use duration::ModelDuration;
pub use router::RoutingTree;

/// Label carrying the quoted, comma joined receiver names of a rule.
pub const CONTACT_LABEL: &str = "__legacy_c_contacts__";
pub const DEFAULT_RECEIVER_NAME: &str = "autogen-contact-point-default";
pub const CONFIG_VERSION: &str = "v1";
pub const FOLDER_TITLE_LABEL: &str = "grafana_folder";
pub const ALERT_NAME_LABEL: &str = "alertname";

/// Stand-in for "never repeat", used when a channel had reminders off.
pub const DISABLED_REPEAT_INTERVAL: ModelDuration = ModelDuration::from_hours(8736);

/// One Grafana managed notifier inside a receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub uid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub disable_resolve_message: bool,
    pub settings: Value,
    /// Encrypted, base64 encoded values.
    #[serde(default)]
    pub secure_settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    #[serde(default)]
    pub grafana_managed_receiver_configs: Vec<Integration>,
}

impl Receiver {
    pub fn new(name: impl Into<String>, integrations: Vec<Integration>) -> Self {
        Self {
            name: name.into(),
            grafana_managed_receiver_configs: integrations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Equal,
    NotEqual,
    Regexp,
    NotRegexp,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Regexp => "=~",
            Self::NotRegexp => "!~",
        }
    }

    fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "=~" => Some(Self::Regexp),
            "!~" => Some(Self::NotRegexp),
            _ => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label matcher, serialized as `[name, operator, value]`.
///
/// Regex matchers are anchored at both ends like alertmanager's.
#[derive(Debug, Clone)]
pub struct ObjectMatcher {
    pub name: String,
    pub kind: MatchType,
    pub value: String,
    regex: Option<Regex>,
}

impl ObjectMatcher {
    pub fn new(
        name: impl Into<String>,
        kind: MatchType,
        value: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let value = value.into();
        let regex = match kind {
            MatchType::Regexp | MatchType::NotRegexp => Some(
                Regex::new(&format!("^(?:{value})$"))
                    .map_err(|e| DomainError::InvalidMatcher(format!("{name}: {e}")))?,
            ),
            MatchType::Equal | MatchType::NotEqual => None,
        };
        Ok(Self {
            name,
            kind,
            value,
            regex,
        })
    }

    /// A missing label matches as the empty string.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let actual = labels.get(&self.name).map(String::as_str).unwrap_or("");
        match (self.kind, &self.regex) {
            (MatchType::Equal, _) => actual == self.value,
            (MatchType::NotEqual, _) => actual != self.value,
            (MatchType::Regexp, Some(re)) => re.is_match(actual),
            (MatchType::NotRegexp, Some(re)) => !re.is_match(actual),
            (MatchType::Regexp | MatchType::NotRegexp, None) => false,
        }
    }
}

impl PartialEq for ObjectMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.value == other.value
    }
}

impl Serialize for ObjectMatcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name, self.kind.as_str(), &self.value).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectMatcher {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, op, value) = <(String, String, String)>::deserialize(deserializer)?;
        let kind = MatchType::parse(&op)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown match type {op}")))?;
        Self::new(name, kind, value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_matchers: Vec<ObjectMatcher>,
    #[serde(default, rename = "continue")]
    pub continue_matching: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<ModelDuration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

impl Route {
    /// The root policy, grouped like legacy notifications were.
    pub fn root(receiver: impl Into<String>, repeat_interval: Option<ModelDuration>) -> Self {
        Self {
            receiver: receiver.into(),
            group_by: vec![FOLDER_TITLE_LABEL.to_string(), ALERT_NAME_LABEL.to_string()],
            object_matchers: Vec::new(),
            continue_matching: false,
            repeat_interval,
            routes: Vec::new(),
        }
    }

    /// Child policy selecting rules whose contact list names `receiver`.
    /// Continues so sibling contacts can match the same rule.
    pub fn for_contact(receiver: &str, repeat_interval: ModelDuration) -> Result<Self, DomainError> {
        Ok(Self {
            receiver: receiver.to_string(),
            group_by: Vec::new(),
            object_matchers: vec![contact_matcher(receiver)?],
            continue_matching: true,
            repeat_interval: Some(repeat_interval),
            routes: Vec::new(),
        })
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.object_matchers.iter().all(|m| m.matches(labels))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub route: Route,
    #[serde(default)]
    pub receivers: Vec<Receiver>,
}

/// The alertmanager configuration persisted for one org.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertmanagerConfig {
    #[serde(default)]
    pub template_files: BTreeMap<String, String>,
    pub alertmanager_config: RoutingConfig,
}

impl AlertmanagerConfig {
    pub fn new(route: Route, receivers: Vec<Receiver>) -> Self {
        Self {
            template_files: BTreeMap::new(),
            alertmanager_config: RoutingConfig { route, receivers },
        }
    }

    pub fn route(&self) -> &Route {
        &self.alertmanager_config.route
    }

    pub fn receivers(&self) -> &[Receiver] {
        &self.alertmanager_config.receivers
    }

    pub fn receiver(&self, name: &str) -> Option<&Receiver> {
        self.receivers().iter().find(|r| r.name == name)
    }

    pub fn integration_count(&self) -> usize {
        self.receivers()
            .iter()
            .map(|r| r.grafana_managed_receiver_configs.len())
            .sum()
    }
}
