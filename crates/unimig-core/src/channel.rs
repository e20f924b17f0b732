use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Channel types no longer supported by unified alerting.
pub const DISCONTINUED_TYPES: &[&str] = &["hipchat", "sensu"];

pub fn is_discontinued(kind: &str) -> bool {
    DISCONTINUED_TYPES
        .iter()
        .any(|d| d.eq_ignore_ascii_case(kind))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Email,
    Slack,
    PagerDuty,
    Webhook,
    PrometheusAlertmanager,
    OpsGenie,
    Telegram,
    Line,
    Pushover,
    Threema,
    Discord,
    Teams,
    GoogleChat,
    VictorOps,
    Kafka,
    SensuGo,
    DingDing,
}

impl ChannelType {
    pub fn parse(kind: &str) -> Option<Self> {
        let kind = match kind.to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "slack" => Self::Slack,
            "pagerduty" => Self::PagerDuty,
            "webhook" => Self::Webhook,
            "prometheus-alertmanager" => Self::PrometheusAlertmanager,
            "opsgenie" => Self::OpsGenie,
            "telegram" => Self::Telegram,
            "line" => Self::Line,
            "pushover" => Self::Pushover,
            "threema" => Self::Threema,
            "discord" => Self::Discord,
            "teams" => Self::Teams,
            "googlechat" => Self::GoogleChat,
            "victorops" => Self::VictorOps,
            "kafka" => Self::Kafka,
            "sensugo" => Self::SensuGo,
            "dingding" => Self::DingDing,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Slack => "slack",
            Self::PagerDuty => "pagerduty",
            Self::Webhook => "webhook",
            Self::PrometheusAlertmanager => "prometheus-alertmanager",
            Self::OpsGenie => "opsgenie",
            Self::Telegram => "telegram",
            Self::Line => "LINE",
            Self::Pushover => "pushover",
            Self::Threema => "threema",
            Self::Discord => "discord",
            Self::Teams => "teams",
            Self::GoogleChat => "googlechat",
            Self::VictorOps => "victorops",
            Self::Kafka => "kafka",
            Self::SensuGo => "sensugo",
            Self::DingDing => "dingding",
        }
    }

    /// Settings that older releases stored in plaintext but that belong in
    /// secure settings.
    pub fn secure_keys(self) -> &'static [&'static str] {
        match self {
            Self::Slack => &["url", "token"],
            Self::PagerDuty => &["integrationKey"],
            Self::Webhook => &["password"],
            Self::PrometheusAlertmanager => &["basicAuthPassword"],
            Self::OpsGenie => &["apiKey"],
            Self::Telegram => &["bottoken"],
            Self::Line => &["token"],
            Self::Pushover => &["apiToken", "userKey"],
            Self::Threema => &["api_secret"],
            Self::Email
            | Self::Discord
            | Self::Teams
            | Self::GoogleChat
            | Self::VictorOps
            | Self::Kafka
            | Self::SensuGo
            | Self::DingDing => &[],
        }
    }

    /// Each entry lists alternatives; at least one of them must be set.
    fn required_settings(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::Email => &[&["addresses"]],
            Self::Slack => &[&["url", "token"]],
            Self::PagerDuty => &[&["integrationKey"]],
            Self::Webhook => &[&["url"]],
            Self::PrometheusAlertmanager => &[&["url"]],
            Self::OpsGenie => &[&["apiKey"]],
            Self::Telegram => &[&["bottoken"], &["chatid"]],
            Self::Line => &[&["token"]],
            Self::Pushover => &[&["apiToken"], &["userKey"]],
            Self::Threema => &[&["gateway_id"], &["recipient_id"], &["api_secret"]],
            Self::Discord => &[&["url"]],
            Self::Teams => &[&["url"]],
            Self::GoogleChat => &[&["url"]],
            Self::VictorOps => &[&["url"]],
            Self::Kafka => &[&["kafkaRestProxy"], &["kafkaTopic"]],
            Self::SensuGo => &[&["url"], &["apikey"]],
            Self::DingDing => &[&["url"]],
        }
    }

    /// Checks that the integration carries every setting it needs to be
    /// built, looking in both plain and secure settings.
    pub fn validate(
        self,
        settings: &Map<String, Value>,
        secure_settings: &BTreeMap<String, String>,
    ) -> Result<(), DomainError> {
        let present = |key: &str| {
            secure_settings.get(key).is_some_and(|v| !v.is_empty())
                || match settings.get(key) {
                    None | Some(Value::Null) => false,
                    Some(Value::String(s)) => !s.trim().is_empty(),
                    Some(_) => true,
                }
        };

        for alternatives in self.required_settings() {
            if !alternatives.iter().any(|key| present(key)) {
                return Err(DomainError::MissingSetting {
                    kind: self.as_str().to_string(),
                    keys: alternatives.join(", "),
                });
            }
        }
        Ok(())
    }
}
