use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::rule::SILENCE_RULE_UID_LABEL;

pub const NO_DATA_ALERT_NAME: &str = "DatasourceNoData";
pub const ERROR_ALERT_NAME: &str = "DatasourceError";
const ALERT_NAME_LABEL: &str = "alertname";
const CREATED_BY: &str = "Grafana Migration";
const COMMENT: &str = "Created during auto migration to unified alerting";

/// Equality matcher on one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceMatcher {
    pub name: String,
    pub value: String,
}

impl SilenceMatcher {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Mutes the synthetic NoData/Error alerts of one migrated rule, standing
/// in for legacy `keep_state` behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Silence {
    pub id: String,
    pub matchers: Vec<SilenceMatcher>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_by: String,
    pub comment: String,
}

impl Silence {
    fn for_alert(
        alert_name: &str,
        rule_uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if rule_uid.is_empty() {
            return Err(DomainError::SilenceWithoutRule);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            matchers: vec![
                SilenceMatcher::new(ALERT_NAME_LABEL, alert_name),
                SilenceMatcher::new(SILENCE_RULE_UID_LABEL, rule_uid),
            ],
            starts_at: now,
            ends_at: now + Duration::days(365),
            created_by: CREATED_BY.to_string(),
            comment: COMMENT.to_string(),
        })
    }

    pub fn for_no_data(rule_uid: &str, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Self::for_alert(NO_DATA_ALERT_NAME, rule_uid, now)
    }

    pub fn for_error(rule_uid: &str, now: DateTime<Utc>) -> Result<Self, DomainError> {
        Self::for_alert(ERROR_ALERT_NAME, rule_uid, now)
    }

    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at < self.ends_at
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.matchers
            .iter()
            .all(|m| labels.get(&m.name) == Some(&m.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn no_data_silence_targets_rule_and_alert_name() {
        let silence = Silence::for_no_data("rule-1", now()).unwrap();
        let labels = BTreeMap::from([
            ("alertname".to_string(), "DatasourceNoData".to_string()),
            (SILENCE_RULE_UID_LABEL.to_string(), "rule-1".to_string()),
        ]);
        assert!(silence.matches(&labels));
        assert_eq!(silence.created_by, "Grafana Migration");
    }

    #[test]
    fn error_silence_ignores_other_rules() {
        let silence = Silence::for_error("rule-1", now()).unwrap();
        let labels = BTreeMap::from([
            ("alertname".to_string(), "DatasourceError".to_string()),
            (SILENCE_RULE_UID_LABEL.to_string(), "rule-2".to_string()),
        ]);
        assert!(!silence.matches(&labels));
    }

    #[test]
    fn silence_lasts_one_year() {
        let silence = Silence::for_no_data("rule-1", now()).unwrap();
        assert!(silence.is_active(now()));
        assert!(silence.is_active(now() + Duration::days(364)));
        assert!(!silence.is_active(now() + Duration::days(365)));
    }

    #[test]
    fn silence_requires_rule_uid() {
        assert_eq!(
            Silence::for_error("", now()),
            Err(DomainError::SilenceWithoutRule)
        );
    }
}
