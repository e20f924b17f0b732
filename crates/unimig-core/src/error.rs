use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("failed to generate UID")]
    UidExhausted,
    #[error("invalid alert settings: {0}")]
    InvalidSettings(String),
    #[error("alert has no conditions")]
    NoConditions,
    #[error("invalid condition: {0}")]
    InvalidCondition(String),
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),
    #[error("invalid query model: {0}")]
    InvalidQuery(String),
    #[error("invalid matcher: {0}")]
    InvalidMatcher(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("notifier {0} is not supported")]
    UnsupportedNotifier(String),
    #[error("notifier {kind} requires one of: {keys}")]
    MissingSetting { kind: String, keys: String },
    #[error("silence requires a rule UID")]
    SilenceWithoutRule,
}
