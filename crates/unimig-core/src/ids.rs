use std::collections::HashSet;

use uuid::Uuid;

use crate::error::DomainError;

const MAX_GENERATE_ATTEMPTS: usize = 5;
const SHORT_UID_LEN: usize = 14;

/// Random 14 character identifier, always starting with a letter.
pub fn generate_short_uid() -> String {
    let id = Uuid::new_v4();
    let lead = char::from(b'a' + id.as_bytes()[0] % 26);
    let hex = id.simple().to_string();

    let mut uid = String::with_capacity(SHORT_UID_LEN);
    uid.push(lead);
    uid.push_str(&hex[1..SHORT_UID_LEN]);
    uid
}

/// Outcome of claiming a UID for a migrated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidClaim {
    Reused(String),
    ReplacedEmpty(String),
    ReplacedCollision(String),
}

impl UidClaim {
    pub fn uid(&self) -> &str {
        match self {
            Self::Reused(uid) | Self::ReplacedEmpty(uid) | Self::ReplacedCollision(uid) => uid,
        }
    }

    pub fn into_uid(self) -> String {
        match self {
            Self::Reused(uid) | Self::ReplacedEmpty(uid) | Self::ReplacedCollision(uid) => uid,
        }
    }
}

/// Set of UIDs handed out during one migration pass.
///
/// When `case_insensitive` is set, two UIDs differing only in case are
/// treated as the same, matching stores with case-insensitive collation.
#[derive(Debug, Clone, Default)]
pub struct UidSet {
    seen: HashSet<String>,
    case_insensitive: bool,
}

impl UidSet {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            seen: HashSet::new(),
            case_insensitive,
        }
    }

    fn key(&self, uid: &str) -> String {
        if self.case_insensitive {
            uid.to_lowercase()
        } else {
            uid.to_string()
        }
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.seen.contains(&self.key(uid))
    }

    pub fn add(&mut self, uid: &str) {
        let key = self.key(uid);
        self.seen.insert(key);
    }

    pub fn generate(&mut self) -> Result<String, DomainError> {
        self.generate_with(generate_short_uid)
    }

    /// Draws candidates from `source` until one is unseen, giving up after
    /// five attempts.
    pub fn generate_with<F>(&mut self, mut source: F) -> Result<String, DomainError>
    where
        F: FnMut() -> String,
    {
        for _ in 0..MAX_GENERATE_ATTEMPTS {
            let candidate = source();
            if !self.contains(&candidate) {
                self.add(&candidate);
                return Ok(candidate);
            }
        }
        Err(DomainError::UidExhausted)
    }

    /// Keeps `legacy` when it is non-empty and not yet taken, otherwise
    /// allocates a fresh one.
    pub fn claim(&mut self, legacy: &str) -> Result<UidClaim, DomainError> {
        if legacy.is_empty() {
            return Ok(UidClaim::ReplacedEmpty(self.generate()?));
        }
        if self.contains(legacy) {
            return Ok(UidClaim::ReplacedCollision(self.generate()?));
        }
        self.add(legacy);
        Ok(UidClaim::Reused(legacy.to_string()))
    }
}
