use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

const MILLIS_PER_SECOND: u128 = 1000;
const MILLIS_PER_MINUTE: u128 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u128 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u128 = 24 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: u128 = 7 * MILLIS_PER_DAY;
const MILLIS_PER_YEAR: u128 = 365 * MILLIS_PER_DAY;

static DURATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(\d+)y)?(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?(?:(\d+)ms)?$",
    )
    .unwrap()
});

/// A duration written the way alertmanager configs spell them: `52w`,
/// `1h30m`, `500ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ModelDuration(pub Duration);

impl ModelDuration {
    pub const fn from_hours(hours: u64) -> Self {
        Self(Duration::from_secs(hours * 3600))
    }

    pub fn as_duration(self) -> Duration {
        self.0
    }
}

impl From<Duration> for ModelDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl fmt::Display for ModelDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ms = self.0.as_millis();
        if ms == 0 {
            return write!(f, "0s");
        }
        // years and weeks only when exact, "90d" reads better than "12w6d"
        let units: [(&str, u128, bool); 7] = [
            ("y", MILLIS_PER_YEAR, true),
            ("w", MILLIS_PER_WEEK, true),
            ("d", MILLIS_PER_DAY, false),
            ("h", MILLIS_PER_HOUR, false),
            ("m", MILLIS_PER_MINUTE, false),
            ("s", MILLIS_PER_SECOND, false),
            ("ms", 1, false),
        ];
        for (unit, mult, exact) in units {
            if exact && ms % mult != 0 {
                continue;
            }
            let v = ms / mult;
            if v > 0 {
                write!(f, "{v}{unit}")?;
                ms -= v * mult;
            }
        }
        Ok(())
    }
}

impl FromStr for ModelDuration {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "0" {
            return Ok(Self::default());
        }
        let caps = DURATION_PATTERN
            .captures(s)
            .filter(|_| !s.is_empty())
            .ok_or_else(|| DomainError::InvalidDuration(s.to_string()))?;

        let mults = [
            MILLIS_PER_YEAR,
            MILLIS_PER_WEEK,
            MILLIS_PER_DAY,
            MILLIS_PER_HOUR,
            MILLIS_PER_MINUTE,
            MILLIS_PER_SECOND,
            1,
        ];
        let mut total: u128 = 0;
        for (i, mult) in mults.into_iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                let v: u128 = m
                    .as_str()
                    .parse()
                    .map_err(|_| DomainError::InvalidDuration(s.to_string()))?;
                total = v
                    .checked_mul(mult)
                    .and_then(|x| total.checked_add(x))
                    .ok_or_else(|| DomainError::InvalidDuration(s.to_string()))?;
            }
        }
        let millis =
            u64::try_from(total).map_err(|_| DomainError::InvalidDuration(s.to_string()))?;
        Ok(Self(Duration::from_millis(millis)))
    }
}

impl Serialize for ModelDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModelDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_interval_prints_as_weeks() {
        assert_eq!(ModelDuration::from_hours(8736).to_string(), "52w");
    }

    #[test]
    fn display_combines_units() {
        let d = ModelDuration(Duration::from_secs(90 * 60));
        assert_eq!(d.to_string(), "1h30m");
        assert_eq!(ModelDuration(Duration::from_secs(90 * 86400)).to_string(), "90d");
        assert_eq!(ModelDuration::default().to_string(), "0s");
    }

    #[test]
    fn parse_accepts_display_output() {
        for raw in ["52w", "1h30m", "10s", "1y", "2d3h", "250ms"] {
            let d: ModelDuration = raw.parse().unwrap();
            assert_eq!(d.to_string(), raw);
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<ModelDuration>().is_err());
        assert!("5 minutes".parse::<ModelDuration>().is_err());
        assert!("1m1h".parse::<ModelDuration>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ModelDuration::from_hours(1)).unwrap();
        assert_eq!(json, "\"1h\"");
        let back: ModelDuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ModelDuration::from_hours(1));
    }
}
