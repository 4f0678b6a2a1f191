//! Rate-limit window: parse a human max-age string and decide whether a
//! check may be skipped.
//!
//! Grammar is `<digits><unit>`, case-insensitive, whitespace ignored. Units
//! are hours (`h`, `hr`, `hour`), days (`d`, `day`) and months (`m`, `mo`,
//! `month`); every `s` is stripped from the unit first, so plurals work. A
//! month is a fixed 30 days.

use std::fmt;

const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;
const MONTH_SECS: i64 = 2_592_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaxAgeError {
    #[error("max age {0:?} does not start with a number")]
    MissingAmount(String),
    #[error("max age amount in {0:?} is too large")]
    AmountOverflow(String),
    #[error("unknown max age unit {unit:?} in {input:?}")]
    UnknownUnit { input: String, unit: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Hour,
    Day,
    Month,
}

impl AgeUnit {
    pub const fn seconds(self) -> i64 {
        match self {
            AgeUnit::Hour => HOUR_SECS,
            AgeUnit::Day => DAY_SECS,
            AgeUnit::Month => MONTH_SECS,
        }
    }

    fn from_suffix(unit: &str) -> Option<Self> {
        match unit {
            "h" | "hr" | "hour" => Some(AgeUnit::Hour),
            "d" | "day" => Some(AgeUnit::Day),
            "m" | "mo" | "month" => Some(AgeUnit::Month),
            _ => None,
        }
    }
}

/// A parsed max-age window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxAge {
    pub amount: u64,
    pub unit: AgeUnit,
}

impl MaxAge {
    /// Parse a max-age string. `Ok(None)` means the input was blank (no rate limit).
    pub fn parse(input: &str) -> Result<Option<MaxAge>, MaxAgeError> {
        let s: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if s.is_empty() {
            return Ok(None);
        }
        let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(MaxAgeError::MissingAmount(input.to_string()));
        }
        let amount = s[..digits]
            .parse::<u64>()
            .map_err(|_| MaxAgeError::AmountOverflow(input.to_string()))?;
        let unit = s[digits..].replace('s', "");
        match AgeUnit::from_suffix(&unit) {
            Some(unit) => Ok(Some(MaxAge { amount, unit })),
            None => Err(MaxAgeError::UnknownUnit {
                input: input.to_string(),
                unit,
            }),
        }
    }

    /// Window length in seconds (saturating).
    pub fn as_secs(self) -> i64 {
        i64::try_from(self.amount)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.unit.seconds())
    }
}

impl fmt::Display for MaxAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            AgeUnit::Hour => "h",
            AgeUnit::Day => "d",
            AgeUnit::Month => "mo",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}

/// Window length for a raw max-age string; anything blank or unparsable is 0.
pub fn duration_secs(input: &str) -> i64 {
    match MaxAge::parse(input) {
        Ok(Some(age)) => age.as_secs(),
        _ => 0,
    }
}

/// Whether a check can be skipped because the sidecar was refreshed within
/// the window. A missing time, a missing window or a zero-length window never
/// skips.
pub fn should_skip(sidecar_time: Option<i64>, max_age: Option<MaxAge>, now: i64) -> bool {
    let (Some(recorded), Some(age)) = (sidecar_time, max_age) else {
        return false;
    };
    let window = age.as_secs();
    if recorded <= 0 || window <= 0 {
        return false;
    }
    now < recorded.saturating_add(window)
}
