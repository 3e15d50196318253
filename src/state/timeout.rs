//! Selectable keep-awake durations

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ParseTimeoutError;

/// How long a session keeps the display awake.
///
/// `Indefinite` orders after every finite value and is never decremented,
/// so an indefinite session only ends on an explicit stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "TimeoutRepr", into = "TimeoutRepr")]
pub enum Timeout {
    Finite(Duration),
    Indefinite,
}

impl Timeout {
    pub const ZERO: Timeout = Timeout::Finite(Duration::ZERO);

    pub const fn from_secs(secs: u64) -> Self {
        Timeout::Finite(Duration::from_secs(secs))
    }

    pub const fn from_mins(mins: u64) -> Self {
        Timeout::Finite(Duration::from_secs(mins * 60))
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, Timeout::Indefinite)
    }

    pub fn is_finite(&self) -> bool {
        !self.is_indefinite()
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Timeout::Finite(d) if d.is_zero())
    }

    /// Finite length, `None` for indefinite.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Timeout::Finite(d) => Some(*d),
            Timeout::Indefinite => None,
        }
    }

    /// Whole seconds, `None` for indefinite.
    pub fn as_secs(&self) -> Option<u64> {
        self.as_duration().map(|d| d.as_secs())
    }

    /// Subtract `step`, clamping at zero. Indefinite is left untouched.
    pub fn saturating_sub(self, step: Duration) -> Self {
        match self {
            Timeout::Finite(d) => Timeout::Finite(d.saturating_sub(step)),
            Timeout::Indefinite => Timeout::Indefinite,
        }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = match self {
            Timeout::Indefinite => return f.write_str("indefinite"),
            Timeout::Finite(d) => d.as_secs(),
        };

        if secs != 0 && secs % 3600 == 0 {
            write!(f, "{}h", secs / 3600)
        } else if secs != 0 && secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{}s", secs)
        }
    }
}

impl FromStr for Timeout {
    type Err = ParseTimeoutError;

    /// Accepts `indefinite` (or `inf`, `never`), bare seconds, or a number
    /// with an `s`, `m` or `h` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseTimeoutError::Empty);
        }

        match s.to_ascii_lowercase().as_str() {
            "indefinite" | "inf" | "infinite" | "never" => return Ok(Timeout::Indefinite),
            _ => {}
        }

        let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(idx) => s.split_at(idx),
            None => (s, "s"),
        };

        let value: u64 = digits
            .parse()
            .map_err(|_| ParseTimeoutError::Invalid(s.to_string()))?;

        let multiplier = match unit.trim() {
            "s" | "sec" | "secs" => 1,
            "m" | "min" | "mins" => 60,
            "h" | "hr" | "hrs" => 3600,
            _ => return Err(ParseTimeoutError::Invalid(s.to_string())),
        };

        value
            .checked_mul(multiplier)
            .map(Timeout::from_secs)
            .ok_or_else(|| ParseTimeoutError::Invalid(s.to_string()))
    }
}

/// Wire form: whole seconds, or the string "indefinite".
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TimeoutRepr {
    Seconds(u64),
    Text(String),
}

impl TryFrom<TimeoutRepr> for Timeout {
    type Error = ParseTimeoutError;

    fn try_from(repr: TimeoutRepr) -> Result<Self, Self::Error> {
        match repr {
            TimeoutRepr::Seconds(secs) => Ok(Timeout::from_secs(secs)),
            TimeoutRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Timeout> for TimeoutRepr {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::Finite(d) => TimeoutRepr::Seconds(d.as_secs()),
            Timeout::Indefinite => TimeoutRepr::Text("indefinite".to_string()),
        }
    }
}
