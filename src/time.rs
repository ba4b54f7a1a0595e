//! Time-of-day values ("HH:MM", 24-hour) used throughout a planning request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimeParseError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minutes since midnight.
///
/// Parsing only accepts valid clock times (00:00 to 23:59). Arithmetic may
/// carry a value past midnight; such values render with hours >= 24 instead
/// of wrapping, so an overrunning day stays visible in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn add_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    /// Signed difference `self - other` in minutes.
    pub fn minutes_since(self, other: TimeOfDay) -> i64 {
        i64::from(self.0) - i64::from(other.0)
    }

    /// True when the value is past 23:59.
    pub fn is_next_day(self) -> bool {
        self.0 >= MINUTES_PER_DAY
    }

    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        let trimmed = value.trim();
        let (hours, minutes) = trimmed
            .split_once(':')
            .ok_or_else(|| TimeParseError::Format(value.to_string()))?;

        let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 || !digits(hours) || !digits(minutes) {
            return Err(TimeParseError::Format(value.to_string()));
        }

        let hours: u32 = hours
            .parse()
            .map_err(|_| TimeParseError::Format(value.to_string()))?;
        let minutes: u32 = minutes
            .parse()
            .map_err(|_| TimeParseError::Format(value.to_string()))?;

        if hours > 23 || minutes > 59 {
            return Err(TimeParseError::OutOfRange(value.to_string()));
        }

        Ok(Self(hours * 60 + minutes))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}
