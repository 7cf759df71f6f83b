//! Sampling frequencies
//!
//! A [`Frequency`] is a label for a period of time: a positive quantity of a
//! [`FrequencyUnit`]. Durations are only approximate (a year is 365 days, a
//! month 30) and never take part in equality: `24hr` and `1dy` are different
//! labels and compare unequal.
//!
//! Three label vocabularies are produced:
//! - [`Frequency::format`]: `{quantity}{unit}` (`3hr`, `1mo`)
//! - [`Frequency::format_local`]: local file-naming labels (`mon`, `day`)
//! - [`Frequency::format_workflow`]: post-processing workflow labels
//!   (`monthly`, `annual`, ...)

use crate::{Error, Result};
use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Leading quantity followed by unit letters, e.g. `3hr`, `6 hourly`, `1_day`
static QUANTITY_UNIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<quantity>\d+)[ _]*(?P<unit>[a-zA-Z]+)").unwrap());

/// Unitless words accepted by [`Frequency::from_str`]
const WORD_TABLE: &[(&[&str], u32, FrequencyUnit)] = &[
    (&["decadal", "dec"], 10, FrequencyUnit::Year),
    (&["yearly", "year", "y", "annually", "annual", "ann"], 1, FrequencyUnit::Year),
    (&["seasonally", "seasonal", "season"], 1, FrequencyUnit::Season),
    (&["monthly", "month", "mon", "mo"], 1, FrequencyUnit::Month),
    (&["weekly", "week", "wk", "w"], 1, FrequencyUnit::Week),
    (&["daily", "day", "d", "diurnal", "diurnally"], 1, FrequencyUnit::Day),
    (&["hourly", "hour", "hr", "h"], 1, FrequencyUnit::Hour),
];

/// Unit of a [`Frequency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrequencyUnit {
    Year,
    Season,
    Month,
    Week,
    Day,
    Hour,
}

impl FrequencyUnit {
    /// Select a unit by the first letter of `name` (case-insensitive)
    pub fn from_name(name: &str) -> Result<Self> {
        match name.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('y') => Ok(FrequencyUnit::Year),
            Some('s') => Ok(FrequencyUnit::Season),
            Some('m') => Ok(FrequencyUnit::Month),
            Some('w') => Ok(FrequencyUnit::Week),
            Some('d') => Ok(FrequencyUnit::Day),
            Some('h') => Ok(FrequencyUnit::Hour),
            _ => Err(Error::MalformedInput(format!("frequency unit '{}'", name))),
        }
    }

    /// Two-letter code used by the default label
    pub fn code(self) -> &'static str {
        match self {
            FrequencyUnit::Year => "yr",
            FrequencyUnit::Season => "se",
            FrequencyUnit::Month => "mo",
            FrequencyUnit::Week => "wk",
            FrequencyUnit::Day => "dy",
            FrequencyUnit::Hour => "hr",
        }
    }

    /// Approximate length of one unit
    pub fn approx_duration(self) -> Duration {
        match self {
            FrequencyUnit::Year => Duration::days(365),
            FrequencyUnit::Season => Duration::days(91),
            FrequencyUnit::Month => Duration::days(30),
            FrequencyUnit::Week => Duration::days(7),
            FrequencyUnit::Day => Duration::days(1),
            FrequencyUnit::Hour => Duration::hours(1),
        }
    }
}

/// Positive quantity of a [`FrequencyUnit`]
///
/// Equality is on `(quantity, unit)` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frequency {
    quantity: u32,
    unit: FrequencyUnit,
}

impl Frequency {
    /// Build from a quantity and a unit name; the unit's first letter selects it
    pub fn new(quantity: u32, unit: &str) -> Result<Self> {
        Self::with_unit(quantity, FrequencyUnit::from_name(unit)?)
    }

    pub fn with_unit(quantity: u32, unit: FrequencyUnit) -> Result<Self> {
        if quantity == 0 {
            return Err(Error::MalformedInput(format!("zero quantity for {}", unit.code())));
        }
        Ok(Self { quantity, unit })
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Approximate period length; `1mo` is 30 days, `1yr` 365.
    ///
    /// Saturates at [`Duration::MAX`] for quantities beyond chrono's range.
    pub fn approx_duration(&self) -> Duration {
        let seconds = self.unit.approx_duration().num_seconds() * i64::from(self.quantity);
        Duration::try_seconds(seconds).unwrap_or(Duration::MAX)
    }

    /// Default `{quantity}{unit}` label
    pub fn format(&self) -> String {
        format!("{}{}", self.quantity, self.unit.code())
    }

    /// Local file-naming label.
    ///
    /// Hourly frequencies use the default label at any quantity. Otherwise only
    /// single monthly (`mon`) and daily (`day`) frequencies have a local label.
    pub fn format_local(&self) -> Result<String> {
        if self.unit == FrequencyUnit::Hour {
            return Ok(self.format());
        }
        self.require_single("local")?;
        match self.unit {
            FrequencyUnit::Month => Ok("mon".to_string()),
            FrequencyUnit::Day => Ok("day".to_string()),
            _ => Err(self.precondition("local", "no local label for this unit")),
        }
    }

    /// Post-processing workflow label; single quantities only, no weekly label
    pub fn format_workflow(&self) -> Result<String> {
        self.require_single("workflow")?;
        let label = match self.unit {
            FrequencyUnit::Year => "annual",
            FrequencyUnit::Season => "seasonal",
            FrequencyUnit::Month => "monthly",
            FrequencyUnit::Day => "daily",
            FrequencyUnit::Hour => "hourly",
            FrequencyUnit::Week => {
                return Err(self.precondition("workflow", "weekly data not used in workflow"))
            }
        };
        Ok(label.to_string())
    }

    fn require_single(&self, vocabulary: &'static str) -> Result<()> {
        if self.quantity != 1 {
            return Err(self.precondition(vocabulary, "quantity must be 1"));
        }
        Ok(())
    }

    fn precondition(&self, vocabulary: &'static str, reason: &str) -> Error {
        Error::FormatPrecondition {
            value: self.format(),
            vocabulary,
            reason: reason.to_string(),
        }
    }
}

impl FromStr for Frequency {
    type Err = Error;

    /// Parse a `quantity+unit` composite or a unitless frequency word
    fn from_str(s: &str) -> Result<Self> {
        if let Some(caps) = QUANTITY_UNIT_REGEX.captures(s) {
            let quantity = caps["quantity"]
                .parse()
                .map_err(|_| Error::MalformedInput(s.to_string()))?;
            return Self::new(quantity, &caps["unit"]);
        }
        WORD_TABLE
            .iter()
            .find(|(words, _, _)| words.contains(&s))
            .map(|&(_, quantity, unit)| Self { quantity, unit })
            .ok_or_else(|| Error::MalformedInput(format!("frequency '{}'", s)))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
