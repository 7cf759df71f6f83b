//! Dates with variable-level precision
//!
//! Dates as they appear in DRS filenames and paths (`1850`, `185001`,
//! `18500101`, `1850010100`) carry an implicit granularity: the number of
//! components written down. [`PrecisionDate`] keeps that granularity as an
//! explicit [`Precision`] so that it can be rendered back to the same string
//! and so that `1850` (a year) and `185001` (a month) are distinguishable.
//!
//! These types are for labelling, not calendar math. The only arithmetic is
//! stepping by one unit at the stored precision ([`PrecisionDate::increment`],
//! [`PrecisionDate::decrement`]).
//!
//! # Equality vs. ordering
//!
//! Equality requires both the calendar instant and the precision to match.
//! Ordering is by calendar instant only and goes through
//! [`PrecisionDate::compare`], which accepts another `PrecisionDate`, a
//! `NaiveDateTime`, or a plain `NaiveDate` (in which case only the date
//! portion is compared). No `PartialOrd` is provided because an
//! instant-only ordering cannot agree with precision-aware equality.
//!
//! ```rust
//! use mdtf_common::date::PrecisionDate;
//!
//! let year: PrecisionDate = "1850".parse().unwrap();
//! let month: PrecisionDate = "185001".parse().unwrap();
//! assert_ne!(year, month);
//! assert!(year.is_on_or_before(month) && year.is_on_or_after(month));
//! assert_eq!(month.increment().unwrap().to_string(), "185002");
//! ```

use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Granularity at which a date was specified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    Year = 1,
    Month = 2,
    Day = 3,
    Hour = 4,
}

impl Precision {
    /// Precision implied by the number of date components supplied
    pub fn from_components(count: usize) -> Option<Self> {
        match count {
            1 => Some(Precision::Year),
            2 => Some(Precision::Month),
            3 => Some(Precision::Day),
            4 => Some(Precision::Hour),
            _ => None,
        }
    }

    /// Number of components (1-4)
    pub fn components(self) -> usize {
        self as usize
    }

    /// Width of the fixed-width `YYYY[MM[DD[HH]]]` rendering
    pub fn width(self) -> usize {
        2 + 2 * self.components()
    }
}

/// Value accepted by [`PrecisionDate::compare`]
#[derive(Debug, Clone, Copy)]
pub enum Comparand {
    /// Another precision-aware date; compared by instant
    Date(PrecisionDate),
    /// A plain timestamp; compared by instant
    DateTime(NaiveDateTime),
    /// A plain calendar date; compared by date portion only
    Calendar(NaiveDate),
}

impl From<PrecisionDate> for Comparand {
    fn from(d: PrecisionDate) -> Self {
        Comparand::Date(d)
    }
}

impl From<&PrecisionDate> for Comparand {
    fn from(d: &PrecisionDate) -> Self {
        Comparand::Date(*d)
    }
}

impl From<NaiveDateTime> for Comparand {
    fn from(dt: NaiveDateTime) -> Self {
        Comparand::DateTime(dt)
    }
}

impl From<NaiveDate> for Comparand {
    fn from(d: NaiveDate) -> Self {
        Comparand::Calendar(d)
    }
}

/// Immutable date tagged with the precision it was specified at
///
/// Components finer than the precision are fixed at their defaults
/// (month and day 1, hour 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrecisionDate {
    instant: NaiveDateTime,
    precision: Precision,
}

impl PrecisionDate {
    /// Build from numeric components.
    ///
    /// `rest` holds month, day and hour in that order; its length sets the
    /// precision. Fails with [`Error::MalformedInput`] for more than three
    /// trailing components or for an impossible calendar date.
    pub fn from_parts(year: i32, rest: &[u32]) -> Result<Self> {
        let precision = Precision::from_components(rest.len() + 1).ok_or_else(|| {
            Error::MalformedInput(format!("{} date components for year {}", rest.len() + 1, year))
        })?;
        let month = rest.first().copied().unwrap_or(1);
        let day = rest.get(1).copied().unwrap_or(1);
        let hour = rest.get(2).copied().unwrap_or(0);
        let instant = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .ok_or_else(|| {
                Error::MalformedInput(format!(
                    "invalid date {:04}-{:02}-{:02} {:02}h",
                    year, month, day, hour
                ))
            })?;
        Ok(Self { instant, precision })
    }

    pub fn year_only(year: i32) -> Result<Self> {
        Self::from_parts(year, &[])
    }

    pub fn year_month(year: i32, month: u32) -> Result<Self> {
        Self::from_parts(year, &[month])
    }

    pub fn ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        Self::from_parts(year, &[month, day])
    }

    pub fn ymdh(year: i32, month: u32, day: u32, hour: u32) -> Result<Self> {
        Self::from_parts(year, &[month, day, hour])
    }

    /// Rebuild from an instant, truncated to `precision`
    fn truncated(instant: NaiveDateTime, precision: Precision) -> Result<Self> {
        let rest = [instant.month(), instant.day(), instant.hour()];
        Self::from_parts(instant.year(), &rest[..precision.components() - 1])
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn year(&self) -> i32 {
        self.instant.year()
    }

    pub fn month(&self) -> u32 {
        self.instant.month()
    }

    pub fn day(&self) -> u32 {
        self.instant.day()
    }

    pub fn hour(&self) -> u32 {
        self.instant.hour()
    }

    /// Calendar instant, ignoring precision
    pub fn datetime(&self) -> NaiveDateTime {
        self.instant
    }

    /// Date portion of the calendar instant
    pub fn date(&self) -> NaiveDate {
        self.instant.date()
    }

    /// Order `self` relative to `other` by calendar instant.
    ///
    /// Precision never takes part. A plain [`NaiveDate`] is compared against
    /// the date portion of `self` only.
    pub fn compare(&self, other: impl Into<Comparand>) -> Ordering {
        match other.into() {
            Comparand::Date(d) => self.instant.cmp(&d.instant),
            Comparand::DateTime(dt) => self.instant.cmp(&dt),
            Comparand::Calendar(d) => self.date().cmp(&d),
        }
    }

    pub fn is_before(&self, other: impl Into<Comparand>) -> bool {
        self.compare(other) == Ordering::Less
    }

    pub fn is_on_or_before(&self, other: impl Into<Comparand>) -> bool {
        self.compare(other) != Ordering::Greater
    }

    pub fn is_after(&self, other: impl Into<Comparand>) -> bool {
        self.compare(other) == Ordering::Greater
    }

    pub fn is_on_or_after(&self, other: impl Into<Comparand>) -> bool {
        self.compare(other) != Ordering::Less
    }

    /// Copy advanced by one unit at the stored precision
    pub fn increment(&self) -> Result<Self> {
        self.step(1)
    }

    /// Copy moved back by one unit at the stored precision
    pub fn decrement(&self) -> Result<Self> {
        self.step(-1)
    }

    fn step(&self, sign: i32) -> Result<Self> {
        let out_of_range = || Error::DateOutOfRange(format!("{} stepped by {}", self, sign));
        match self.precision {
            Precision::Year => Self::year_only(self.year() + sign).map_err(|_| out_of_range()),
            Precision::Month => {
                // months counted from year 0 so that 12 -> 1 wraps the year
                let index = self.year() * 12 + self.month() as i32 - 1 + sign;
                Self::year_month(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
                    .map_err(|_| out_of_range())
            }
            Precision::Day => {
                let instant = self
                    .instant
                    .checked_add_signed(Duration::days(sign as i64))
                    .ok_or_else(out_of_range)?;
                Self::truncated(instant, Precision::Day)
            }
            Precision::Hour => {
                let instant = self
                    .instant
                    .checked_add_signed(Duration::hours(sign as i64))
                    .ok_or_else(out_of_range)?;
                Self::truncated(instant, Precision::Hour)
            }
        }
    }

    /// Fixed-width `YYYY`, `YYYYMM`, `YYYYMMDD` or `YYYYMMDDHH` rendering
    pub fn format(&self) -> String {
        match self.precision {
            Precision::Year => format!("{:04}", self.year()),
            Precision::Month => format!("{:04}{:02}", self.year(), self.month()),
            Precision::Day => format!("{:04}{:02}{:02}", self.year(), self.month(), self.day()),
            Precision::Hour => format!(
                "{:04}{:02}{:02}{:02}",
                self.year(),
                self.month(),
                self.day(),
                self.hour()
            ),
        }
    }
}

impl PartialEq<NaiveDateTime> for PrecisionDate {
    fn eq(&self, other: &NaiveDateTime) -> bool {
        self.instant == *other
    }
}

impl PartialEq<NaiveDate> for PrecisionDate {
    fn eq(&self, other: &NaiveDate) -> bool {
        self.date() == *other
    }
}

fn parse_component<T: FromStr>(s: &str, input: &str) -> Result<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedInput(input.to_string()));
    }
    s.parse()
        .map_err(|_| Error::MalformedInput(input.to_string()))
}

impl FromStr for PrecisionDate {
    type Err = Error;

    /// Parse `YYYY`, `YYYYMM`, `YYYYMMDD`, `YYYYMMDDHH` or `YYYY-MM-DD[-HH]`
    fn from_str(s: &str) -> Result<Self> {
        if s.contains('-') {
            let parts: Vec<&str> = s.split('-').collect();
            if !(3..=4).contains(&parts.len()) {
                return Err(Error::MalformedInput(s.to_string()));
            }
            let year: i32 = parse_component(parts[0], s)?;
            let rest = parts[1..]
                .iter()
                .map(|p| parse_component::<u32>(p, s))
                .collect::<Result<Vec<_>>>()?;
            return Self::from_parts(year, &rest);
        }

        let precision = [Precision::Year, Precision::Month, Precision::Day, Precision::Hour]
            .into_iter()
            .find(|p| p.width() == s.len())
            .ok_or_else(|| Error::MalformedInput(s.to_string()))?;
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedInput(s.to_string()));
        }
        let year: i32 = parse_component(&s[0..4], s)?;
        let rest = (1..precision.components())
            .map(|i| parse_component::<u32>(&s[2 + 2 * i..4 + 2 * i], s))
            .collect::<Result<Vec<_>>>()?;
        Self::from_parts(year, &rest)
    }
}

impl fmt::Display for PrecisionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for PrecisionDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrecisionDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
