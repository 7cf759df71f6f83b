//! Closed date intervals
//!
//! A [`DateInterval`] spans two [`PrecisionDate`]s and contains both of them.
//! It is what a DRS filename's `START-END` suffix decodes to, and what callers
//! test against requested analysis periods.

use crate::date::{Comparand, PrecisionDate};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Either a whole interval or a single instant
///
/// [`DateInterval::overlaps`] and [`DateInterval::contains`] treat a point as
/// a degenerate interval.
#[derive(Debug, Clone, Copy)]
pub enum Extent {
    Interval(DateInterval),
    Point(Comparand),
}

impl From<DateInterval> for Extent {
    fn from(r: DateInterval) -> Self {
        Extent::Interval(r)
    }
}

impl From<&DateInterval> for Extent {
    fn from(r: &DateInterval) -> Self {
        Extent::Interval(*r)
    }
}

impl From<PrecisionDate> for Extent {
    fn from(d: PrecisionDate) -> Self {
        Extent::Point(d.into())
    }
}

impl From<&PrecisionDate> for Extent {
    fn from(d: &PrecisionDate) -> Self {
        Extent::Point(d.into())
    }
}

impl From<NaiveDate> for Extent {
    fn from(d: NaiveDate) -> Self {
        Extent::Point(d.into())
    }
}

impl From<NaiveDateTime> for Extent {
    fn from(dt: NaiveDateTime) -> Self {
        Extent::Point(dt.into())
    }
}

/// Closed interval `[start, end]` with `start` strictly before `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateInterval {
    start: PrecisionDate,
    end: PrecisionDate,
}

impl DateInterval {
    /// Fails with [`Error::InvalidRange`] unless `start < end`
    pub fn new(start: PrecisionDate, end: PrecisionDate) -> Result<Self> {
        if !start.is_before(end) {
            return Err(Error::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Build from two strings parsed as [`PrecisionDate`]
    pub fn from_strs(start: &str, end: &str) -> Result<Self> {
        Self::new(start.parse()?, end.parse()?)
    }

    /// Smallest interval containing every date in `dates`
    pub fn from_dates<I>(dates: I) -> Result<Self>
    where
        I: IntoIterator<Item = PrecisionDate>,
    {
        let mut iter = dates.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::MalformedInput("empty set of dates".to_string()))?;
        let (min, max) = iter.fold((first, first), |(min, max), d| {
            (
                if d.is_before(min) { d } else { min },
                if d.is_after(max) { d } else { max },
            )
        });
        Self::new(min, max)
    }

    /// Interval spanning a set of contiguous, nonoverlapping intervals.
    ///
    /// After sorting by start, each interval's end stepped forward one unit
    /// must equal the next interval's start, and that start stepped back one
    /// unit must equal the previous end. Anything else is a gap or an overlap
    /// and fails with [`Error::NonContiguous`].
    pub fn from_contiguous<I>(ranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = DateInterval>,
    {
        let mut ranges: Vec<DateInterval> = ranges.into_iter().collect();
        if ranges.is_empty() {
            return Err(Error::MalformedInput("empty set of date ranges".to_string()));
        }
        ranges.sort_by(|a, b| a.start.compare(b.start));

        for pair in ranges.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.end.increment()? != next.start || next.start.decrement()? != prev.end {
                return Err(Error::NonContiguous {
                    previous: prev.to_string(),
                    next: next.to_string(),
                });
            }
        }
        Ok(Self {
            start: ranges[0].start,
            end: ranges[ranges.len() - 1].end,
        })
    }

    pub fn start(&self) -> PrecisionDate {
        self.start
    }

    pub fn end(&self) -> PrecisionDate {
        self.end
    }

    /// True if `other` shares any instant with this interval
    pub fn overlaps(&self, other: impl Into<Extent>) -> bool {
        match other.into() {
            Extent::Interval(r) => self.start.is_on_or_before(r.end) && r.start.is_on_or_before(self.end),
            Extent::Point(p) => self.holds(p),
        }
    }

    /// True if `other` lies entirely within this interval, endpoints included
    pub fn contains(&self, other: impl Into<Extent>) -> bool {
        match other.into() {
            Extent::Interval(r) => self.start.is_on_or_before(r.start) && self.end.is_on_or_after(r.end),
            Extent::Point(p) => self.holds(p),
        }
    }

    fn holds(&self, point: Comparand) -> bool {
        self.start.is_on_or_before(point) && self.end.is_on_or_after(point)
    }

    /// `START-END` rendering, each endpoint at its own precision
    pub fn format(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl FromStr for DateInterval {
    type Err = Error;

    /// Parse `START-END` where both halves are fixed-width dates
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('-') {
            Some((start, end)) if !end.contains('-') => Self::from_strs(start, end),
            _ => Err(Error::MalformedInput(s.to_string())),
        }
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for DateInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
