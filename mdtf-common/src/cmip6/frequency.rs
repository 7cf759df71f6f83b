//! CMIP6 frequency tokens
//!
//! MIP tables and the `frequency` global attribute use their own spellings
//! (`mon`, `3hr`, `subhr`, `fx`, `monC`, `1hrCM`, `3hrPt`). These carry an
//! averaging suffix and two units with no plain [`Frequency`] counterpart:
//! fixed fields (`fx`) and sub-hourly sampling (`subhr`, stored as minutes).

use crate::frequency::Frequency;
use crate::{Error, Result};
use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static MIP_FREQUENCY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?P<quantity>(1|3|6)?)
        (?P<unit>[a-z]*?)
        (?P<avg>(C|CM|Pt)?)
        $
    ",
    )
    .unwrap()
});

/// Unit of a [`MipFrequency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipUnit {
    /// Time-invariant field
    Fixed,
    Year,
    Month,
    Day,
    /// Hourly; timestamps include minutes
    Hour,
    /// Sub-hourly; quantity counts minutes
    Minute,
}

impl MipUnit {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "fx" => Some(MipUnit::Fixed),
            "yr" => Some(MipUnit::Year),
            "mo" => Some(MipUnit::Month),
            "day" => Some(MipUnit::Day),
            "hr" => Some(MipUnit::Hour),
            "min" => Some(MipUnit::Minute),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            MipUnit::Fixed => "fx",
            MipUnit::Year => "yr",
            MipUnit::Month => "mo",
            MipUnit::Day => "day",
            MipUnit::Hour => "hr",
            MipUnit::Minute => "min",
        }
    }

    /// Number of timestamp components needed to resolve this unit
    /// (hourly includes minutes, sub-hourly minutes and seconds)
    pub fn precision(self) -> u8 {
        match self {
            MipUnit::Fixed => 0,
            MipUnit::Year => 1,
            MipUnit::Month => 2,
            MipUnit::Day => 3,
            MipUnit::Hour => 5,
            MipUnit::Minute => 6,
        }
    }
}

/// How values are aggregated over each period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Averaging {
    Mean,
    /// Instantaneous samples (`Pt`)
    Point,
    /// Climatological mean (`C`, or `CM` for hourly)
    Climatology,
}

/// Frequency as spelled in CMIP6 tables and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipFrequency {
    quantity: u32,
    unit: MipUnit,
    averaging: Averaging,
}

impl MipFrequency {
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit(&self) -> MipUnit {
        self.unit
    }

    pub fn averaging(&self) -> Averaging {
        self.averaging
    }

    pub fn precision(&self) -> u8 {
        self.unit.precision()
    }

    pub fn is_fixed(&self) -> bool {
        self.unit == MipUnit::Fixed
    }

    /// Equivalent plain [`Frequency`]; `None` for fixed and sub-hourly data
    pub fn to_frequency(&self) -> Option<Frequency> {
        let unit = match self.unit {
            MipUnit::Year => "yr",
            MipUnit::Month => "mo",
            MipUnit::Day => "dy",
            MipUnit::Hour => "hr",
            MipUnit::Fixed | MipUnit::Minute => return None,
        };
        Frequency::new(self.quantity, unit).ok()
    }

    /// Approximate period length; `None` for fixed fields
    pub fn approx_duration(&self) -> Option<Duration> {
        match self.unit {
            MipUnit::Fixed => None,
            MipUnit::Minute => Some(Duration::minutes(self.quantity as i64)),
            _ => self.to_frequency().map(|f| f.approx_duration()),
        }
    }

    /// Convention label, e.g. `mon`, `dec`, `3hr`, `subhr`, `monC`, `1hrCM`
    pub fn format(&self) -> String {
        let base = match (self.unit, self.quantity) {
            (MipUnit::Fixed, _) => return "fx".to_string(),
            (MipUnit::Year, 10) => return "dec".to_string(),
            (MipUnit::Month, _) => "mon".to_string(),
            (MipUnit::Hour, q) => format!("{}hr", q),
            (MipUnit::Minute, _) => "subhr".to_string(),
            (unit, _) => unit.code().to_string(),
        };
        match self.averaging {
            Averaging::Mean => base,
            Averaging::Point => base + "Pt",
            Averaging::Climatology if self.unit == MipUnit::Hour => base + "CM",
            Averaging::Climatology => base + "C",
        }
    }
}

impl FromStr for MipFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedInput(format!("CMIP6 frequency '{}'", s));
        let caps = MIP_FREQUENCY_REGEX.captures(s).ok_or_else(malformed)?;

        let mut quantity: Option<u32> = match &caps["quantity"] {
            "" => None,
            q => Some(q.parse().map_err(|_| malformed())?),
        };
        let unit = match &caps["unit"] {
            "dec" => {
                quantity = Some(10);
                MipUnit::Year
            }
            "mon" => MipUnit::Month,
            "subhr" => {
                quantity = Some(15);
                MipUnit::Minute
            }
            "fx" => {
                quantity = Some(0);
                MipUnit::Fixed
            }
            code => MipUnit::from_code(code).ok_or_else(malformed)?,
        };
        let averaging = match &caps["avg"] {
            "" => Averaging::Mean,
            "Pt" => Averaging::Point,
            _ => Averaging::Climatology,
        };

        Ok(Self {
            quantity: quantity.unwrap_or(1),
            unit,
            averaging,
        })
    }
}

impl fmt::Display for MipFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for MipFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
