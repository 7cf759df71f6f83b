//! MIP table identifiers
//!
//! A table id such as `Amon`, `3hr`, `AERmonZ` or `E1hrClimMon` packs a realm
//! prefix, a frequency token, a suffix and a qualifier into one word. The
//! frequency token is matched lazily so that the longest possible suffix and
//! qualifier are split off the end.

use super::frequency::MipFrequency;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

static MIP_TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?P<table_prefix>(A|CF|E|I|AER|O|L|LI|SI)?)
        (?P<leading_qualifier>(Pt)?)       # only seen before a Clim token, e.g. OPtClim
        (?P<table_freq>\d?[a-z]*?|Clim)    # maybe a digit, then as few lowercase letters as possible
        (?P<table_suffix>(ClimMon|Lev|Plev|Ant|Gre)?)
        (?P<table_qualifier>(Pt|Z|Off)?)
        $
    ",
    )
    .unwrap()
});

/// Decoded MIP table id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MipTable {
    pub table_id: String,
    pub prefix: Option<String>,
    /// Frequency token as written, after `clim` → `mon` normalisation
    pub frequency_token: String,
    pub suffix: Option<String>,
    pub qualifier: Option<String>,
    pub frequency: MipFrequency,
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl MipTable {
    pub fn parse(table_id: &str) -> Result<Self> {
        let malformed = || Error::MalformedInput(format!("MIP table id '{}'", table_id));
        let caps = MIP_TABLE_REGEX.captures(table_id).ok_or_else(malformed)?;

        let qualifier = match (&caps["leading_qualifier"], &caps["table_qualifier"]) {
            ("", q) | (q, "") => non_empty(q),
            _ => return Err(malformed()),
        };
        let frequency_token = match &caps["table_freq"] {
            t if t.eq_ignore_ascii_case("clim") => "mon".to_string(),
            t => t.to_string(),
        };
        let frequency: MipFrequency = frequency_token.parse()?;

        Ok(Self {
            table_id: table_id.to_string(),
            prefix: non_empty(&caps["table_prefix"]),
            frequency_token,
            suffix: non_empty(&caps["table_suffix"]),
            qualifier,
            frequency,
        })
    }
}

impl FromStr for MipTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MipTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.table_id)
    }
}
