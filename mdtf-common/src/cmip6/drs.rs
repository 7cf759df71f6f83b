//! CMIP6 Data Reference Syntax (DRS) decoding
//!
//! Archive paths encode their metadata twice: once in the directory
//!
//! ```text
//! CMIP6/<activity>/<institution>/<source>/<experiment>/<member>/<table>/<variable>/<grid>/v<version>
//! ```
//!
//! and once in the filename
//!
//! ```text
//! <variable>_<table>_<source>_<experiment>_<member>_<grid>_<start>-<end>.nc
//! ```
//!
//! Each template is decoded into a [`MetadataRecord`]. When both halves of a
//! path are available every field they share must agree.
//!
//! ```rust
//! use mdtf_common::cmip6::DrsParser;
//!
//! let record = DrsParser::new()
//!     .parse_path("/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726/tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_185001-194912.nc")
//!     .unwrap();
//! assert_eq!(record.text("variable_id"), Some("tas"));
//! assert_eq!(record.date_range().unwrap().to_string(), "185001-194912");
//! ```

use super::frequency::MipFrequency;
use super::table::MipTable;
use super::vocabulary::ControlledVocabulary;
use crate::date::PrecisionDate;
use crate::date_range::DateInterval;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

static DRS_DIRECTORY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:.*/)?                        # any archive root
        CMIP6/
        (?P<activity_id>[\w-]+)/
        (?P<institution_id>[\w-]+)/
        (?P<source_id>[\w-]+)/
        (?P<experiment_id>[\w-]+)/
        (?P<member_id>[\w-]+)/
        (?P<table_id>[\w-]+)/
        (?P<variable_id>[\w-]+)/
        (?P<grid_label>[\w-]+)/
        v(?P<version_date>\d{4}|\d{6}|\d{8}|\d{10})
        /?
        $
    ",
    )
    .unwrap()
});

static DRS_FILENAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?P<variable_id>[A-Za-z0-9-]+)_
        (?P<table_id>[A-Za-z0-9-]+)_
        (?P<source_id>[A-Za-z0-9-]+)_
        (?P<experiment_id>[A-Za-z0-9-]+)_
        (?P<member_id>[A-Za-z0-9-]+)_
        (?P<grid_label>[A-Za-z0-9-]+)
        (?:_(?P<start_date>\d+)-(?P<end_date>\d+))?   # absent only for fixed fields
        \.nc
        $
    ",
    )
    .unwrap()
});

/// Record fields checked against the controlled vocabulary when one is attached
const VOCABULARY_FIELDS: &[&str] = &[
    "activity_id",
    "institution_id",
    "source_id",
    "experiment_id",
    "table_id",
    "grid_label",
];

/// One decoded metadata value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(PrecisionDate),
    Range(DateInterval),
    Frequency(MipFrequency),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Range(r) => write!(f, "{}", r),
            FieldValue::Frequency(freq) => write!(f, "{}", freq),
        }
    }
}

/// Field name → decoded value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetadataRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl MetadataRecord {
    pub fn insert(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text field, `None` if absent or not text
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<PrecisionDate> {
        match self.fields.get(name) {
            Some(FieldValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    /// The file's `date_range`, if the record came from a dated filename
    pub fn date_range(&self) -> Option<DateInterval> {
        match self.fields.get("date_range") {
            Some(FieldValue::Range(r)) => Some(*r),
            _ => None,
        }
    }

    /// Frequency decoded from the table id
    pub fn frequency(&self) -> Option<MipFrequency> {
        match self.fields.get("date_freq") {
            Some(FieldValue::Frequency(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge `other` in, failing if a field present in both differs
    pub fn merge_consistent(&mut self, other: MetadataRecord, path: &str) -> Result<()> {
        for (name, value) in &other.fields {
            if let Some(existing) = self.fields.get(name) {
                if existing != value {
                    return Err(Error::InconsistentMetadata {
                        field: name.clone(),
                        path: path.to_string(),
                        directory: existing.to_string(),
                        filename: value.to_string(),
                    });
                }
            }
        }
        self.fields.extend(other.fields);
        Ok(())
    }

    /// Add the decomposed parts of a table id
    fn insert_table(&mut self, table: &MipTable) {
        let parts = [
            ("table_prefix", &table.prefix),
            ("table_suffix", &table.suffix),
            ("table_qualifier", &table.qualifier),
        ];
        for (name, part) in parts {
            if let Some(part) = part {
                self.insert(name, FieldValue::Text(part.clone()));
            }
        }
        self.insert("table_freq", FieldValue::Text(table.frequency_token.clone()));
        self.insert("date_freq", FieldValue::Frequency(table.frequency));
    }

    /// Every named group that took part in the match, as text
    fn from_captures(regex: &Regex, caps: &Captures<'_>) -> Self {
        let mut record = Self::default();
        for name in regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                record.insert(name, FieldValue::Text(m.as_str().to_string()));
            }
        }
        record
    }
}

/// Decoder for DRS directories, filenames and full paths
///
/// With a vocabulary attached, decoded identifiers are also checked against
/// the CV categories of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrsParser<'a> {
    vocabulary: Option<&'a ControlledVocabulary>,
}

impl<'a> DrsParser<'a> {
    pub fn new() -> Self {
        Self { vocabulary: None }
    }

    pub fn with_vocabulary(vocabulary: &'a ControlledVocabulary) -> Self {
        Self {
            vocabulary: Some(vocabulary),
        }
    }

    /// Decode a `.../CMIP6/<activity>/.../v<version>` directory
    pub fn parse_directory(&self, dir: &str) -> Result<MetadataRecord> {
        let caps = DRS_DIRECTORY_REGEX
            .captures(dir)
            .ok_or_else(|| Error::UnparsableInput {
                kind: "DRS directory",
                input: dir.to_string(),
            })?;
        let mut record = MetadataRecord::from_captures(&DRS_DIRECTORY_REGEX, &caps);

        let version: PrecisionDate = caps["version_date"].parse()?;
        record.insert("version_date", FieldValue::Date(version));
        record.insert_table(&MipTable::parse(&caps["table_id"])?);

        self.validate(&record)?;
        Ok(record)
    }

    /// Decode a `<variable>_<table>_..._<start>-<end>.nc` filename
    pub fn parse_filename(&self, file: &str) -> Result<MetadataRecord> {
        let unparsable = || Error::UnparsableInput {
            kind: "DRS filename",
            input: file.to_string(),
        };
        let caps = DRS_FILENAME_REGEX.captures(file).ok_or_else(unparsable)?;
        let mut record = MetadataRecord::from_captures(&DRS_FILENAME_REGEX, &caps);

        let table = MipTable::parse(&caps["table_id"])?;
        match (caps.name("start_date"), caps.name("end_date")) {
            (Some(start), Some(end)) => {
                let start: PrecisionDate = start.as_str().parse()?;
                let end: PrecisionDate = end.as_str().parse()?;
                record.insert("start_date", FieldValue::Date(start));
                record.insert("end_date", FieldValue::Date(end));
                record.insert("date_range", FieldValue::Range(DateInterval::new(start, end)?));
            }
            _ if table.frequency.is_fixed() => {}
            _ => return Err(unparsable()),
        }
        record.insert_table(&table);

        self.validate(&record)?;
        Ok(record)
    }

    /// Decode a full path, cross-checking directory against filename
    pub fn parse_path(&self, path: &str) -> Result<MetadataRecord> {
        let (dir, file) = path.rsplit_once('/').ok_or_else(|| Error::UnparsableInput {
            kind: "DRS path",
            input: path.to_string(),
        })?;
        let mut record = self.parse_directory(dir)?;
        record.merge_consistent(self.parse_filename(file)?, path)?;
        debug!("Parsed DRS path {} ({} fields)", path, record.len());
        Ok(record)
    }

    fn validate(&self, record: &MetadataRecord) -> Result<()> {
        let Some(cv) = self.vocabulary else {
            return Ok(());
        };
        for &category in VOCABULARY_FIELDS {
            if !cv.has_category(category) {
                continue;
            }
            if let Some(value) = record.text(category) {
                if !cv.is_in_vocabulary(category, value)? {
                    return Err(Error::LookupNotFound {
                        scope: format!("CV category {}", category),
                        key: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIR: &str = "/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726";
    const FILE: &str = "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_185001-194912.nc";

    #[test]
    fn test_parse_directory_fields() {
        let record = DrsParser::new().parse_directory(DIR).unwrap();
        assert_eq!(record.text("activity_id"), Some("CMIP"));
        assert_eq!(record.text("institution_id"), Some("NOAA-GFDL"));
        assert_eq!(record.text("source_id"), Some("GFDL-ESM4"));
        assert_eq!(record.text("experiment_id"), Some("historical"));
        assert_eq!(record.text("member_id"), Some("r1i1p1f1"));
        assert_eq!(record.text("table_id"), Some("Amon"));
        assert_eq!(record.text("variable_id"), Some("tas"));
        assert_eq!(record.text("grid_label"), Some("gr1"));
        assert_eq!(record.date("version_date"), Some("20190726".parse().unwrap()));
        assert_eq!(record.text("table_prefix"), Some("A"));
        assert_eq!(record.frequency().unwrap().to_string(), "mon");
    }

    #[test]
    fn test_parse_directory_separators() {
        let parser = DrsParser::new();
        assert!(parser.parse_directory(&format!("{}/", DIR)).is_ok());
        assert!(parser
            .parse_directory("CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726")
            .is_ok());
    }

    #[test]
    fn test_parse_directory_rejects_partial_match() {
        let parser = DrsParser::new();
        let cases = [
            "/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1",
            "/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726/extra",
            "/archive/CMIP5/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726",
            "/archive/MYCMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726",
            "/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v1",
            "/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v201907261",
        ];
        for dir in cases {
            assert!(
                matches!(parser.parse_directory(dir), Err(Error::UnparsableInput { .. })),
                "accepted {}",
                dir
            );
        }
    }

    #[test]
    fn test_parse_directory_bad_table() {
        let dir = "CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Xmon/tas/gr1/v20190726";
        assert!(matches!(DrsParser::new().parse_directory(dir), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_parse_filename_fields() {
        let record = DrsParser::new().parse_filename(FILE).unwrap();
        assert_eq!(record.text("variable_id"), Some("tas"));
        assert_eq!(record.text("member_id"), Some("r1i1p1f1"));
        assert_eq!(record.date("start_date"), Some("185001".parse().unwrap()));
        assert_eq!(record.date("end_date"), Some("194912".parse().unwrap()));
        assert_eq!(record.date_range(), Some("185001-194912".parse().unwrap()));
        assert_eq!(record.frequency().unwrap().unit().code(), "mo");
    }

    #[test]
    fn test_parse_filename_rejects_malformed() {
        let parser = DrsParser::new();
        for file in [
            "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_185001-194912.nc4",
            "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_185001-194912.nc",
            "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1.nc",
            "foo.nc",
        ] {
            assert!(
                matches!(parser.parse_filename(file), Err(Error::UnparsableInput { .. })),
                "accepted {}",
                file
            );
        }
    }

    #[test]
    fn test_parse_filename_inverted_dates() {
        let file = "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_194912-185001.nc";
        assert!(matches!(DrsParser::new().parse_filename(file), Err(Error::InvalidRange { .. })));
    }

    #[test]
    fn test_parse_filename_fixed_field_without_dates() {
        let record = DrsParser::new()
            .parse_filename("areacella_fx_GFDL-ESM4_historical_r1i1p1f1_gr1.nc")
            .unwrap();
        assert!(record.frequency().unwrap().is_fixed());
        assert_eq!(record.date_range(), None);
    }

    #[test]
    fn test_parse_path_consistent() {
        let record = DrsParser::new().parse_path(&format!("{}/{}", DIR, FILE)).unwrap();
        assert_eq!(record.text("variable_id"), Some("tas"));
        assert_eq!(record.text("table_id"), Some("Amon"));
        assert_eq!(record.text("activity_id"), Some("CMIP"));
        assert_eq!(record.date_range(), Some(DateInterval::from_strs("185001", "194912").unwrap()));
    }

    #[test]
    fn test_parse_path_inconsistent() {
        let file = "pr_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_185001-194912.nc";
        let err = DrsParser::new().parse_path(&format!("{}/{}", DIR, file)).unwrap_err();
        match err {
            Error::InconsistentMetadata { field, directory, filename, .. } => {
                assert_eq!(field, "variable_id");
                assert_eq!(directory, "tas");
                assert_eq!(filename, "pr");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_path_without_directory() {
        assert!(matches!(DrsParser::new().parse_path(FILE), Err(Error::UnparsableInput { .. })));
    }

    #[test]
    fn test_vocabulary_validation() {
        let cv = ControlledVocabulary::from_value(serde_json::json!({
            "activity_id": ["CMIP"],
            "grid_label": ["gn", "gr"]
        }))
        .unwrap();
        let parser = DrsParser::with_vocabulary(&cv);
        let err = parser.parse_directory(DIR).unwrap_err();
        assert!(matches!(err, Error::LookupNotFound { ref key, .. } if key == "gr1"));

        let ok_dir = DIR.replace("/gr1/", "/gr/");
        assert!(parser.parse_directory(&ok_dir).is_ok());
    }

    #[test]
    fn test_record_serializes_as_flat_map() {
        let record = DrsParser::new().parse_filename(FILE).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["variable_id"], "tas");
        assert_eq!(json["date_range"], "185001-194912");
        assert_eq!(json["date_freq"], "mon");
    }
}
