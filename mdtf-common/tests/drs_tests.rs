//! DRS decoding end to end: paths, date spans and vocabulary checks

use mdtf_common::cmip6::{ControlledVocabulary, DrsParser, MipFrequency, MipTable};
use mdtf_common::{DateInterval, Error, PrecisionDate};

const ROOT: &str = "/archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726";

fn files() -> Vec<&'static str> {
    vec![
        "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_195001-201412.nc",
        "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_185001-189912.nc",
        "tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_190001-194912.nc",
    ]
}

#[test]
fn test_full_path_record() {
    let path = format!("{}/{}", ROOT, files()[1]);
    let record = DrsParser::new().parse_path(&path).unwrap();

    for (field, expected) in [
        ("activity_id", "CMIP"),
        ("institution_id", "NOAA-GFDL"),
        ("source_id", "GFDL-ESM4"),
        ("experiment_id", "historical"),
        ("member_id", "r1i1p1f1"),
        ("table_id", "Amon"),
        ("variable_id", "tas"),
        ("grid_label", "gr1"),
        ("table_prefix", "A"),
        ("table_freq", "mon"),
    ] {
        assert_eq!(record.text(field), Some(expected), "field {}", field);
    }
    assert_eq!(record.date("version_date"), Some(PrecisionDate::ymd(2019, 7, 26).unwrap()));
    assert_eq!(record.date("start_date"), Some(PrecisionDate::year_month(1850, 1).unwrap()));
    assert_eq!(record.frequency(), Some("mon".parse::<MipFrequency>().unwrap()));
}

#[test]
fn test_files_span_contiguous_range() {
    let parser = DrsParser::new();
    let ranges = files()
        .into_iter()
        .map(|f| parser.parse_filename(f).unwrap().date_range().unwrap());
    let span = DateInterval::from_contiguous(ranges).unwrap();
    assert_eq!(span, "185001-201412".parse().unwrap());
    assert!(span.contains(PrecisionDate::year_only(1979).unwrap()));
}

#[test]
fn test_missing_file_breaks_span() {
    let parser = DrsParser::new();
    let ranges = files()
        .into_iter()
        .skip(1)
        .chain(["tas_Amon_GFDL-ESM4_historical_r1i1p1f1_gr1_195101-201412.nc"])
        .map(|f| parser.parse_filename(f).unwrap().date_range().unwrap());
    assert!(matches!(DateInterval::from_contiguous(ranges), Err(Error::NonContiguous { .. })));
}

#[test]
fn test_directory_filename_disagreement() {
    let path = format!("{}/{}", ROOT, "tas_Amon_GFDL-ESM4_ssp585_r1i1p1f1_gr1_201501-210012.nc");
    let err = DrsParser::new().parse_path(&path).unwrap_err();
    assert!(matches!(err, Error::InconsistentMetadata { ref field, .. } if field == "experiment_id"));
    assert!(err.to_string().contains("historical"));
}

#[test]
fn test_table_frequencies_in_paths() {
    let parser = DrsParser::new();
    let cases = [
        ("pr_3hr_GFDL-ESM4_historical_r1i1p1f1_gr1_1850010100-1854123121.nc", "3hr"),
        ("ta_6hrPlevPt_GFDL-ESM4_historical_r1i1p1f1_gr1_1850010100-1850123118.nc", "6hr"),
        ("tos_Oday_GFDL-ESM4_historical_r1i1p1f1_gn_18500101-18691231.nc", "day"),
        ("areacello_Ofx_GFDL-ESM4_historical_r1i1p1f1_gn.nc", "fx"),
    ];
    for (file, freq) in cases {
        let record = parser.parse_filename(file).unwrap();
        assert_eq!(record.frequency().unwrap().to_string(), freq, "{}", file);
    }

    let record = parser.parse_filename(cases[1].0).unwrap();
    assert_eq!(record.text("table_qualifier"), Some("Pt"));
    assert_eq!(record.text("table_suffix"), Some("Plev"));
    assert_eq!(MipTable::parse("6hrPlevPt").unwrap().frequency.quantity(), 6);
}

#[test]
fn test_sub_hour_timestamps_rejected() {
    let file = "pr_3hr_GFDL-ESM4_historical_r1i1p1f1_gr1_185001010030-185412312330.nc";
    assert!(DrsParser::new().parse_filename(file).is_err());
}

#[test]
fn test_vocabulary_checked_parse() {
    let cv = ControlledVocabulary::from_json_str(
        r#"{
            "activity_id": ["CMIP", "ScenarioMIP"],
            "source_id": {"GFDL-ESM4": {"institution_id": ["NOAA-GFDL"]}},
            "experiment_id": {"historical": {"activity_id": ["CMIP"]}}
        }"#,
    )
    .unwrap();
    let parser = DrsParser::with_vocabulary(&cv);
    assert!(parser.parse_path(&format!("{}/{}", ROOT, files()[0])).is_ok());

    let err = parser
        .parse_filename("tas_Amon_GFDL-CM4_historical_r1i1p1f1_gr1_185001-189912.nc")
        .unwrap_err();
    assert!(matches!(err, Error::LookupNotFound { ref key, .. } if key == "GFDL-CM4"));
}
