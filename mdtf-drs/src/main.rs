//! mdtf-drs - CMIP6 DRS inspection tool
//!
//! Decodes archive paths into metadata records, checks that a set of files
//! covers a contiguous date span, translates variable names between model
//! conventions and shows the label forms of a frequency.
//!
//! ```bash
//! mdtf-drs parse /archive/CMIP6/CMIP/NOAA-GFDL/GFDL-ESM4/historical/r1i1p1f1/Amon/tas/gr1/v20190726
//! mdtf-drs span tas_Amon_..._185001-189912.nc tas_Amon_..._190001-194912.nc
//! mdtf-drs translate --from CESM --to GFDL PRECT
//! mdtf-drs freq 3hrPt
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mdtf_common::cmip6::{ControlledVocabulary, DrsParser, MetadataRecord, MipFrequency};
use mdtf_common::config::CoreConfig;
use mdtf_common::{DateInterval, Frequency, VariableTranslator};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "mdtf-drs")]
#[clap(about = "Inspect CMIP6 DRS paths, date spans and naming conventions")]
#[clap(version)]
struct Args {
    /// Config file (defaults to <config dir>/mdtf/config.toml)
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Code root holding the CV and field-list tables
    #[clap(long, global = true, value_name = "DIR")]
    code_root: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode DRS directories, filenames or full paths
    Parse {
        paths: Vec<String>,

        /// Check identifiers against the controlled vocabulary
        #[clap(long)]
        validate: bool,
    },
    /// Check that dated files cover one contiguous span
    Span { files: Vec<String> },
    /// Translate a variable (or unit) name between conventions
    Translate {
        #[clap(long, default_value = "CF")]
        from: String,
        #[clap(long, default_value = "CF")]
        to: String,
        /// Translate units instead of variable names
        #[clap(long)]
        units: bool,
        name: String,
    },
    /// Show every label form of a frequency
    Freq { label: String },
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = CoreConfig::load_or_default(args.config.as_deref())?;

    init_logging(&config.logging.level);
    info!("Starting MDTF DRS inspector (mdtf-drs) v{}", env!("CARGO_PKG_VERSION"));

    let code_root = config.resolve_code_root(args.code_root.as_deref());
    debug!("Code root: {}", code_root.display());

    match args.command {
        Command::Parse { paths, validate } => {
            let vocabulary = if validate {
                Some(ControlledVocabulary::load(&config.cv_table_path(&code_root))?)
            } else {
                None
            };
            let parser = match &vocabulary {
                Some(cv) => DrsParser::with_vocabulary(cv),
                None => DrsParser::new(),
            };
            for path in &paths {
                let record = parse_any(&parser, path).with_context(|| format!("parsing {}", path))?;
                println!("{}", serde_json::to_string_pretty(&json!({ "path": path, "record": record }))?);
            }
        }
        Command::Span { files } => {
            let span = span_of(&files)?;
            println!("{}", span);
        }
        Command::Translate { from, to, units, name } => {
            let translator = VariableTranslator::load_dir(&config.fieldlist_dir(&code_root))?;
            let names = if units {
                translate_units(&translator, &from, &to, &name)?
            } else {
                translator.translate(&from, &to, &name)?
            };
            println!("{}", names.join(" "));
        }
        Command::Freq { label } => {
            println!("{}", serde_json::to_string_pretty(&describe_frequency(&label)?)?);
        }
    }
    Ok(())
}

/// Full paths end in `.nc` and have a directory part; bare `.nc` names are
/// filenames; anything else is a directory.
fn parse_any(parser: &DrsParser<'_>, path: &str) -> mdtf_common::Result<MetadataRecord> {
    let path = path.trim_end_matches('/');
    match (path.ends_with(".nc"), path.contains('/')) {
        (true, true) => parser.parse_path(path),
        (true, false) => parser.parse_filename(path),
        (false, _) => parser.parse_directory(path),
    }
}

fn span_of(files: &[String]) -> Result<DateInterval> {
    if files.is_empty() {
        bail!("no files given");
    }
    let parser = DrsParser::new();
    let mut ranges = Vec::with_capacity(files.len());
    for file in files {
        let name = Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("no filename in {}", file))?;
        let record = parser.parse_filename(name)?;
        match record.date_range() {
            Some(range) => ranges.push(range),
            None => warn!("{} has no date range, skipping", name),
        }
    }
    Ok(DateInterval::from_contiguous(ranges)?)
}

fn translate_units(translator: &VariableTranslator, from: &str, to: &str, name: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for cf_units in translator.units_to_cf(from, name)? {
        for units in translator.units_from_cf(to, &cf_units)? {
            if !names.contains(&units) {
                names.push(units);
            }
        }
    }
    Ok(names)
}

/// Labels a frequency string has in each vocabulary that can express it
fn describe_frequency(label: &str) -> Result<serde_json::Value> {
    let generic = label.parse::<Frequency>().ok();
    let mip = label.parse::<MipFrequency>().ok();
    if generic.is_none() && mip.is_none() {
        bail!("unrecognized frequency '{}'", label);
    }

    let mut out = json!({ "input": label });
    if let Some(freq) = generic.or_else(|| mip.and_then(|m| m.to_frequency())) {
        out["frequency"] = json!(freq.format());
        out["local"] = json!(freq.format_local().ok());
        out["workflow"] = json!(freq.format_workflow().ok());
        out["approx_hours"] = json!(freq.approx_duration().num_hours());
    }
    if let Some(mip) = mip {
        out["cmip6"] = json!(mip.format());
        out["precision"] = json!(mip.precision());
    }
    Ok(out)
}
