//! # MDTF Common Library
//!
//! Shared code for the MDTF diagnostics driver:
//! - Dates with explicit precision and closed date intervals
//! - Sampling frequencies and their label vocabularies
//! - CMIP6 DRS directory / filename / table-id decoding
//! - Controlled-vocabulary and variable-name translation tables
//! - Configuration loading

pub mod cmip6;
pub mod config;
pub mod date;
pub mod date_range;
pub mod error;
pub mod frequency;
pub mod jsonc;
pub mod multimap;
pub mod settings;
pub mod translator;

pub use cmip6::{ControlledVocabulary, DrsParser, MetadataRecord, MipFrequency, MipTable};
pub use date::{Precision, PrecisionDate};
pub use date_range::DateInterval;
pub use error::{Error, Result};
pub use frequency::{Frequency, FrequencyUnit};
pub use multimap::MultiMap;
pub use translator::VariableTranslator;
