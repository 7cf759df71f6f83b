//! Common error types for MDTF

use thiserror::Error;

/// Common result type for MDTF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the MDTF core
#[derive(Error, Debug)]
pub enum Error {
    /// String does not match any recognized date, frequency or table-code grammar
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Interval endpoints are not strictly ordered
    #[error("Invalid date range: start {start} is not before end {end}")]
    InvalidRange { start: String, end: String },

    /// Intervals requested for merging have a gap or overlap between them
    #[error("Date ranges not contiguous and nonoverlapping: {previous} followed by {next}")]
    NonContiguous { previous: String, next: String },

    /// Directory or filename does not match its DRS template
    #[error("Can't parse {kind} '{input}'")]
    UnparsableInput { kind: &'static str, input: String },

    /// Directory- and filename-derived fields disagree
    #[error("Field '{field}' inconsistent in parsing {path}: '{directory}' vs '{filename}'")]
    InconsistentMetadata {
        field: String,
        path: String,
        directory: String,
        filename: String,
    },

    /// Vocabulary has no such category
    #[error("Unknown vocabulary category: {0}")]
    UnknownCategory(String),

    /// Translation table has no such convention
    #[error("Variable name translation doesn't recognize convention {0}")]
    UnknownConvention(String),

    /// Identifier absent from an otherwise-known category or convention
    #[error("Name '{key}' not defined for {scope}")]
    LookupNotFound { scope: String, key: String },

    /// A value cannot be rendered in the requested label vocabulary
    #[error("Can't format {value} as {vocabulary} label: {reason}")]
    FormatPrecondition {
        value: String,
        vocabulary: &'static str,
        reason: String,
    },

    /// Two translation tables define the same convention
    #[error("Convention {convention} defined in {source_name} already exists")]
    DuplicateConvention {
        convention: String,
        source_name: String,
    },

    /// Date arithmetic left the representable calendar
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON table parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
