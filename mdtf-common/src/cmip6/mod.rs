//! CMIP6 naming conventions
//!
//! Decoding of the CMIP6 Data Reference Syntax: MIP table ids, frequency
//! tokens, archive directories and filenames, plus the controlled vocabulary
//! those identifiers are checked against.

mod drs;
mod frequency;
mod table;
mod vocabulary;

pub use drs::*;
pub use frequency::*;
pub use table::*;
pub use vocabulary::*;
