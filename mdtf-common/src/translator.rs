//! Variable and unit name translation between naming conventions
//!
//! Analysis scripts request variables by their CF standard names; model output
//! uses each model's own names. A [`VariableTranslator`] holds one multi-valued
//! map per named convention (CF name → model names) and translates in either
//! direction. The canonical convention, `CF`, is always present and
//! translates every name to itself.
//!
//! Conventions are read from `fieldlist_*.jsonc` tables:
//!
//! ```text
//! {
//!   "convention_name": ["CESM", "CAM"],
//!   "axes": {"lon": {"axis": "X", "MDTF_envvar": "lon_coord"}},
//!   "var_names": {"pr": "PRECT", "tas": "TREFHT"},
//!   "units": {"K": "K"}
//! }
//! ```

use crate::multimap::MultiMap;
use crate::{jsonc, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

/// Name of the canonical convention
pub const CF: &str = "CF";

/// A single value or a list of values
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Coordinate axis description
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Axis {
    pub axis: String,
    /// Environment variable analysis scripts read the coordinate name from
    #[serde(rename = "MDTF_envvar", default, skip_serializing_if = "Option::is_none")]
    pub envvar: Option<String>,
}

/// Contents of one `fieldlist_*.jsonc` table
#[derive(Debug, Clone, Deserialize)]
pub struct FieldList {
    pub convention_name: OneOrMany,
    #[serde(default)]
    pub axes: BTreeMap<String, Axis>,
    #[serde(default)]
    pub var_names: BTreeMap<String, OneOrMany>,
    #[serde(default)]
    pub units: BTreeMap<String, OneOrMany>,
}

#[derive(Debug, Clone, Default)]
struct Convention {
    axes: BTreeMap<String, Axis>,
    variables: MultiMap<String, String>,
    units: MultiMap<String, String>,
}

fn to_multimap(table: BTreeMap<String, OneOrMany>) -> MultiMap<String, String> {
    let mut map = MultiMap::new();
    for (cf_name, names) in table {
        map.extend(cf_name, names.into_vec());
    }
    map
}

fn cf_axes() -> BTreeMap<String, Axis> {
    [("lon", "X"), ("lat", "Y"), ("lev", "Z"), ("time", "T")]
        .into_iter()
        .map(|(name, axis)| {
            (
                name.to_string(),
                Axis {
                    axis: axis.to_string(),
                    envvar: Some(format!("{}_coord", name)),
                },
            )
        })
        .collect()
}

/// Which table of a convention a translation uses
#[derive(Debug, Clone, Copy)]
enum Table {
    Variables,
    Units,
}

impl Table {
    fn noun(self) -> &'static str {
        match self {
            Table::Variables => "variable",
            Table::Units => "unit",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableTranslator {
    conventions: BTreeMap<String, Convention>,
}

impl Default for VariableTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableTranslator {
    /// Translator knowing only the canonical `CF` convention
    pub fn new() -> Self {
        let cf = Convention {
            axes: cf_axes(),
            ..Convention::default()
        };
        Self {
            conventions: BTreeMap::from([(CF.to_string(), cf)]),
        }
    }

    /// Register every convention named by `list`.
    ///
    /// `source_name` identifies the table in errors. Fails with
    /// [`Error::DuplicateConvention`] if a name is already registered.
    pub fn add_field_list(&mut self, list: FieldList, source_name: &str) -> Result<()> {
        let names = list.convention_name.into_vec();
        if let Some(dup) = names.iter().find(|name| self.conventions.contains_key(*name)) {
            return Err(Error::DuplicateConvention {
                convention: dup.clone(),
                source_name: source_name.to_string(),
            });
        }
        let convention = Convention {
            axes: list.axes,
            variables: to_multimap(list.var_names),
            units: to_multimap(list.units),
        };
        for name in names {
            self.conventions.insert(name, convention.clone());
        }
        Ok(())
    }

    /// Register the conventions of one field-list file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let list: FieldList = jsonc::read(path)?;
        self.add_field_list(list, &path.display().to_string())
    }

    /// Translator with every `fieldlist_*.jsonc` table found in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("fieldlist_") && n.ends_with(".jsonc"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut translator = Self::new();
        for path in &paths {
            translator.load_file(path)?;
        }
        info!(
            "Loaded {} naming conventions from {} field lists in {}",
            translator.conventions.len() - 1,
            paths.len(),
            dir.display()
        );
        Ok(translator)
    }

    pub fn conventions(&self) -> impl Iterator<Item = &str> {
        self.conventions.keys().map(String::as_str)
    }

    pub fn has_convention(&self, convention: &str) -> bool {
        self.conventions.contains_key(convention)
    }

    fn convention(&self, convention: &str) -> Result<&Convention> {
        self.conventions
            .get(convention)
            .ok_or_else(|| Error::UnknownConvention(convention.to_string()))
    }

    /// Coordinate axes of `convention`
    pub fn axes(&self, convention: &str) -> Result<&BTreeMap<String, Axis>> {
        Ok(&self.convention(convention)?.axes)
    }

    /// CF names for a variable named `name` in `convention`
    pub fn to_cf(&self, convention: &str, name: &str) -> Result<Vec<String>> {
        self.lookup(convention, name, Table::Variables, true)
    }

    /// Names in `convention` for the CF variable `name`
    pub fn from_cf(&self, convention: &str, name: &str) -> Result<Vec<String>> {
        self.lookup(convention, name, Table::Variables, false)
    }

    /// CF units for units spelled `name` in `convention`
    pub fn units_to_cf(&self, convention: &str, name: &str) -> Result<Vec<String>> {
        self.lookup(convention, name, Table::Units, true)
    }

    /// Units in `convention` for the CF units `name`
    pub fn units_from_cf(&self, convention: &str, name: &str) -> Result<Vec<String>> {
        self.lookup(convention, name, Table::Units, false)
    }

    /// Translate a variable name from one convention to another through CF
    pub fn translate(&self, from: &str, to: &str, name: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for cf_name in self.to_cf(from, name)? {
            for translated in self.from_cf(to, &cf_name)? {
                if !names.contains(&translated) {
                    names.push(translated);
                }
            }
        }
        Ok(names)
    }

    fn lookup(&self, convention: &str, name: &str, table: Table, to_cf: bool) -> Result<Vec<String>> {
        if convention == CF {
            return Ok(vec![name.to_string()]);
        }
        let conv = self.convention(convention)?;
        let map = match table {
            Table::Variables => &conv.variables,
            Table::Units => &conv.units,
        };
        let key = name.to_string();
        let found = if to_cf { map.get_inverse(&key) } else { map.get(&key) };
        match found {
            Some(names) => Ok(names.iter().cloned().collect()),
            None => {
                error!("{} name {} not defined for convention {}", table.noun(), name, convention);
                Err(Error::LookupNotFound {
                    scope: format!("{} names of convention {}", table.noun(), convention),
                    key: key.clone(),
                })
            }
        }
    }
}
