//! Typed settings values
//!
//! Settings arrive as raw strings (command line, environment, config files)
//! alongside a declared kind. Conversion is table-driven: each
//! [`SettingSpec`] names the setting, its [`SettingKind`] and an optional
//! default, and [`SettingKind::coerce`] turns the raw text into a
//! [`SettingValue`]. Raw text is only ever parsed, never evaluated.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Declared kind of a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Str,
    Int,
    Bool,
    /// Boolean switch; present without a value means `true`
    Flag,
}

impl FromStr for SettingKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "str" | "string" | "path" => Ok(SettingKind::Str),
            "int" | "integer" => Ok(SettingKind::Int),
            "bool" | "boolean" => Ok(SettingKind::Bool),
            "flag" | "store_true" => Ok(SettingKind::Flag),
            _ => Err(Error::MalformedInput(format!("setting kind '{}'", s))),
        }
    }
}

/// Converted setting value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Str(s) => f.write_str(s),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl SettingKind {
    /// Convert raw text to this kind.
    ///
    /// `None` means the setting was given without a value, which only a
    /// [`SettingKind::Flag`] accepts.
    pub fn coerce(self, name: &str, raw: Option<&str>) -> Result<SettingValue> {
        let invalid = |raw: &str| Error::MalformedInput(format!("{}: invalid {:?} value '{}'", name, self, raw));
        match (self, raw) {
            (SettingKind::Flag, None) => Ok(SettingValue::Bool(true)),
            (_, None) => Err(Error::MalformedInput(format!("{}: missing value", name))),
            (SettingKind::Str, Some(raw)) => Ok(SettingValue::Str(raw.to_string())),
            (SettingKind::Int, Some(raw)) => raw
                .trim()
                .parse()
                .map(SettingValue::Int)
                .map_err(|_| invalid(raw)),
            (SettingKind::Bool | SettingKind::Flag, Some(raw)) => {
                parse_bool(raw).map(SettingValue::Bool).ok_or_else(|| invalid(raw))
            }
        }
    }
}

/// One row of a settings table
#[derive(Debug, Clone, PartialEq)]
pub struct SettingSpec {
    pub name: String,
    pub kind: SettingKind,
    pub default: Option<String>,
}

impl SettingSpec {
    pub fn new(name: &str, kind: SettingKind, default: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: default.map(str::to_string),
        }
    }

    /// Value from `raw`, falling back to the default.
    ///
    /// Absent flags without a default are `false`; other absent settings
    /// without a default are left unset.
    pub fn resolve(&self, raw: Option<&str>) -> Result<Option<SettingValue>> {
        match (raw, self.default.as_deref()) {
            (Some(raw), _) | (None, Some(raw)) => self.kind.coerce(&self.name, Some(raw)).map(Some),
            (None, None) if self.kind == SettingKind::Flag => Ok(Some(SettingValue::Bool(false))),
            (None, None) => Ok(None),
        }
    }
}

/// Convert every setting of `table` from `raw` (name → text).
///
/// Names in `raw` that the table does not declare are rejected.
pub fn coerce_all(table: &[SettingSpec], raw: &BTreeMap<String, String>) -> Result<BTreeMap<String, SettingValue>> {
    if let Some(unknown) = raw.keys().find(|k| !table.iter().any(|spec| &spec.name == *k)) {
        return Err(Error::Config(format!("unknown setting '{}'", unknown)));
    }
    let mut values = BTreeMap::new();
    for spec in table {
        if let Some(value) = spec.resolve(raw.get(&spec.name).map(String::as_str))? {
            values.insert(spec.name.clone(), value);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!("str".parse::<SettingKind>().unwrap(), SettingKind::Str);
        assert_eq!("INT".parse::<SettingKind>().unwrap(), SettingKind::Int);
        assert_eq!("bool".parse::<SettingKind>().unwrap(), SettingKind::Bool);
        assert_eq!("store_true".parse::<SettingKind>().unwrap(), SettingKind::Flag);
        assert!("eval".parse::<SettingKind>().is_err());
    }

    #[test]
    fn test_coerce_each_kind() {
        assert_eq!(
            SettingKind::Str.coerce("case", Some("QBOi")).unwrap(),
            SettingValue::Str("QBOi".to_string())
        );
        assert_eq!(SettingKind::Int.coerce("firstyr", Some(" 1977 ")).unwrap(), SettingValue::Int(1977));
        assert_eq!(SettingKind::Bool.coerce("save_nc", Some("No")).unwrap(), SettingValue::Bool(false));
        assert_eq!(SettingKind::Flag.coerce("verbose", None).unwrap(), SettingValue::Bool(true));
        assert_eq!(SettingKind::Flag.coerce("verbose", Some("0")).unwrap(), SettingValue::Bool(false));
    }

    #[test]
    fn test_coerce_rejects_bad_values() {
        assert!(SettingKind::Int.coerce("firstyr", Some("__import__('os')")).is_err());
        assert!(SettingKind::Bool.coerce("save_nc", Some("maybe")).is_err());
        assert!(SettingKind::Str.coerce("case", None).is_err());
    }

    #[test]
    fn test_coerce_all_applies_defaults() {
        let table = vec![
            SettingSpec::new("CASENAME", SettingKind::Str, None),
            SettingSpec::new("FIRSTYR", SettingKind::Int, Some("1850")),
            SettingSpec::new("save_nc", SettingKind::Bool, Some("true")),
            SettingSpec::new("dry_run", SettingKind::Flag, None),
            SettingSpec::new("convention", SettingKind::Str, None),
        ];
        let raw = BTreeMap::from([
            ("CASENAME".to_string(), "historical".to_string()),
            ("FIRSTYR".to_string(), "1977".to_string()),
        ]);
        let values = coerce_all(&table, &raw).unwrap();
        assert_eq!(values["CASENAME"], SettingValue::Str("historical".to_string()));
        assert_eq!(values["FIRSTYR"], SettingValue::Int(1977));
        assert_eq!(values["save_nc"], SettingValue::Bool(true));
        assert_eq!(values["dry_run"], SettingValue::Bool(false));
        assert!(!values.contains_key("convention"));
    }

    #[test]
    fn test_coerce_all_rejects_unknown_names() {
        let table = vec![SettingSpec::new("FIRSTYR", SettingKind::Int, None)];
        let raw = BTreeMap::from([("LASTYR".to_string(), "2000".to_string())]);
        assert!(matches!(coerce_all(&table, &raw), Err(Error::Config(_))));
    }
}
