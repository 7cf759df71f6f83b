//! CMIP6 controlled vocabulary
//!
//! The CV table lists, per category (`activity_id`, `source_id`,
//! `experiment_id`, ...), the legal values and for each value optional
//! mappings into other categories (e.g. an experiment's `activity_id`).
//! Cross-category lookups are built on demand as [`MultiMap`]s and cached.
//!
//! # Cache staleness
//!
//! A lookup built for `(source, dest)` is kept for the lifetime of the
//! vocabulary. Entries added later with [`ControlledVocabulary::insert_value`]
//! are visible to membership checks but not to lookups that were already
//! built; tables are expected to be complete when loaded.

use crate::multimap::MultiMap;
use crate::{jsonc, Error, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Top-level keys of the CV file that are not value categories
const NON_CATEGORY_KEYS: &[&str] = &[
    "product",
    "version_metadata",
    "required_global_attributes",
    "further_info_url",
    "Conventions",
    "license",
];

/// Destination category → mapped values, for one legal value
pub type Mappings = BTreeMap<String, Vec<String>>;

type Lookup = Arc<MultiMap<String, String>>;

#[derive(Debug, Default)]
pub struct ControlledVocabulary {
    categories: BTreeMap<String, BTreeMap<String, Mappings>>,
    lookups: Mutex<HashMap<(String, String), Lookup>>,
}

impl ControlledVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed CV JSON.
    ///
    /// Accepts either `{"CV": {...}}` or the bare category object. Categories
    /// with an unusable shape are skipped with a warning.
    pub fn from_value(value: Value) -> Result<Self> {
        let root = match value {
            Value::Object(mut map) if map.contains_key("CV") => map.remove("CV").unwrap_or_default(),
            other => other,
        };
        let Value::Object(root) = root else {
            return Err(Error::Config("CV table is not a JSON object".to_string()));
        };

        let mut cv = Self::new();
        for (category, content) in root {
            if NON_CATEGORY_KEYS.contains(&category.as_str()) {
                continue;
            }
            match parse_category(content) {
                Some(values) => {
                    cv.categories.insert(category, values);
                }
                None => warn!("Skipping CV category {} with unrecognized layout", category),
            }
        }
        Ok(cv)
    }

    /// Parse commented JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(jsonc::parse(text)?)
    }

    /// Load a CV file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let cv = Self::from_value(jsonc::read(path)?)?;
        info!(
            "Loaded controlled vocabulary from {} ({} categories)",
            path.display(),
            cv.categories.len()
        );
        Ok(cv)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    fn category(&self, category: &str) -> Result<&BTreeMap<String, Mappings>> {
        self.categories
            .get(category)
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))
    }

    /// Legal values of `category`
    pub fn values(&self, category: &str) -> Result<impl Iterator<Item = &str>> {
        Ok(self.category(category)?.keys().map(String::as_str))
    }

    /// Whether `item` is a legal value of `category`
    pub fn is_in_vocabulary(&self, category: &str, item: &str) -> Result<bool> {
        Ok(self.category(category)?.contains_key(item))
    }

    /// [`Self::is_in_vocabulary`] for each of `items`, in order
    pub fn are_in_vocabulary<'a, I>(&self, category: &str, items: I) -> Result<Vec<bool>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values = self.category(category)?;
        Ok(items.into_iter().map(|item| values.contains_key(item)).collect())
    }

    /// Add or extend a legal value of `category`.
    ///
    /// Does not touch lookups that have already been built.
    pub fn insert_value(&mut self, category: &str, value: &str, mappings: Mappings) {
        let entry = self
            .categories
            .entry(category.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default();
        for (dest, targets) in mappings {
            entry.entry(dest).or_default().extend(targets);
        }
    }

    /// Map from values of `source` to values of `dest`.
    ///
    /// Built from each `source` value's `dest` mapping. If the reverse pairing
    /// is already cached it is inverted instead of rebuilt.
    pub fn get_lookup(&self, source: &str, dest: &str) -> Result<Lookup> {
        let source_values = self.category(source)?;
        self.category(dest)?;

        let key = (source.to_string(), dest.to_string());
        let mut lookups = self.lookups.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lookup) = lookups.get(&key) {
            return Ok(Arc::clone(lookup));
        }

        let reverse_key = (dest.to_string(), source.to_string());
        let lookup = match lookups.get(&reverse_key) {
            Some(reverse) => {
                debug!("Inverting cached CV lookup {} -> {}", dest, source);
                reverse.inverted()
            }
            None => {
                debug!("Building CV lookup {} -> {}", source, dest);
                let mut map = MultiMap::new();
                for (value, mappings) in source_values {
                    if let Some(targets) = mappings.get(dest) {
                        map.extend(value.clone(), targets.iter().cloned());
                    }
                }
                map
            }
        };
        let lookup = Arc::new(lookup);
        lookups.insert(key, Arc::clone(&lookup));
        Ok(lookup)
    }

    /// Values of `dest` that `item` (a value of `source`) maps to
    pub fn lookup(&self, item: &str, source: &str, dest: &str) -> Result<Vec<String>> {
        let lookup = self.get_lookup(source, dest)?;
        lookup_in(&lookup, item, source, dest)
    }

    /// [`Self::lookup`] for each of `items`, in order
    pub fn lookup_many<'a, I>(&self, items: I, source: &str, dest: &str) -> Result<Vec<Vec<String>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lookup = self.get_lookup(source, dest)?;
        items
            .into_iter()
            .map(|item| lookup_in(&lookup, item, source, dest))
            .collect()
    }
}

fn lookup_in(lookup: &MultiMap<String, String>, item: &str, source: &str, dest: &str) -> Result<Vec<String>> {
    lookup
        .get(&item.to_string())
        .map(|values| values.iter().cloned().collect())
        .ok_or_else(|| Error::LookupNotFound {
            scope: format!("CV lookup {} -> {}", source, dest),
            key: item.to_string(),
        })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn parse_mappings(detail: Map<String, Value>) -> Mappings {
    detail
        .iter()
        .filter_map(|(dest, targets)| string_list(targets).map(|t| (dest.clone(), t)))
        .collect()
}

/// Legal values of one category. A category is a single value, a list of
/// values, or an object keyed by value whose entries are either a free-text
/// description or a mapping object.
fn parse_category(content: Value) -> Option<BTreeMap<String, Mappings>> {
    match content {
        Value::Object(entries) => Some(
            entries
                .into_iter()
                .map(|(value, detail)| {
                    let mappings = match detail {
                        Value::Object(detail) => parse_mappings(detail),
                        _ => Mappings::new(),
                    };
                    (value, mappings)
                })
                .collect(),
        ),
        other => string_list(&other).map(|values| {
            values
                .into_iter()
                .map(|value| (value, Mappings::new()))
                .collect()
        }),
    }
}
