//! Multi-valued bidirectional map
//!
//! [`MultiMap`] associates each key with a set of values and answers lookups
//! in both directions. The forward relation is owned directly; the inverse
//! (value → set of keys) is computed on first use and cached.
//!
//! # Staleness contract
//!
//! Any `&mut self` mutation drops the cached inverse, so the inverse is always
//! the exact set-theoretic inverse of the current forward relation. Values
//! derived from a map (e.g. [`MultiMap::inverted`] copies held by other
//! caches) are snapshots and do not follow later mutations.

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct MultiMap<K: Ord, V: Ord> {
    forward: BTreeMap<K, BTreeSet<V>>,
    inverse: OnceCell<BTreeMap<V, BTreeSet<K>>>,
}

impl<K: Ord, V: Ord> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self {
            forward: BTreeMap::new(),
            inverse: OnceCell::new(),
        }
    }
}

impl<K: Ord + Clone, V: Ord + Clone> MultiMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the set for `key`
    pub fn insert(&mut self, key: K, value: V) {
        self.inverse.take();
        self.forward.entry(key).or_default().insert(value);
    }

    /// Add every item of `values` to the set for `key`.
    ///
    /// The key is registered even when `values` is empty.
    pub fn extend<I: IntoIterator<Item = V>>(&mut self, key: K, values: I) {
        self.inverse.take();
        self.forward.entry(key).or_default().extend(values);
    }

    /// Drop `key` and all of its values
    pub fn remove(&mut self, key: &K) -> Option<BTreeSet<V>> {
        self.inverse.take();
        self.forward.remove(key)
    }

    /// Values for `key`; `None` if the key was never inserted
    pub fn get(&self, key: &K) -> Option<&BTreeSet<V>> {
        self.forward.get(key)
    }

    /// Keys mapping to `value`
    pub fn get_inverse(&self, value: &V) -> Option<&BTreeSet<K>> {
        self.inverse().get(value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.forward.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.forward.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &BTreeSet<V>)> {
        self.forward.iter()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Value → keys relation, built on first call
    pub fn inverse(&self) -> &BTreeMap<V, BTreeSet<K>> {
        self.inverse.get_or_init(|| {
            let mut inverse: BTreeMap<V, BTreeSet<K>> = BTreeMap::new();
            for (key, values) in &self.forward {
                for value in values {
                    inverse.entry(value.clone()).or_default().insert(key.clone());
                }
            }
            inverse
        })
    }

    /// New map with keys and values swapped
    pub fn inverted(&self) -> MultiMap<V, K> {
        MultiMap {
            forward: self.inverse().clone(),
            inverse: OnceCell::new(),
        }
    }
}

impl<K: Ord + Clone, V: Ord + Clone> FromIterator<(K, V)> for MultiMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Ord, V: Ord> PartialEq for MultiMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward
    }
}

impl<K: Ord, V: Ord> Eq for MultiMap<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MultiMap<String, String> {
        [("pr", "PRECT"), ("pr", "precip"), ("tas", "TREFHT"), ("ts", "TREFHT")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_forward_lookup_is_multi_valued() {
        let map = sample();
        assert_eq!(map.get(&"pr".to_string()), Some(&set(&["PRECT", "precip"])));
        assert_eq!(map.get(&"tas".to_string()), Some(&set(&["TREFHT"])));
        assert_eq!(map.get(&"zg".to_string()), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_inverse_lookup() {
        let map = sample();
        assert_eq!(map.get_inverse(&"TREFHT".to_string()), Some(&set(&["tas", "ts"])));
        assert_eq!(map.get_inverse(&"precip".to_string()), Some(&set(&["pr"])));
        assert_eq!(map.get_inverse(&"pr".to_string()), None);
    }

    #[test]
    fn test_inverse_is_exact_inverse() {
        let map = sample();
        for (value, keys) in map.inverse() {
            for key in keys {
                assert!(map.get(key).unwrap().contains(value));
            }
        }
        for (key, values) in map.iter() {
            for value in values {
                assert!(map.get_inverse(value).unwrap().contains(key));
            }
        }
    }

    #[test]
    fn test_mutation_invalidates_inverse() {
        let mut map = sample();
        assert!(map.get_inverse(&"T".to_string()).is_none());
        map.insert("ta".to_string(), "T".to_string());
        assert_eq!(map.get_inverse(&"T".to_string()), Some(&set(&["ta"])));
        map.remove(&"ta".to_string());
        assert!(map.get_inverse(&"T".to_string()).is_none());
    }

    #[test]
    fn test_inverted_round_trip() {
        let map = sample();
        let inverted = map.inverted();
        assert_eq!(inverted.get(&"TREFHT".to_string()), Some(&set(&["tas", "ts"])));
        assert_eq!(inverted.inverted(), map);
    }

    #[test]
    fn test_extend_registers_key_without_values() {
        let mut map: MultiMap<String, String> = MultiMap::new();
        map.extend("areacella".to_string(), Vec::new());
        assert!(map.contains_key(&"areacella".to_string()));
        assert!(map.get(&"areacella".to_string()).unwrap().is_empty());
    }
}
