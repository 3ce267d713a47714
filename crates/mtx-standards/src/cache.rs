//! Fill-once caches for configuration loaded on first use.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// A map whose entries are computed on first access and never replaced.
///
/// Concurrent first accesses may each run the fill; the first insert wins
/// and every caller observes that value. The fill runs outside the lock, so
/// readers are only blocked for the insert itself.
#[derive(Debug)]
pub struct FillOnceCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for FillOnceCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> FillOnceCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Return the cached value for `key`, filling it with `fill` if absent.
    ///
    /// A failed fill caches nothing.
    pub fn get_or_try_fill<E>(&self, key: &K, fill: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fill()?;
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(key.clone()).or_insert(value).clone())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
