use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// Keyed value store fed by platform events.
///
/// Each event overwrites the previous value for its key; nothing is evicted
/// unless taken.
pub struct EventCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for EventCache<K, V> {
    fn default() -> Self {
        EventCache {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> EventCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.insert(key, value);
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries.get(key).cloned()
    }

    pub fn take(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.remove(key)
    }
}
