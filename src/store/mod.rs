// Keyed Store Module
// Lock-guarded in-memory maps behind an injectable trait, one independent lock per store

use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::shop::models::{Cart, Order, Product};

/// A keyed mapping that handlers read and mutate.
///
/// Every call is internally consistent on its own. Nothing spans two calls or two stores,
/// so a read followed by a `set` may interleave with other writers; use `modify` when the
/// decision and the write must happen under the same lock.
pub trait KeyValueStore<K, V>: Send + Sync {
    /// Clone out the value stored under `key`
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or replace the value under `key`
    fn set(&self, key: K, value: V);

    /// Remove and return the value under `key`
    fn delete(&self, key: &K) -> Option<V>;

    /// Snapshot of every entry, in no particular order
    fn list(&self) -> Vec<(K, V)>;

    /// Apply `apply` to the entry under `key` while holding the write lock.
    /// Returns false when the key is absent, in which case `apply` is not called.
    fn modify(&self, key: &K, apply: &mut dyn FnMut(&mut V)) -> bool;

    /// Number of entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store guarded by a reader/writer lock
pub struct MemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyValueStore<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    fn delete(&self, key: &K) -> Option<V> {
        self.entries.write().remove(key)
    }

    fn list(&self) -> Vec<(K, V)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn modify(&self, key: &K, apply: &mut dyn FnMut(&mut V)) -> bool {
        match self.entries.write().get_mut(key) {
            Some(value) => {
                apply(value);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

pub type SessionMap = Arc<dyn KeyValueStore<String, String>>;
pub type ProductMap = Arc<dyn KeyValueStore<String, Product>>;
pub type CartMap = Arc<dyn KeyValueStore<String, Cart>>;
pub type OrderMap = Arc<dyn KeyValueStore<String, Order>>;

/// The four process-wide stores shared by every shop variant
#[derive(Clone)]
pub struct Stores {
    /// session id -> user id
    pub sessions: SessionMap,

    /// product id -> product
    pub products: ProductMap,

    /// session id -> cart
    pub carts: CartMap,

    /// order id -> order
    pub orders: OrderMap,
}

impl Stores {
    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(MemoryStore::new()),
            products: Arc::new(MemoryStore::new()),
            carts: Arc::new(MemoryStore::new()),
            orders: Arc::new(MemoryStore::new()),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store: MemoryStore<String, u32> = MemoryStore::new();
        assert!(store.is_empty());

        store.set("a".to_string(), 1);
        store.set("a".to_string(), 2);
        assert_eq!(store.get(&"a".to_string()), Some(2));
        assert_eq!(store.len(), 1);

        assert_eq!(store.delete(&"a".to_string()), Some(2));
        assert_eq!(store.get(&"a".to_string()), None);
        assert_eq!(store.delete(&"a".to_string()), None);
    }

    #[test]
    fn test_modify_missing_key() {
        let store: MemoryStore<String, u32> = MemoryStore::new();
        let mut called = false;
        let existed = store.modify(&"missing".to_string(), &mut |_| called = true);

        assert!(!existed);
        assert!(!called);
    }

    #[test]
    fn test_modify_in_place() {
        let store: MemoryStore<String, u32> = MemoryStore::new();
        store.set("n".to_string(), 41);

        assert!(store.modify(&"n".to_string(), &mut |v| *v += 1));
        assert_eq!(store.get(&"n".to_string()), Some(42));
    }

    #[test]
    fn test_concurrent_modify() {
        let store: Arc<MemoryStore<String, u64>> = Arc::new(MemoryStore::new());
        store.set("counter".to_string(), 0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        store.modify(&"counter".to_string(), &mut |v| *v += 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get(&"counter".to_string()), Some(8000));
    }

    #[test]
    fn test_stores_are_independent() {
        let stores = Stores::in_memory();
        stores.sessions.set("s".to_string(), "u".to_string());

        assert_eq!(stores.sessions.len(), 1);
        assert!(stores.carts.is_empty());
        assert!(stores.orders.is_empty());
        assert!(stores.products.is_empty());
    }
}
