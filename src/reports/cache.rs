//! In-memory TTL cache for the product cost endpoints
//!
//! Catalog costs change only when a new period is loaded, so responses are
//! held for half an hour and dropped on demand via the clear endpoint.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

pub const PRODUCT_COST_TTL: Duration = Duration::from_secs(1800);

#[derive(Debug)]
pub struct SimpleCache<T> {
    entries: Mutex<HashMap<String, (T, Instant)>>,
    ttl: Duration,
}

impl<T: Clone> SimpleCache<T> {
    pub fn new(ttl: Duration) -> Self {
        SimpleCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.get(key) {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: T) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), (value, Instant::now()));
    }

    pub fn clear(&self) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }
}

/// One cache per product cost endpoint, all cleared together.
#[derive(Debug)]
pub struct ReportCaches {
    pub products: SimpleCache<Value>,
    pub variants: SimpleCache<Value>,
    pub cogs: SimpleCache<Value>,
    pub etsy_fee: SimpleCache<Value>,
    pub margin: SimpleCache<Value>,
}

impl ReportCaches {
    pub fn new() -> Self {
        ReportCaches {
            products: SimpleCache::new(PRODUCT_COST_TTL),
            variants: SimpleCache::new(PRODUCT_COST_TTL),
            cogs: SimpleCache::new(PRODUCT_COST_TTL),
            etsy_fee: SimpleCache::new(PRODUCT_COST_TTL),
            margin: SimpleCache::new(PRODUCT_COST_TTL),
        }
    }

    pub fn clear_all(&self) {
        self.products.clear();
        self.variants.clear();
        self.cogs.clear();
        self.etsy_fee.clear();
        self.margin.clear();
    }
}

impl Default for ReportCaches {
    fn default() -> Self {
        ReportCaches::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stores_and_returns_within_ttl() {
        let cache = SimpleCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
        cache.set("k", json!({"data": 1}));
        assert_eq!(cache.get("k"), Some(json!({"data": 1})));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = SimpleCache::new(Duration::ZERO);
        cache.set("k", json!(1));
        assert_eq!(cache.get("k"), None);
        // The lookup also evicted it.
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_all_empties_every_cache() {
        let caches = ReportCaches::new();
        caches.products.set("p", json!(1));
        caches.margin.set("m:SKU1", json!(2));
        caches.clear_all();
        assert_eq!(caches.products.get("p"), None);
        assert_eq!(caches.margin.get("m:SKU1"), None);
    }
}
