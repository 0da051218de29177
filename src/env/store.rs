//! Environment persistence store
//!
//! Keyed cache so repeated translations of the same logical deployment
//! reuse previously generated secrets instead of regenerating them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type ServiceEnvs = HashMap<String, HashMap<String, String>>;

/// Persistence store keyed by (persistence key, service name)
///
/// Explicitly constructed and injectable; clones share the same underlying
/// state. Callers wanting isolation construct independent stores. Without a
/// persistence key the store is never consulted, so each call stands alone.
#[derive(Debug, Clone, Default)]
pub struct EnvStore {
    inner: Arc<RwLock<HashMap<String, ServiceEnvs>>>,
}

impl EnvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment previously persisted for (key, service), if any
    pub fn get(&self, key: &str, service: &str) -> Option<HashMap<String, String>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.get(key)?.get(service).cloned()
    }

    /// Persist the final environment for (key, service)
    pub fn put(&self, key: &str, service: &str, env: HashMap<String, String>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .entry(key.to_string())
            .or_default()
            .insert(service.to_string(), env);
    }

    /// Clear one persistence key, or everything when `key` is `None`
    pub fn clear(&self, key: Option<&str>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match key {
            Some(key) => {
                let _ = inner.remove(key);
            }
            None => inner.clear(),
        }
        tracing::debug!(key = ?key, "cleared persisted environments");
    }

    /// Number of persistence keys currently held
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_put_then_get() {
        let store = EnvStore::new();
        store.put("deploy-1", "db", env_of(&[("PASSWORD", "abc")]));
        let env = store.get("deploy-1", "db").unwrap();
        assert_eq!(env["PASSWORD"], "abc");
        assert!(store.get("deploy-1", "web").is_none());
        assert!(store.get("deploy-2", "db").is_none());
    }

    #[test]
    fn test_clear_one_key() {
        let store = EnvStore::new();
        store.put("a", "db", env_of(&[("X", "1")]));
        store.put("b", "db", env_of(&[("X", "2")]));
        store.clear(Some("a"));
        assert!(store.get("a", "db").is_none());
        assert!(store.get("b", "db").is_some());
    }

    #[test]
    fn test_clear_everything() {
        let store = EnvStore::new();
        store.put("a", "db", env_of(&[("X", "1")]));
        store.put("b", "db", env_of(&[("X", "2")]));
        store.clear(None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let store = EnvStore::new();
        let view = store.clone();
        store.put("a", "db", env_of(&[("X", "1")]));
        assert!(view.get("a", "db").is_some());
    }
}
