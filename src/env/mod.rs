//! Environment handling
//!
//! Declares the resolution, generation, and persistence layers, plus the
//! shared per-service pipeline both source parsers run: resolve declared
//! values, merge persisted values over them, generate what is still a
//! placeholder, and write the result back to the store.

pub mod generator;
pub mod resolver;
pub mod store;

pub use generator::{
    generate_environment, CharClass, GenerationRules, SemverMatcher, ValueSpec,
    VersionMatcher,
};
pub use resolver::{EnvDeclarations, SubstitutionMode};
pub use store::EnvStore;

use crate::model::ImageReference;
use std::collections::HashMap;

/// Per-call environment options
///
/// `variables` feeds `${VAR:-default}` substitution, `rules` drives value
/// generation, and `persistence_key` scopes the cross-call cache. The
/// version matcher is injectable; the default uses the `semver` crate.
pub struct EnvOptions {
    /// Variable table for `${VAR:-default}` substitution
    pub variables: HashMap<String, String>,
    /// Generation rules, empty when no values should be synthesized
    pub rules: GenerationRules,
    /// Cache key scoping persisted environments to one logical deployment
    pub persistence_key: Option<String>,
    /// Substitution behavior (first occurrence only by default)
    pub substitution: SubstitutionMode,
    /// Version matcher used to select generation rule sets
    pub matcher: Box<dyn VersionMatcher + Send + Sync>,
}

impl Default for EnvOptions {
    fn default() -> Self {
        Self {
            variables: HashMap::new(),
            rules: GenerationRules::default(),
            persistence_key: None,
            substitution: SubstitutionMode::default(),
            matcher: Box::new(SemverMatcher),
        }
    }
}

/// Run the shared environment pipeline for one service
///
/// Order matters: persisted values are merged over the parsed ones before
/// generation, so previously issued secrets are never regenerated. The
/// final map is written back under the same key. Without a persistence key
/// the store is untouched.
pub(crate) fn finalize(
    service_name: &str,
    image: &ImageReference,
    parsed: HashMap<String, String>,
    options: &EnvOptions,
    store: &EnvStore,
) -> HashMap<String, String> {
    let mut env = parsed;

    if let Some(key) = &options.persistence_key {
        if let Some(persisted) = store.get(key, service_name) {
            for (name, value) in persisted {
                let _ = env.insert(name, value);
            }
        }
    }

    let env = generate_environment(&env, image, &options.rules, options.matcher.as_ref());

    if let Some(key) = &options.persistence_key {
        store.put(key, service_name, env.clone());
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_values_win_over_parsed() {
        let store = EnvStore::new();
        store.put("k", "db", {
            let mut m = HashMap::new();
            m.insert("PASSWORD".to_string(), "persisted".to_string());
            m
        });

        let mut parsed = HashMap::new();
        parsed.insert("PASSWORD".to_string(), "fresh".to_string());
        parsed.insert("USER".to_string(), "admin".to_string());

        let options = EnvOptions {
            persistence_key: Some("k".to_string()),
            ..EnvOptions::default()
        };
        let image = ImageReference::parse("postgres").unwrap();
        let env = finalize("db", &image, parsed, &options, &store);

        assert_eq!(env["PASSWORD"], "persisted");
        assert_eq!(env["USER"], "admin");
    }

    #[test]
    fn test_no_key_leaves_store_untouched() {
        let store = EnvStore::new();
        let mut parsed = HashMap::new();
        parsed.insert("X".to_string(), "1".to_string());

        let image = ImageReference::parse("nginx").unwrap();
        let env = finalize("web", &image, parsed, &EnvOptions::default(), &store);

        assert_eq!(env["X"], "1");
        assert!(store.is_empty());
    }
}
