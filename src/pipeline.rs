//! Translation pipeline facade
//!
//! Owns the environment persistence store and exposes the public entry
//! points. Construct one `Pipeline` per host process, or one per test for
//! isolation; the store is never a hidden singleton.

use crate::connect::{self, ConnectionMapping, LinkStrategy, ResolvedConnection};
use crate::env::{EnvOptions, EnvStore};
use crate::error::Result;
use crate::model::AppConfig;
use crate::source::{self, SourceKind};

/// Translation pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    store: EnvStore,
}

impl Pipeline {
    /// Create a pipeline with a fresh persistence store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline around an existing store
    pub fn with_store(store: EnvStore) -> Self {
        Self { store }
    }

    /// The pipeline's persistence store
    pub fn store(&self) -> &EnvStore {
        &self.store
    }

    /// Validate source content without building a configuration
    pub fn validate(&self, content: &str, kind: SourceKind) -> Result<()> {
        source::validate(content, kind)
    }

    /// Parse source content into the canonical configuration
    pub fn parse(
        &self,
        content: &str,
        kind: SourceKind,
        options: &EnvOptions,
    ) -> Result<AppConfig> {
        source::parse(content, kind, options, &self.store)
    }

    /// Resolve connection mappings into the provider's linking mechanism
    pub fn resolve_connections(
        &self,
        config: &mut AppConfig,
        mappings: &[ConnectionMapping],
        strategy: &LinkStrategy,
    ) -> Vec<ResolvedConnection> {
        connect::resolve_connections(config, mappings, strategy)
    }

    /// Clear one persistence key, or the whole store when `key` is `None`
    pub fn clear(&self, key: Option<&str>) {
        self.store.clear(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{GenerationRules, ValueSpec};
    use std::collections::HashMap;

    const COMPOSE: &str = r#"
services:
  db:
    image: postgres:13
    environment:
      POSTGRES_PASSWORD: ${POSTGRES_PASSWORD}
"#;

    fn password_options(key: Option<&str>) -> EnvOptions {
        let mut vars = HashMap::new();
        vars.insert(
            "POSTGRES_PASSWORD".to_string(),
            ValueSpec::Password { length: 16 },
        );
        let mut versions = HashMap::new();
        versions.insert("*".to_string(), vars);
        let mut images = HashMap::new();
        images.insert("postgres".to_string(), versions);

        EnvOptions {
            rules: GenerationRules(images),
            persistence_key: key.map(String::from),
            ..EnvOptions::default()
        }
    }

    #[test]
    fn test_same_key_reuses_generated_password() {
        let pipeline = Pipeline::new();
        let options = password_options(Some("deploy-1"));

        let first = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();
        let second = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();

        let a = &first.services["db"].environment["POSTGRES_PASSWORD"];
        let b = &second.services["db"].environment["POSTGRES_PASSWORD"];
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_clearing_key_regenerates() {
        let pipeline = Pipeline::new();
        let options = password_options(Some("deploy-2"));

        let first = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();
        pipeline.clear(Some("deploy-2"));
        let second = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();

        // 16 random characters colliding is possible but vanishingly so
        assert_ne!(
            first.services["db"].environment["POSTGRES_PASSWORD"],
            second.services["db"].environment["POSTGRES_PASSWORD"]
        );
    }

    #[test]
    fn test_no_key_means_independent_calls() {
        let pipeline = Pipeline::new();
        let options = password_options(None);

        let first = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();
        let second = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();

        assert!(pipeline.store().is_empty());
        assert_ne!(
            first.services["db"].environment["POSTGRES_PASSWORD"],
            second.services["db"].environment["POSTGRES_PASSWORD"]
        );
    }

    #[test]
    fn test_run_and_compose_share_persistence() {
        let pipeline = Pipeline::new();
        let options = password_options(Some("deploy-3"));

        let compose = pipeline
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();
        // The run variant persists under its own service name ("default")
        let run = pipeline
            .parse(
                "docker run -e POSTGRES_PASSWORD=${POSTGRES_PASSWORD} postgres:13",
                SourceKind::Run,
                &options,
            )
            .unwrap();
        let run_again = pipeline
            .parse(
                "docker run -e POSTGRES_PASSWORD=${POSTGRES_PASSWORD} postgres:13",
                SourceKind::Run,
                &options,
            )
            .unwrap();

        assert_eq!(
            run.services["default"].environment["POSTGRES_PASSWORD"],
            run_again.services["default"].environment["POSTGRES_PASSWORD"]
        );
        assert_ne!(
            compose.services["db"].environment["POSTGRES_PASSWORD"],
            ""
        );
    }

    #[test]
    fn test_independent_pipelines_do_not_share() {
        let options = password_options(Some("deploy-4"));
        let a = Pipeline::new()
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();
        let b = Pipeline::new()
            .parse(COMPOSE, SourceKind::Compose, &options)
            .unwrap();
        assert_ne!(
            a.services["db"].environment["POSTGRES_PASSWORD"],
            b.services["db"].environment["POSTGRES_PASSWORD"]
        );
    }
}
