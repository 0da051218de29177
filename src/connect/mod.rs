//! Service connection resolution
//!
//! Detects which environment variables on one service reference another
//! service and rewrites them into the target provider's native linking
//! mechanism.

pub mod profile;

pub use profile::{
    DatabaseCatalog, DatabaseEngine, DatabaseEntry, LinkStrategy, MatchPolicy, NameRules,
    PropertyTable, StringTemplateProfile, StructuredReferenceProfile,
    PROP_CONNECTION_STRING, PROP_HOST_PORT,
};

use crate::model::{AppConfig, EnvVarReference, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-declared connection between two services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMapping {
    /// Service whose environment references the target
    pub from: String,
    /// Referenced service
    pub to: String,
    /// Environment variable names believed to reference the target
    pub variables: Vec<String>,
    /// Logical property to expose; defaults by target kind when absent
    #[serde(default)]
    pub property: Option<String>,
}

/// Original and rewritten value of one matched variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRewrite {
    pub original: String,
    pub transformed: String,
}

/// Resolved connection, one per processed mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedConnection {
    pub from: String,
    pub to: String,
    /// Provider-side property the connection exposes
    pub property: String,
    /// Whether the target matched the managed-database catalog
    pub database: bool,
    /// Rewrites keyed by matched variable name
    pub variables: HashMap<String, VariableRewrite>,
}

/// Resolve connection mappings against a configuration
///
/// Never fails: mappings naming unknown services are skipped with a
/// warning, and unmatched variables simply produce empty rewrite maps.
/// Rewrites mutate the source service's environment only; targets are
/// never touched. The resolved connections are returned and also attached
/// to the configuration.
pub fn resolve_connections(
    config: &mut AppConfig,
    mappings: &[ConnectionMapping],
    strategy: &LinkStrategy,
) -> Vec<ResolvedConnection> {
    let mut resolved = Vec::new();

    for mapping in mappings {
        if !config.services.contains_key(&mapping.from) {
            tracing::warn!(
                service = %mapping.from,
                "skipping connection mapping, source service not in configuration"
            );
            continue;
        }
        let Some(target) = config.services.get(&mapping.to) else {
            tracing::warn!(
                service = %mapping.to,
                "skipping connection mapping, target service not in configuration"
            );
            continue;
        };

        let entry = strategy.catalog().lookup(&target.image).cloned();
        let database = entry.is_some();

        let logical = mapping.property.clone().unwrap_or_else(|| {
            if database {
                PROP_CONNECTION_STRING.to_string()
            } else {
                PROP_HOST_PORT.to_string()
            }
        });
        let property = strategy
            .properties()
            .concrete(&logical, database)
            .to_string();

        let policy = strategy.match_policy();
        // Borrow of the target ends before the source is mutated.
        let Some(source) = config.services.get_mut(&mapping.from) else {
            continue;
        };
        let matched: Vec<String> = source
            .environment
            .keys()
            .filter(|name| {
                mapping
                    .variables
                    .iter()
                    .any(|candidate| policy.matches(candidate, name))
            })
            .cloned()
            .collect();

        let mut variables = HashMap::new();
        match strategy {
            LinkStrategy::Template(profile) => {
                let reference = profile.render(&mapping.to, &property, database);
                for name in matched {
                    let original = source
                        .environment
                        .insert(name.clone(), reference.clone())
                        .unwrap_or_default();
                    variables.insert(
                        name,
                        VariableRewrite {
                            original,
                            transformed: reference.clone(),
                        },
                    );
                }
            }
            LinkStrategy::Structured(_) => {
                let kind = match &entry {
                    Some(entry) if entry.engine.is_key_value() => ReferenceKind::KeyValueStore,
                    Some(_) => ReferenceKind::Database,
                    None => ReferenceKind::Service,
                };
                let transformed = format!("${{{}.{}}}", mapping.to, property);
                for name in matched {
                    let original = source.environment.remove(&name).unwrap_or_default();
                    source.env_references.push(EnvVarReference {
                        key: name.clone(),
                        target: mapping.to.clone(),
                        kind,
                        property: property.clone(),
                    });
                    variables.insert(
                        name,
                        VariableRewrite {
                            original,
                            transformed: transformed.clone(),
                        },
                    );
                }
            }
        }

        resolved.push(ResolvedConnection {
            from: mapping.from.clone(),
            to: mapping.to.clone(),
            property,
            database,
            variables,
        });
    }

    config.connections = resolved.clone();
    resolved
}
