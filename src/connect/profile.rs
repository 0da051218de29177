//! Provider connection profiles
//!
//! Describes how a target provider links services together: either string
//! templates substituted into environment values, or provider-native
//! structured references. Catalog and property-table data is supplied by
//! the caller; the pipeline only queries it.

use crate::model::ImageReference;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logical property name for a database connection string
pub const PROP_CONNECTION_STRING: &str = "connectionString";
/// Logical property name for a service host/port pair
pub const PROP_HOST_PORT: &str = "hostport";

/// Managed database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    Mysql,
    Mariadb,
    Mongo,
    Redis,
}

impl DatabaseEngine {
    /// Key-value engines get a distinct structured-reference kind
    pub fn is_key_value(&self) -> bool {
        matches!(self, Self::Redis)
    }
}

/// Catalog entry for one managed database image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub engine: DatabaseEngine,
    pub default_port: u16,
}

/// Managed database catalog: image repository -> managed-service metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseCatalog(pub HashMap<String, DatabaseEntry>);

impl DatabaseCatalog {
    /// Catalog entry for an image, if its repository is a known database
    pub fn lookup(&self, image: &ImageReference) -> Option<&DatabaseEntry> {
        self.0.get(&image.repository)
    }
}

/// Maps logical property names to provider field names, per target kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyTable {
    /// Properties for plain service targets
    #[serde(default)]
    pub service: HashMap<String, String>,
    /// Properties for managed database targets
    #[serde(default)]
    pub database: HashMap<String, String>,
}

impl PropertyTable {
    /// Provider field name for a logical property
    ///
    /// Unknown properties pass through unchanged after a warning, so new
    /// provider fields work without a code change.
    pub fn concrete<'a>(&'a self, logical: &'a str, database: bool) -> &'a str {
        let table = if database { &self.database } else { &self.service };
        match table.get(logical) {
            Some(name) => name.as_str(),
            None => {
                tracing::warn!(
                    property = logical,
                    database,
                    "unknown logical property, passing through unchanged"
                );
                logical
            }
        }
    }
}

/// Target-name restrictions for string-template providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameRules {
    /// Force lowercase
    #[serde(default)]
    pub lowercase: bool,
    /// Maximum length, unbounded when absent
    #[serde(default)]
    pub max_length: Option<usize>,
}

impl NameRules {
    /// Apply the restrictions: strip to `[A-Za-z0-9-]`, then case and length
    pub fn apply(&self, name: &str) -> String {
        let mut out: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        if self.lowercase {
            out = out.to_lowercase();
        }
        if let Some(max) = self.max_length {
            out.truncate(max);
        }
        out
    }
}

/// How environment-variable names are matched against a mapping
///
/// `Substring` is the default heuristic: a candidate `REDIS` matches both
/// `REDIS_URL` and `REDIS_PASSWORD`, but also `REDIS_ENABLED`. `Exact` is
/// the stricter alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    Substring,
    Exact,
}

impl MatchPolicy {
    /// Whether an actual variable name matches a candidate name
    pub fn matches(&self, candidate: &str, actual: &str) -> bool {
        match self {
            Self::Substring => actual == candidate || actual.contains(candidate),
            Self::Exact => actual == candidate,
        }
    }
}

/// Profile for providers that link via templated reference strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringTemplateProfile {
    /// Template for service targets; `{name}` and `{property}` placeholders
    pub service_template: String,
    /// Template for managed-database targets
    pub database_template: String,
    /// Target-name restrictions applied before rendering
    #[serde(default)]
    pub name_rules: NameRules,
    #[serde(default)]
    pub properties: PropertyTable,
    #[serde(default)]
    pub catalog: DatabaseCatalog,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

impl StringTemplateProfile {
    /// Render the reference string for a target
    pub fn render(&self, target: &str, property: &str, database: bool) -> String {
        let template = if database {
            &self.database_template
        } else {
            &self.service_template
        };
        let name = self.name_rules.apply(target);
        template
            .replace("{name}", &name)
            .replace("{property}", property)
    }
}

/// Profile for providers with native structured references
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredReferenceProfile {
    #[serde(default)]
    pub properties: PropertyTable,
    #[serde(default)]
    pub catalog: DatabaseCatalog,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

/// How a provider expresses service-to-service links
///
/// Dispatched exhaustively once per resolution call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkStrategy {
    /// Substitute templated reference strings into environment values
    Template(StringTemplateProfile),
    /// Emit provider-native structured reference descriptors
    Structured(StructuredReferenceProfile),
}

impl LinkStrategy {
    pub fn catalog(&self) -> &DatabaseCatalog {
        match self {
            Self::Template(p) => &p.catalog,
            Self::Structured(p) => &p.catalog,
        }
    }

    pub fn properties(&self) -> &PropertyTable {
        match self {
            Self::Template(p) => &p.properties,
            Self::Structured(p) => &p.properties,
        }
    }

    pub fn match_policy(&self) -> MatchPolicy {
        match self {
            Self::Template(p) => p.match_policy,
            Self::Structured(p) => p.match_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        let rules = NameRules {
            lowercase: true,
            max_length: Some(8),
        };
        assert_eq!(rules.apply("My_Service.Name"), "myservic");
        assert_eq!(NameRules::default().apply("web"), "web");
    }

    #[test]
    fn test_match_policy() {
        assert!(MatchPolicy::Substring.matches("REDIS", "REDIS_URL"));
        assert!(MatchPolicy::Substring.matches("REDIS", "REDIS"));
        assert!(!MatchPolicy::Exact.matches("REDIS", "REDIS_URL"));
        assert!(MatchPolicy::Exact.matches("REDIS", "REDIS"));
    }

    #[test]
    fn test_property_table_pass_through() {
        let mut table = PropertyTable::default();
        table
            .database
            .insert(PROP_CONNECTION_STRING.to_string(), "connection_url".to_string());
        assert_eq!(table.concrete(PROP_CONNECTION_STRING, true), "connection_url");
        assert_eq!(table.concrete("custom", true), "custom");
    }

    #[test]
    fn test_render_templates() {
        let profile = StringTemplateProfile {
            service_template: "${{name}.{property}}".to_string(),
            database_template: "${{name}-db.{property}}".to_string(),
            name_rules: NameRules {
                lowercase: true,
                max_length: None,
            },
            properties: PropertyTable::default(),
            catalog: DatabaseCatalog::default(),
            match_policy: MatchPolicy::default(),
        };
        assert_eq!(profile.render("Web", "host", false), "${web.host}");
        assert_eq!(profile.render("Db", "url", true), "${db-db.url}");
    }
}
