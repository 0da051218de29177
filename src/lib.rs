//! Stevedore - container descriptions to cloud deployment manifests
//!
//! Stevedore translates a container-service description (a Docker Compose
//! document or a single `docker run` invocation) into one canonical
//! application model that provider renderers (CloudFormation/ECS templates,
//! PaaS blueprints, managed-app specs, Helm charts) consume. It provides:
//!
//! - Image, port, and volume normalization
//! - Environment resolution with `${VAR:-default}` substitution
//! - Version-aware generation of passwords and other secret values
//! - Cross-call persistence of generated values per deployment key
//! - Service-to-service and service-to-database connection rewriting
//!
//! ```
//! use stevedore::{EnvOptions, Pipeline, SourceKind};
//!
//! let pipeline = Pipeline::new();
//! let config = pipeline
//!     .parse(
//!         "docker run -p 8080:80 -e NODE_ENV=production nginx",
//!         SourceKind::Run,
//!         &EnvOptions::default(),
//!     )
//!     .unwrap();
//! assert_eq!(config.services["default"].image.repository, "nginx");
//! ```

pub mod connect;
pub mod env;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod source;

pub use connect::{
    resolve_connections, ConnectionMapping, DatabaseCatalog, DatabaseEngine, DatabaseEntry,
    LinkStrategy, MatchPolicy, NameRules, PropertyTable, ResolvedConnection,
    StringTemplateProfile, StructuredReferenceProfile, VariableRewrite,
};
pub use env::{
    generate_environment, CharClass, EnvOptions, EnvStore, GenerationRules, SemverMatcher,
    ValueSpec, VersionMatcher,
};
pub use error::{Result, StevedoreError};
pub use model::{
    AppConfig, ContainerService, EnvVarReference, ImageReference, PortMapping, ReferenceKind,
    RegistryKind, VolumeMapping,
};
pub use pipeline::Pipeline;
pub use source::{parse, validate, SourceKind};
