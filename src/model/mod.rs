//! Canonical application model
//!
//! The provider-agnostic representation every source parser produces and
//! every provider renderer consumes.

pub mod image;
pub mod port;
pub mod volume;

pub use image::{ImageReference, RegistryKind};
pub use port::{PortMapping, Protocol};
pub use volume::VolumeMapping;

use crate::connect::ResolvedConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a provider-native structured reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// Another service in the same application
    Service,
    /// A managed relational database
    Database,
    /// A managed key-value store
    KeyValueStore,
}

/// Provider-native environment variable reference
///
/// Output-only: populated by connection resolution when the target provider
/// links services through structured references instead of string
/// templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarReference {
    /// Environment variable the reference replaces
    pub key: String,
    /// Referenced service or database name
    pub target: String,
    /// Reference kind
    pub kind: ReferenceKind,
    /// Provider-side property exposed through the reference
    pub property: String,
}

/// One container service in the canonical model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerService {
    /// Parsed image reference
    pub image: ImageReference,
    /// Port mappings
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    /// Volume mappings
    #[serde(default)]
    pub volumes: Vec<VolumeMapping>,
    /// Environment variables
    #[serde(default)]
    pub environment: HashMap<String, String>,
    /// Start command, when the source overrides the image default
    pub command: Option<String>,
    /// Restart policy, verbatim from the source
    pub restart: Option<String>,
    /// Structured references emitted by connection resolution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_references: Vec<EnvVarReference>,
}

impl ContainerService {
    /// Create a service around a parsed image
    pub fn new(image: ImageReference) -> Self {
        Self {
            image,
            ports: Vec::new(),
            volumes: Vec::new(),
            environment: HashMap::new(),
            command: None,
            restart: None,
            env_references: Vec::new(),
        }
    }
}

/// Canonical application configuration
///
/// Maps caller-assigned service names to services. Created fresh per
/// translation call; only the environment persistence store outlives it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Services keyed by unique name
    pub services: HashMap<String, ContainerService>,
    /// Connections annotated by the connection resolver
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ResolvedConnection>,
}

impl AppConfig {
    /// Number of services in the configuration
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the configuration holds no services
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
