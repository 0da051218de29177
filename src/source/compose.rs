//! Docker Compose source parser

use crate::env::{self, EnvDeclarations, EnvOptions, EnvStore};
use crate::error::{Result, StevedoreError};
use crate::model::{AppConfig, ContainerService, ImageReference, PortMapping, VolumeMapping};
use serde::Deserialize;
use std::collections::HashMap;

/// Compose document, trimmed to the fields the canonical model carries
#[derive(Debug, Clone, Deserialize)]
struct ComposeDocument {
    #[serde(default)]
    services: HashMap<String, ComposeService>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ComposeService {
    #[serde(default)]
    image: Option<String>,
    /// Only probed for presence; building images is unsupported
    #[serde(default)]
    build: Option<serde_yaml::Value>,
    #[serde(default)]
    command: Option<CommandConfig>,
    #[serde(default)]
    environment: Option<EnvDeclarations>,
    #[serde(default)]
    ports: Option<Vec<PortEntry>>,
    #[serde(default)]
    volumes: Option<Vec<String>>,
    #[serde(default)]
    restart: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandConfig {
    /// Shell command string
    Shell(String),
    /// Exec form array
    Exec(Vec<String>),
}

impl CommandConfig {
    fn joined(&self) -> String {
        match self {
            Self::Shell(s) => s.clone(),
            Self::Exec(parts) => parts.join(" "),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PortEntry {
    Number(i64),
    Text(String),
}

impl PortEntry {
    fn as_spec(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Compose file parser
pub struct ComposeSource;

impl ComposeSource {
    /// Validate compose content without building a configuration
    pub fn validate(content: &str) -> Result<()> {
        let document = Self::parse_document(content)?;
        if document.services.is_empty() {
            return Err(StevedoreError::Validation(
                "compose file declares no services".to_string(),
            ));
        }
        for (name, service) in &document.services {
            if service.image.is_none() {
                let detail = if service.build.is_some() {
                    "'build' is not supported, an 'image' is required"
                } else {
                    "an 'image' is required"
                };
                return Err(StevedoreError::Validation(format!(
                    "service '{}': {}",
                    name, detail
                )));
            }
        }
        Ok(())
    }

    /// Parse compose content into the canonical configuration
    pub fn parse(
        content: &str,
        options: &EnvOptions,
        store: &EnvStore,
    ) -> Result<AppConfig> {
        Self::validate(content)?;
        let document = Self::parse_document(content)?;

        let mut config = AppConfig::default();
        for (name, declared) in document.services {
            // validate() already rejected image-less services
            let raw_image = declared.image.as_deref().unwrap_or_default();
            let image = ImageReference::parse(raw_image)?;

            let parsed_env = declared
                .environment
                .as_ref()
                .map(|decls| {
                    env::resolver::normalize(decls, &options.variables, options.substitution)
                })
                .unwrap_or_default();
            let environment = env::finalize(&name, &image, parsed_env, options, store);

            let mut service = ContainerService::new(image);
            service.environment = environment;
            service.command = declared.command.as_ref().map(CommandConfig::joined);
            service.restart = declared.restart;
            if let Some(ports) = &declared.ports {
                service.ports = ports
                    .iter()
                    .map(|p| PortMapping::normalize(&p.as_spec()))
                    .collect();
            }
            if let Some(volumes) = &declared.volumes {
                service.volumes = volumes
                    .iter()
                    .map(|v| VolumeMapping::normalize(v))
                    .collect();
            }

            let _ = config.services.insert(name, service);
        }

        Ok(config)
    }

    fn parse_document(content: &str) -> Result<ComposeDocument> {
        serde_yaml::from_str(content)
            .map_err(|e| StevedoreError::ComposeParse(format!("failed to parse YAML: {}", e)))
    }
}
