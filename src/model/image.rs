//! Image reference parsing and normalization

use crate::error::{Result, StevedoreError};
use serde::{Deserialize, Serialize};

/// Registry the image resolves against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Public Docker Hub
    DockerHub,
    /// Any other registry (addressed by host)
    Private,
}

/// Parsed container image reference
///
/// Immutable once parsed. When both a tag and a digest are present the
/// digest is authoritative for resolution; the tag is retained for
/// version matching of generation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Registry kind
    pub kind: RegistryKind,
    /// Registry host (only for non-Hub registries)
    pub registry: Option<String>,
    /// Repository name (last path segment for registry-qualified images)
    pub repository: String,
    /// Tag, if given
    pub tag: Option<String>,
    /// Content digest (hex portion of `@sha256:...`), if given
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse a raw image string
    ///
    /// Accepts `name`, `name:tag`, `registry/path/name:tag`, each optionally
    /// suffixed with `@sha256:<digest>`. Registry-qualified paths keep only
    /// the last path segment as the repository.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StevedoreError::InvalidImage(
                "image string is empty".to_string(),
            ));
        }

        // Digest is stripped before tag splitting so the tag separator
        // search never lands inside the digest.
        let (remainder, digest) = match raw.split_once("@sha256:") {
            Some((head, hex)) => (head, Some(hex.to_string())),
            None => (raw, None),
        };

        let remainder = remainder.trim_end_matches('/');
        if remainder.is_empty() {
            return Err(StevedoreError::InvalidImage(format!(
                "no repository in '{}'",
                raw
            )));
        }

        let (registry, path) = match remainder.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => {
                (Some(first.to_string()), rest)
            }
            _ => (None, remainder),
        };

        // Tag separator only counts after the last path separator, so a
        // registry port is never mistaken for a tag.
        let last_segment = path.rsplit('/').next().unwrap_or(path);
        let (name_path, tag) = match last_segment.split_once(':') {
            Some((name, tag)) if !tag.is_empty() => {
                let prefix_len = path.len() - last_segment.len();
                let mut full = path[..prefix_len].to_string();
                full.push_str(name);
                (full, Some(tag.to_string()))
            }
            _ => (path.to_string(), None),
        };

        let repository = if registry.is_some() {
            name_path
                .rsplit('/')
                .next()
                .unwrap_or(&name_path)
                .to_string()
        } else {
            name_path
        };

        if repository.is_empty() {
            return Err(StevedoreError::InvalidImage(format!(
                "no repository in '{}'",
                raw
            )));
        }

        let kind = if registry.is_some() {
            RegistryKind::Private
        } else {
            RegistryKind::DockerHub
        };

        Ok(Self {
            kind,
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Tag used for resolution, defaulting to `latest`
    pub fn resolved_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }

    /// Reconstruct the canonical image string
    ///
    /// Parsing the result yields an equal reference (registry-qualified
    /// namespaces are already normalized away at parse time).
    pub fn reference(&self) -> String {
        let mut s = String::new();
        if let Some(registry) = &self.registry {
            s.push_str(registry);
            s.push('/');
        }
        s.push_str(&self.repository);
        if let Some(tag) = &self.tag {
            s.push(':');
            s.push_str(tag);
        }
        if let Some(digest) = &self.digest {
            s.push_str("@sha256:");
            s.push_str(digest);
        }
        s
    }

    /// Fully qualified image URL
    ///
    /// Preserves the official-image convention: bare Hub names resolve
    /// under `docker.io/library/`.
    pub fn url(&self) -> String {
        let mut s = match (&self.kind, &self.registry) {
            (RegistryKind::Private, Some(registry)) => {
                format!("{}/{}", registry, self.repository)
            }
            _ if self.repository.contains('/') => {
                format!("docker.io/{}", self.repository)
            }
            _ => format!("docker.io/library/{}", self.repository),
        };
        if let Some(digest) = &self.digest {
            s.push_str("@sha256:");
            s.push_str(digest);
        } else {
            s.push(':');
            s.push_str(self.resolved_tag());
        }
        s
    }
}

/// A first path segment names a registry when it looks like a host
fn is_registry_host(segment: &str) -> bool {
    segment == "localhost" || segment.contains('.') || segment.contains(':')
}
