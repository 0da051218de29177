//! Source parsers
//!
//! Both variants share one contract: validate the raw content, then build
//! one canonical configuration, routing all environment handling through
//! the shared pipeline so persisted and generated values come out the same
//! regardless of source syntax.

pub mod compose;
pub mod run;

pub use compose::ComposeSource;
pub use run::{RunCommandSource, DEFAULT_SERVICE_NAME};

use crate::env::{EnvOptions, EnvStore};
use crate::error::Result;
use crate::model::AppConfig;
use serde::{Deserialize, Serialize};

/// Source syntax of the translated content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Docker Compose document
    Compose,
    /// Single `docker run` invocation
    Run,
}

/// Validate content against a source kind
pub fn validate(content: &str, kind: SourceKind) -> Result<()> {
    match kind {
        SourceKind::Compose => ComposeSource::validate(content),
        SourceKind::Run => RunCommandSource::validate(content),
    }
}

/// Parse content into the canonical configuration
pub fn parse(
    content: &str,
    kind: SourceKind,
    options: &EnvOptions,
    store: &EnvStore,
) -> Result<AppConfig> {
    match kind {
        SourceKind::Compose => ComposeSource::parse(content, options, store),
        SourceKind::Run => RunCommandSource::parse(content, options, store),
    }
}
