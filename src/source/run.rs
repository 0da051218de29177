//! `docker run` source parser
//!
//! Parses a single-line invocation covering the subset of the real CLI the
//! canonical model can express. Unknown flags are skipped, not rejected.

use crate::env::{self, EnvDeclarations, EnvOptions, EnvStore};
use crate::error::{Result, StevedoreError};
use crate::model::{AppConfig, ContainerService, ImageReference, PortMapping, VolumeMapping};

/// Service name assigned to the single parsed container
pub const DEFAULT_SERVICE_NAME: &str = "default";

/// Run-command parser
pub struct RunCommandSource;

impl RunCommandSource {
    /// Validate that the content is a `docker run` invocation
    pub fn validate(content: &str) -> Result<()> {
        let tokens = tokenize(content);
        match (tokens.first(), tokens.get(1)) {
            (Some(a), Some(b)) if a == "docker" && b == "run" => Ok(()),
            _ => Err(StevedoreError::RunParse(format!(
                "expected a 'docker run' command, got '{}'",
                content.trim()
            ))),
        }
    }

    /// Parse a run command into a single-service configuration
    pub fn parse(
        content: &str,
        options: &EnvOptions,
        store: &EnvStore,
    ) -> Result<AppConfig> {
        Self::validate(content)?;
        let tokens = tokenize(content);

        let mut ports = Vec::new();
        let mut volumes = Vec::new();
        let mut env_entries = Vec::new();
        let mut image_token: Option<String> = None;
        let mut command_tokens = Vec::new();

        let mut i = 2;
        while i < tokens.len() {
            let token = &tokens[i];

            if image_token.is_some() {
                command_tokens.push(token.clone());
                i += 1;
                continue;
            }

            if let Some(flag) = token.strip_prefix('-') {
                let flag = flag.trim_start_matches('-');
                let (name, inline_value) = match flag.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_string())),
                    None => (flag, None),
                };

                let take_value = |i: &mut usize| -> Option<String> {
                    if let Some(value) = &inline_value {
                        return Some(value.clone());
                    }
                    *i += 1;
                    tokens.get(*i).cloned()
                };

                match name {
                    "p" | "publish" => {
                        if let Some(value) = take_value(&mut i) {
                            ports.push(PortMapping::normalize(&value));
                        }
                    }
                    "e" | "env" => {
                        if let Some(value) = take_value(&mut i) {
                            env_entries.push(value);
                        }
                    }
                    "v" | "volume" => {
                        if let Some(value) = take_value(&mut i) {
                            volumes.push(VolumeMapping::normalize(&value));
                        }
                    }
                    _ => {
                        // Unknown flag: long-form flags look like they take
                        // a value, so the next non-flag token is skipped too.
                        tracing::warn!(flag = %token, "skipping unsupported flag");
                        if token.starts_with("--")
                            && inline_value.is_none()
                            && tokens.get(i + 1).is_some_and(|t| !t.starts_with('-'))
                        {
                            i += 1;
                        }
                    }
                }
            } else {
                image_token = Some(token.clone());
            }

            i += 1;
        }

        let Some(raw_image) = image_token else {
            return Err(StevedoreError::Validation(
                "run command names no image".to_string(),
            ));
        };
        let image = ImageReference::parse(&raw_image)?;

        let parsed_env = env::resolver::normalize(
            &EnvDeclarations::Array(env_entries),
            &options.variables,
            options.substitution,
        );
        let environment =
            env::finalize(DEFAULT_SERVICE_NAME, &image, parsed_env, options, store);

        let mut service = ContainerService::new(image);
        service.ports = ports;
        service.volumes = volumes;
        service.environment = environment;
        if !command_tokens.is_empty() {
            service.command = Some(command_tokens.join(" "));
        }

        let mut config = AppConfig::default();
        let _ = config
            .services
            .insert(DEFAULT_SERVICE_NAME.to_string(), service);
        Ok(config)
    }
}

/// Split a command line into tokens, honoring single and double quotes
fn tokenize(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in content.trim().chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> AppConfig {
        RunCommandSource::parse(content, &EnvOptions::default(), &EnvStore::new()).unwrap()
    }

    #[test]
    fn test_parse_full_invocation() {
        let config = parse("docker run -p 8080:80 -e NODE_ENV=production nginx");
        assert_eq!(config.len(), 1);

        let service = &config.services[DEFAULT_SERVICE_NAME];
        assert_eq!(service.image.repository, "nginx");
        assert_eq!(service.image.resolved_tag(), "latest");
        assert_eq!(service.ports[0].host_port, 8080);
        assert_eq!(service.ports[0].container_port, 80);
        assert_eq!(service.environment["NODE_ENV"], "production");
        assert_eq!(service.command, None);
    }

    #[test]
    fn test_tokens_after_image_become_command() {
        let config = parse("docker run redis:7 redis-server --appendonly yes");
        let service = &config.services[DEFAULT_SERVICE_NAME];
        assert_eq!(service.command.as_deref(), Some("redis-server --appendonly yes"));
    }

    #[test]
    fn test_quoted_values_are_one_token() {
        let config = parse("docker run -e 'GREETING=hello world' busybox");
        let service = &config.services[DEFAULT_SERVICE_NAME];
        assert_eq!(service.environment["GREETING"], "hello world");
    }

    #[test]
    fn test_unknown_flags_are_skipped() {
        let config = parse("docker run -d --name web --restart always -p 80:80 nginx");
        let service = &config.services[DEFAULT_SERVICE_NAME];
        assert_eq!(service.image.repository, "nginx");
        assert_eq!(service.ports.len(), 1);
    }

    #[test]
    fn test_inline_flag_values() {
        let config = parse("docker run --publish=9090:90 --env=MODE=fast nginx");
        let service = &config.services[DEFAULT_SERVICE_NAME];
        assert_eq!(service.ports[0].host_port, 9090);
        assert_eq!(service.environment["MODE"], "fast");
    }

    #[test]
    fn test_volume_flag() {
        let config = parse("docker run -v ~/site:/usr/share/nginx/html:ro nginx");
        let service = &config.services[DEFAULT_SERVICE_NAME];
        assert_eq!(service.volumes[0].host, "./site");
        assert_eq!(service.volumes[0].mode.as_deref(), Some("ro"));
    }

    #[test]
    fn test_validate_rejects_other_commands() {
        assert!(RunCommandSource::validate("docker build .").is_err());
        assert!(RunCommandSource::validate("podman run nginx").is_err());
        assert!(RunCommandSource::validate("").is_err());
    }

    #[test]
    fn test_missing_image_fails() {
        let err = RunCommandSource::parse(
            "docker run -p 80:80",
            &EnvOptions::default(),
            &EnvStore::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StevedoreError::Validation(_)));
    }
}
