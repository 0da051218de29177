//! Volume mapping normalization

use serde::{Deserialize, Serialize};

/// Volume mapping between host (or named volume) and container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMapping {
    /// Host path or named-volume token
    pub host: String,
    /// Container path
    pub container: String,
    /// Access mode (`ro`, `rw`, ...), when given
    pub mode: Option<String>,
}

impl VolumeMapping {
    /// Normalize a raw volume specification
    ///
    /// Accepts `path`, `host:container`, and `host:container:mode`. A lone
    /// path is treated as the container path with an empty host side.
    /// Home-directory tokens on the host side are rewritten so generated
    /// manifests never embed the translating machine's filesystem.
    pub fn normalize(raw: &str) -> Self {
        let parts: Vec<&str> = raw.trim().splitn(3, ':').collect();
        let (host, container, mode) = match parts.as_slice() {
            [container] => (String::new(), (*container).to_string(), None),
            [host, container] => {
                (portable_host_path(host), (*container).to_string(), None)
            }
            [host, container, mode] => (
                portable_host_path(host),
                (*container).to_string(),
                Some((*mode).to_string()),
            ),
            _ => (String::new(), String::new(), None),
        };

        Self {
            host,
            container,
            mode,
        }
    }
}

/// Rewrite `$HOME`, `${HOME}`, and a leading `~/` to a relative prefix
fn portable_host_path(path: &str) -> String {
    let path = path.trim();
    if let Some(rest) = path.strip_prefix("${HOME}") {
        return format!(".{}", rest);
    }
    if let Some(rest) = path.strip_prefix("$HOME") {
        return format!(".{}", rest);
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return format!("./{}", rest);
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pair() {
        let volume = VolumeMapping::normalize("./data:/var/lib/postgresql/data");
        assert_eq!(volume.host, "./data");
        assert_eq!(volume.container, "/var/lib/postgresql/data");
        assert_eq!(volume.mode, None);
    }

    #[test]
    fn test_normalize_with_mode() {
        let volume = VolumeMapping::normalize("/etc/nginx:/etc/nginx:ro");
        assert_eq!(volume.mode.as_deref(), Some("ro"));
    }

    #[test]
    fn test_normalize_lone_path() {
        let volume = VolumeMapping::normalize("/var/lib/mysql");
        assert_eq!(volume.host, "");
        assert_eq!(volume.container, "/var/lib/mysql");
    }

    #[test]
    fn test_normalize_named_volume() {
        let volume = VolumeMapping::normalize("dbdata:/var/lib/mysql");
        assert_eq!(volume.host, "dbdata");
    }

    #[test]
    fn test_home_tokens_are_rewritten() {
        for raw in [
            "$HOME/data:/data",
            "${HOME}/data:/data",
            "~/data:/data",
        ] {
            let volume = VolumeMapping::normalize(raw);
            assert_eq!(volume.host, "./data", "failed for '{}'", raw);
            assert!(!volume.host.contains("$HOME"));
            assert!(!volume.host.contains('~'));
        }
    }
}
