//! Environment declaration normalization and variable substitution

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Environment declarations as they appear in source documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvDeclarations {
    /// Array of KEY=value strings
    Array(Vec<String>),
    /// Map of key to value
    Map(HashMap<String, Option<String>>),
    /// Single KEY=value string
    Single(String),
}

/// How many `${VAR:-default}` occurrences to substitute per value
///
/// `FirstOnly` is the default: existing translations only ever substitute
/// the first occurrence, and callers depend on the rest surviving verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Substitute only the first occurrence (source-compatible)
    #[default]
    FirstOnly,
    /// Substitute every occurrence
    All,
}

/// Normalize environment declarations into one map
///
/// Keys and values are trimmed, surrounding quotes stripped, and
/// `${VAR:-default}` patterns resolved against the supplied variable table.
pub fn normalize(
    declarations: &EnvDeclarations,
    variables: &HashMap<String, String>,
    mode: SubstitutionMode,
) -> HashMap<String, String> {
    let mut env = HashMap::new();

    match declarations {
        EnvDeclarations::Array(entries) => {
            for entry in entries {
                insert_pair(&mut env, entry, variables, mode);
            }
        }
        EnvDeclarations::Map(map) => {
            for (key, value) in map {
                let value = value.as_deref().unwrap_or("");
                env.insert(
                    key.trim().to_string(),
                    resolve_value(value, variables, mode),
                );
            }
        }
        EnvDeclarations::Single(entry) => {
            insert_pair(&mut env, entry, variables, mode);
        }
    }

    env
}

/// Resolve a single raw value: strip quotes, substitute `${VAR:-default}`
pub fn resolve_value(
    raw: &str,
    variables: &HashMap<String, String>,
    mode: SubstitutionMode,
) -> String {
    let value = strip_quotes(raw.trim());

    let re = substitution_pattern();
    let replacer = |caps: &regex::Captures| -> String {
        let name = &caps[1];
        let default = &caps[2];
        variables
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    match mode {
        SubstitutionMode::FirstOnly => re.replace(value, replacer).into_owned(),
        SubstitutionMode::All => re.replace_all(value, replacer).into_owned(),
    }
}

fn insert_pair(
    env: &mut HashMap<String, String>,
    entry: &str,
    variables: &HashMap<String, String>,
    mode: SubstitutionMode,
) {
    let (key, value) = match entry.split_once('=') {
        Some((key, value)) => (key, value),
        None => (entry, ""),
    };
    let key = key.trim();
    if key.is_empty() {
        return;
    }
    env.insert(key.to_string(), resolve_value(value, variables, mode));
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn substitution_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*):-([^}]*)\}").unwrap()
    })
}
