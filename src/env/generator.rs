//! Environment value generation
//!
//! Fills environment variables whose values are still unresolved `${...}`
//! placeholders, using caller-supplied per-image, per-version rules.

use crate::model::ImageReference;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!#$%&*+-=?@_~";

/// Character class for random string generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Uppercase,
    Lowercase,
    /// Mixed-case letters and digits
    #[default]
    Alphanumeric,
}

/// How a placeholder variable's value is synthesized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValueSpec {
    /// Password with at least one character from each class
    Password {
        #[serde(default = "default_length")]
        length: usize,
    },
    /// Random string drawn from one character class
    String {
        #[serde(default = "default_length")]
        length: usize,
        #[serde(default)]
        charset: CharClass,
    },
    /// Random number from an inclusive range
    Number {
        #[serde(default = "default_min")]
        min: i64,
        #[serde(default = "default_max")]
        max: i64,
    },
}

fn default_length() -> usize {
    16
}

fn default_min() -> i64 {
    1
}

fn default_max() -> i64 {
    1_000_000
}

/// Generation rules: image repository -> version key -> variable -> spec
///
/// Version keys are either the `*`/`latest` wildcard, a plain version, or a
/// semantic-version range. Supplied per translation call; never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRules(
    pub HashMap<String, HashMap<String, HashMap<String, ValueSpec>>>,
);

impl GenerationRules {
    /// Whether no rules are declared at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Selects the rule version key applicable to an image tag
///
/// Injectable so that version coercion stays a policy decision rather than
/// a hard dependency on one library's quirks.
pub trait VersionMatcher {
    /// Pick the best version key for `tag` among `keys`, or `None`
    fn select<'a>(&self, tag: &str, keys: &[&'a str]) -> Option<&'a str>;
}

/// Default matcher backed by the `semver` crate
///
/// Resolution order: a `*`/`latest` key wins for absent or `latest` tags
/// (else the highest declared plain version); explicit tags are coerced and
/// matched against the declared ranges, highest-anchored range first, with
/// the wildcard key as a last resort. Invalid ranges are skipped with a
/// warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverMatcher;

impl VersionMatcher for SemverMatcher {
    fn select<'a>(&self, tag: &str, keys: &[&'a str]) -> Option<&'a str> {
        let wildcard = keys
            .iter()
            .copied()
            .find(|k| *k == "*" || k.eq_ignore_ascii_case("latest"));

        if tag.is_empty() || tag.eq_ignore_ascii_case("latest") {
            if wildcard.is_some() {
                return wildcard;
            }
            return keys
                .iter()
                .copied()
                .filter_map(|k| coerce_version(k).map(|v| (v, k)))
                .max_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, k)| k);
        }

        let Some(tag_version) = coerce_version(tag) else {
            tracing::warn!(tag, "tag is not a semantic version, using wildcard rules");
            return wildcard;
        };

        let mut candidates: Vec<(Version, &str)> = Vec::new();
        for key in keys.iter().copied() {
            if Some(key) == wildcard {
                continue;
            }
            let Ok(req) = VersionReq::parse(key) else {
                tracing::warn!(key, "skipping invalid version range in generation rules");
                continue;
            };
            if req.matches(&tag_version) {
                let anchor = anchor_version(&req);
                candidates.push((anchor, key));
            }
        }

        candidates.sort_by(|(a, _), (b, _)| b.cmp(a));
        candidates
            .first()
            .map(|(_, k)| *k)
            .or(wildcard)
    }
}

/// Coerce a tag like `v13`, `13.4`, or `13.4-alpine` into a full version
fn coerce_version(tag: &str) -> Option<Version> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[vV]?(\d+)(?:\.(\d+))?(?:\.(\d+))?").unwrap()
    });
    let caps = re.captures(tag.trim())?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let patch = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Ordering anchor for a range: its first comparator's version floor
fn anchor_version(req: &VersionReq) -> Version {
    req.comparators.first().map_or_else(
        || Version::new(0, 0, 0),
        |c| Version::new(c.major, c.minor.unwrap_or(0), c.patch.unwrap_or(0)),
    )
}

/// Whether a value is still an unresolved `${...}` placeholder
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

/// Fill placeholder values using the rules matching the image and version
///
/// Returns the input unchanged when no rules apply. Variables whose values
/// are already resolved are never regenerated, so the operation is
/// idempotent over fully-resolved maps.
pub fn generate_environment(
    env: &HashMap<String, String>,
    image: &ImageReference,
    rules: &GenerationRules,
    matcher: &dyn VersionMatcher,
) -> HashMap<String, String> {
    let mut env = env.clone();

    let Some(versions) = rules.0.get(&image.repository) else {
        return env;
    };
    let keys: Vec<&str> = versions.keys().map(String::as_str).collect();
    let Some(selected) = matcher.select(image.resolved_tag(), &keys) else {
        tracing::warn!(
            image = %image.repository,
            tag = image.resolved_tag(),
            "no generation rule version matches"
        );
        return env;
    };
    let Some(specs) = versions.get(selected) else {
        return env;
    };

    for (name, spec) in specs {
        if let Some(value) = env.get(name) {
            if is_placeholder(value) {
                let generated = synthesize(spec);
                tracing::debug!(variable = %name, "generated environment value");
                env.insert(name.clone(), generated);
            }
        }
    }

    env
}

fn synthesize(spec: &ValueSpec) -> String {
    let mut rng = rand::thread_rng();
    match spec {
        ValueSpec::Password { length } => generate_password(*length, &mut rng),
        ValueSpec::String { length, charset } => {
            let alphabet: Vec<u8> = match charset {
                CharClass::Uppercase => UPPERCASE.to_vec(),
                CharClass::Lowercase => LOWERCASE.to_vec(),
                CharClass::Alphanumeric => [UPPERCASE, LOWERCASE, DIGITS].concat(),
            };
            (0..*length)
                .map(|_| {
                    let b = alphabet[rng.gen_range(0..alphabet.len())];
                    b as char
                })
                .collect()
        }
        ValueSpec::Number { min, max } => {
            let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
            rng.gen_range(lo..=hi).to_string()
        }
    }
}

/// At least one character from each class, order shuffled
fn generate_password(length: usize, rng: &mut impl Rng) -> String {
    let length = length.max(4);
    let classes = [UPPERCASE, LOWERCASE, DIGITS, SPECIAL];

    let mut bytes: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();

    let all: Vec<u8> = classes.concat();
    while bytes.len() < length {
        bytes.push(all[rng.gen_range(0..all.len())]);
    }
    bytes.shuffle(rng);

    bytes.into_iter().map(|b| b as char).collect()
}
