use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use semver::{BuildMetadata, Comparator, Op, Version, VersionReq};
use serde::{Deserialize, Serialize};

/// Release stability, ordered from least to most stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Dev,
    Alpha,
    Beta,
    #[serde(rename = "rc")]
    ReleaseCandidate,
    Stable,
}

impl Stability {
    /// Derives stability from the pre-release tag. `-pN` patch tags are stable.
    pub fn of(version: &Version) -> Self {
        if version.pre.is_empty() || is_patch_release(version) {
            return Self::Stable;
        }
        match pre_release_tag(version).as_str() {
            "rc" => Self::ReleaseCandidate,
            "beta" | "b" => Self::Beta,
            "alpha" | "a" => Self::Alpha,
            _ => Self::Dev,
        }
    }

    /// Whether a candidate of `candidate` stability passes this minimum.
    pub fn allows(self, candidate: Stability) -> bool {
        candidate >= self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::ReleaseCandidate => "rc",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stability {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            "rc" => Ok(Self::ReleaseCandidate),
            "stable" => Ok(Self::Stable),
            other => Err(anyhow!(
                "unknown stability '{other}' (expected dev, alpha, beta, rc or stable)"
            )),
        }
    }
}

/// Orders versions the way the package manager does: pre-releases sort below
/// their release and `-pN` patch releases sort above it, ahead of the next
/// patch version.
pub fn compare_versions(a: &Version, b: &Version) -> Ordering {
    release_of(a)
        .cmp(&release_of(b))
        .then_with(|| release_rank(a).cmp(&release_rank(b)))
        .then_with(|| pre_release_number(a).cmp(&pre_release_number(b)))
        .then_with(|| a.pre.cmp(&b.pre))
}

type Release = (u64, u64, u64);

fn release_of(version: &Version) -> Release {
    (version.major, version.minor, version.patch)
}

fn pre_release_tag(version: &Version) -> String {
    version
        .pre
        .as_str()
        .chars()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_patch_release(version: &Version) -> bool {
    matches!(pre_release_tag(version).as_str(), "p" | "pl" | "patch")
}

fn release_rank(version: &Version) -> u8 {
    if version.pre.is_empty() {
        return 4;
    }
    if is_patch_release(version) {
        return 5;
    }
    match Stability::of(version) {
        Stability::Dev => 0,
        Stability::Alpha => 1,
        Stability::Beta => 2,
        Stability::ReleaseCandidate => 3,
        Stability::Stable => 4,
    }
}

/// `p10` must sort above `p3`, which identifier ordering gets wrong.
fn pre_release_number(version: &Version) -> u64 {
    version
        .pre
        .as_str()
        .trim_start_matches(|ch: char| ch.is_ascii_alphabetic())
        .trim_start_matches(['.', '-'])
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Parses versions as published, padding missing minor/patch components and
/// accepting a leading `v`.
pub fn parse_version_lenient(input: &str) -> anyhow::Result<Version> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(anyhow!("invalid version '{input}'"));
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    let normalized = format!("{}{suffix}", parts.join("."));
    Version::parse(&normalized).with_context(|| format!("invalid version '{input}'"))
}

/// A requirement string in the package-manager dialect: `||` separated
/// alternatives, whitespace or comma separated conjunctions, and bare
/// versions meaning an exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionConstraint {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let alternatives = input
            .split('|')
            .map(str::trim)
            .filter(|alternative| !alternative.is_empty())
            .map(|alternative| {
                let normalized = normalize_conjunction(alternative);
                VersionReq::parse(&normalized).with_context(|| {
                    format!("invalid version constraint '{alternative}' in '{input}'")
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if alternatives.is_empty() {
            return Err(anyhow!("version constraint must not be empty"));
        }

        Ok(Self {
            raw: input.trim().to_string(),
            alternatives,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Evaluated with [`compare_versions`]. A lower bound without a
    /// pre-release tag admits the whole release line, so `^2.4` accepts
    /// `2.4.7-beta1`; stability filtering is a separate step.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| {
            req.comparators
                .iter()
                .all(|comparator| comparator_matches(comparator, version))
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn comparator_matches(comparator: &Comparator, version: &Version) -> bool {
    let major = comparator.major;
    let bound = Version {
        major,
        minor: comparator.minor.unwrap_or(0),
        patch: comparator.patch.unwrap_or(0),
        pre: comparator.pre.clone(),
        build: BuildMetadata::EMPTY,
    };
    let release = release_of(version);
    let ordering = compare_versions(version, &bound);
    let at_least_bound = if bound.pre.is_empty() {
        release >= release_of(&bound)
    } else {
        ordering.is_ge()
    };
    let next_minor = |minor: u64| (major, minor.saturating_add(1), 0);
    let next_major = (major.saturating_add(1), 0, 0);

    match comparator.op {
        Op::Exact | Op::Wildcard => match (comparator.minor, comparator.patch) {
            (Some(_), Some(_)) => ordering.is_eq(),
            (Some(minor), None) => at_least_bound && release < next_minor(minor),
            _ => at_least_bound && release < next_major,
        },
        Op::Greater => match (comparator.minor, comparator.patch) {
            (Some(_), Some(_)) => ordering.is_gt(),
            (Some(minor), None) => release >= next_minor(minor),
            _ => release >= next_major,
        },
        Op::GreaterEq => at_least_bound,
        Op::Less => {
            if bound.pre.is_empty() {
                release < release_of(&bound)
            } else {
                ordering.is_lt()
            }
        }
        Op::LessEq => match (comparator.minor, comparator.patch) {
            (Some(_), Some(_)) => ordering.is_le(),
            (Some(minor), None) => release < next_minor(minor),
            _ => release < next_major,
        },
        Op::Tilde => {
            let upper = match comparator.minor {
                Some(minor) => next_minor(minor),
                None => next_major,
            };
            at_least_bound && release < upper
        }
        Op::Caret => {
            let upper = match (major, comparator.minor, comparator.patch) {
                (0, Some(0), Some(patch)) => (0, 0, patch.saturating_add(1)),
                (0, Some(minor), _) => next_minor(minor),
                _ => next_major,
            };
            at_least_bound && release < upper
        }
        _ => false,
    }
}

fn normalize_conjunction(alternative: &str) -> String {
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_operator: Option<String> = None;

    for token in alternative
        .split([',', ' '])
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let token = token.split('@').next().unwrap_or(token);
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|ch| "<>=~^!".contains(ch)) {
            pending_operator = Some(token.to_string());
            continue;
        }

        let comparator = match pending_operator.take() {
            Some(operator) => format!("{operator}{token}"),
            None if is_bare_version(token) => format!("={}", token.trim_start_matches('v')),
            None => token.to_string(),
        };
        comparators.push(comparator);
    }

    if comparators.is_empty() {
        return "*".to_string();
    }
    comparators.join(", ")
}

fn is_bare_version(token: &str) -> bool {
    let token = token.trim_start_matches('v');
    token.starts_with(|ch: char| ch.is_ascii_digit()) && !token.contains(['*', 'x', 'X'])
}
