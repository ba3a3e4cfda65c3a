use rootup_core::{compare_versions, PackageDescriptor, Stability, VersionConstraint};
use semver::Version;
use tracing::{debug, warn};

/// Filters applied to target template candidates.
#[derive(Debug, Clone)]
pub struct TargetCriteria<'a> {
    pub constraint: Option<&'a VersionConstraint>,
    pub minimum_stability: Stability,
    /// Runtime package name and version to check; `None` skips the check.
    pub runtime: Option<(&'a str, &'a Version)>,
}

/// Picks the highest version among `candidates` that passes every criterion.
/// Ties on version are broken by pretty version so the choice is stable.
pub fn select_target<'a>(
    candidates: &'a [PackageDescriptor],
    criteria: &TargetCriteria<'_>,
) -> Option<&'a PackageDescriptor> {
    candidates
        .iter()
        .filter(|candidate| candidate_matches(candidate, criteria))
        .max_by(|a, b| {
            compare_versions(a.version(), b.version())
                .then_with(|| a.pretty_version().cmp(b.pretty_version()))
        })
}

fn candidate_matches(candidate: &PackageDescriptor, criteria: &TargetCriteria<'_>) -> bool {
    if let Some(constraint) = criteria.constraint {
        if !constraint.matches(candidate.version()) {
            debug!(
                version = candidate.pretty_version(),
                constraint = %constraint,
                "candidate rejected by version constraint"
            );
            return false;
        }
    }

    if !criteria.minimum_stability.allows(candidate.stability()) {
        debug!(
            version = candidate.pretty_version(),
            stability = %candidate.stability(),
            minimum = %criteria.minimum_stability,
            "candidate rejected by stability"
        );
        return false;
    }

    if let Some((runtime_package, runtime_version)) = criteria.runtime {
        match candidate.supports_runtime(runtime_package, runtime_version) {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    version = candidate.pretty_version(),
                    runtime = %runtime_version,
                    "candidate rejected by runtime requirement"
                );
                return false;
            }
            Err(err) => {
                warn!(
                    version = candidate.pretty_version(),
                    error = %err,
                    "candidate has an unreadable runtime requirement"
                );
                return false;
            }
        }
    }

    true
}
