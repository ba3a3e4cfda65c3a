use semver::Version;

use crate::version::Stability;

/// Per-run knobs for target selection and delta resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Proceed past local modifications and let target values win.
    pub override_local_changes: bool,
    /// Skip runtime compatibility checks when picking a target template.
    pub ignore_platform_reqs: bool,
    /// Runtime version candidates must support. `None` skips the check.
    pub runtime_version: Option<Version>,
    pub minimum_stability: Stability,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self {
            override_local_changes: false,
            ignore_platform_reqs: false,
            runtime_version: None,
            minimum_stability: Stability::Stable,
        }
    }
}
