use semver::Version;

use crate::manifest::{ManifestDocument, REQUIRE_SECTION};
use crate::version::{parse_version_lenient, Stability, VersionConstraint};

/// One template manifest for a specific edition and version.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    edition: String,
    version: Version,
    pretty_version: String,
    document: ManifestDocument,
    fingerprint: Option<String>,
}

impl PackageDescriptor {
    pub fn new(
        edition: impl Into<String>,
        pretty_version: impl Into<String>,
        document: ManifestDocument,
    ) -> anyhow::Result<Self> {
        let pretty_version = pretty_version.into();
        let version = parse_version_lenient(&pretty_version)?;
        Ok(Self {
            edition: edition.into().to_ascii_lowercase(),
            version,
            pretty_version,
            document,
            fingerprint: None,
        })
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn edition(&self) -> &str {
        &self.edition
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn pretty_version(&self) -> &str {
        &self.pretty_version
    }

    pub fn document(&self) -> &ManifestDocument {
        &self.document
    }

    /// Hex sha256 of the template bytes, when loaded from a file.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn stability(&self) -> Stability {
        Stability::of(&self.version)
    }

    /// The template's own requirement on `package`, if it declares one.
    pub fn requirement(&self, package: &str) -> Option<&str> {
        self.document
            .get(REQUIRE_SECTION)?
            .as_object()?
            .get(package)?
            .as_str()
    }

    /// Whether the template supports `runtime_version` for `runtime_package`.
    /// Templates without a runtime requirement are compatible with anything.
    pub fn supports_runtime(
        &self,
        runtime_package: &str,
        runtime_version: &Version,
    ) -> anyhow::Result<bool> {
        let Some(raw) = self.requirement(runtime_package) else {
            return Ok(true);
        };
        let constraint = VersionConstraint::parse(raw)?;
        Ok(constraint.matches(runtime_version))
    }
}
