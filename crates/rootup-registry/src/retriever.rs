use std::fmt;

use anyhow::{Context, Result};
use rootup_core::{
    ManifestDocument, PackageDescriptor, ProductNaming, ResolutionContext, RootUpdateError,
    VersionConstraint, REQUIRE_SECTION,
};
use rootup_resolver::{select_target, TargetCriteria};
use semver::Version;
use tracing::{debug, warn};

use crate::lock::InstalledProduct;
use crate::template_index::TemplateSource;

/// The product package required by the live manifest, which names the
/// target edition and the version range to upgrade to.
#[derive(Debug, Clone)]
pub struct ProductRequirement {
    pub package: String,
    pub edition: String,
    pub constraint: VersionConstraint,
}

/// Why the original baseline could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclineReason {
    /// No template exists for the installed edition and version.
    BaselineUnavailable { package: String, version: String },
    /// Template sections are missing from the live manifest.
    LocalModifications { sections: Vec<String> },
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaselineUnavailable { package, version } => {
                write!(f, "no template found for the installed {package} {version}")
            }
            Self::LocalModifications { sections } => write!(
                f,
                "the root manifest was modified locally (missing sections: {}); rerun with the override option to update anyway",
                sections.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OriginalResolution {
    Resolved(PackageDescriptor),
    Declined(DeclineReason),
}

/// Locates the original and target templates for an update run.
pub struct TargetResolver<'a> {
    source: &'a dyn TemplateSource,
    naming: ProductNaming,
    runtime_package: String,
    installed: InstalledProduct,
    live: &'a ManifestDocument,
}

impl<'a> TargetResolver<'a> {
    pub fn new(
        source: &'a dyn TemplateSource,
        naming: ProductNaming,
        installed: InstalledProduct,
        live: &'a ManifestDocument,
    ) -> Self {
        Self {
            source,
            naming,
            runtime_package: "php".to_string(),
            installed,
            live,
        }
    }

    pub fn with_runtime_package(mut self, runtime_package: impl Into<String>) -> Self {
        self.runtime_package = runtime_package.into();
        self
    }

    pub fn naming(&self) -> &ProductNaming {
        &self.naming
    }

    pub fn live(&self) -> &ManifestDocument {
        self.live
    }

    pub fn original_edition(&self) -> &str {
        &self.installed.edition
    }

    pub fn original_version(&self) -> &Version {
        &self.installed.version
    }

    pub fn pretty_original_version(&self) -> &str {
        &self.installed.pretty_version
    }

    /// `<vendor>/project-<edition>-edition <pretty version>`.
    pub fn label_for(&self, descriptor: &PackageDescriptor) -> String {
        format!(
            "{} {}",
            self.naming.project_package(descriptor.edition()),
            descriptor.pretty_version()
        )
    }

    pub fn product_requirement(&self) -> Result<ProductRequirement> {
        let requirements = self
            .live
            .get(REQUIRE_SECTION)
            .and_then(|section| section.as_object());
        let Some((package, edition, raw)) = requirements.and_then(|requirements| {
            requirements.iter().find_map(|(package, constraint)| {
                let edition = self.naming.edition_of_product(package)?;
                Some((package.clone(), edition, constraint.as_str().unwrap_or("*")))
            })
        }) else {
            return Err(RootUpdateError::no_valid_target(format!(
                "the root manifest does not require a {}/product-*-edition package",
                self.naming.vendor()
            ))
            .into());
        };

        let constraint = VersionConstraint::parse(raw)
            .with_context(|| format!("invalid requirement for {package}"))
            .map_err(|err| RootUpdateError::no_valid_target(format!("{err:#}")))?;
        Ok(ProductRequirement {
            package,
            edition,
            constraint,
        })
    }

    /// Highest template for the required edition that satisfies the product
    /// constraint, the minimum stability and, unless platform requirements
    /// are ignored, the runtime version.
    pub fn resolve_target(&self, context: &ResolutionContext) -> Result<PackageDescriptor> {
        let requirement = self.product_requirement()?;
        let candidates = self.source.list_candidates(&requirement.edition)?;
        debug!(
            edition = %requirement.edition,
            constraint = %requirement.constraint,
            candidates = candidates.len(),
            "resolving target template"
        );

        let runtime = if context.ignore_platform_reqs {
            None
        } else {
            context
                .runtime_version
                .as_ref()
                .map(|version| (self.runtime_package.as_str(), version))
        };
        let criteria = TargetCriteria {
            constraint: Some(&requirement.constraint),
            minimum_stability: context.minimum_stability,
            runtime,
        };

        select_target(&candidates, &criteria).cloned().ok_or_else(|| {
            RootUpdateError::no_valid_target(format!(
                "no {} template matches '{}' with minimum stability {}",
                self.naming.project_package(&requirement.edition),
                requirement.constraint,
                context.minimum_stability
            ))
            .into()
        })
    }

    /// Loads the template of the installed release as the diff baseline.
    ///
    /// The live manifest counts as locally modified when a section the
    /// baseline template declares is missing from it. Value-level edits are
    /// left to the delta resolver.
    pub fn resolve_original(&self, override_local_changes: bool) -> Result<OriginalResolution> {
        let Some(original) = self
            .source
            .find(&self.installed.edition, &self.installed.version)?
        else {
            return Ok(OriginalResolution::Declined(
                DeclineReason::BaselineUnavailable {
                    package: self.naming.project_package(&self.installed.edition),
                    version: self.installed.pretty_version.clone(),
                },
            ));
        };

        let missing = missing_sections(&original, self.live);
        if !missing.is_empty() {
            if !override_local_changes {
                return Ok(OriginalResolution::Declined(
                    DeclineReason::LocalModifications { sections: missing },
                ));
            }
            warn!(
                sections = %missing.join(", "),
                "root manifest diverged from its baseline; continuing because override is set"
            );
        }

        Ok(OriginalResolution::Resolved(original))
    }
}

fn missing_sections(original: &PackageDescriptor, live: &ManifestDocument) -> Vec<String> {
    original
        .document()
        .iter()
        .filter(|(section, value)| !value.is_null() && !live.contains_key(section.as_str()))
        .map(|(section, _)| section.clone())
        .collect()
}
