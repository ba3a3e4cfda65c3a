mod change_set;
mod context;
mod descriptor;
mod error;
mod manifest;
mod naming;
mod report;
mod version;

pub use change_set::{apply_change_set, ChangeSet, SectionChange};
pub use context::ResolutionContext;
pub use descriptor::PackageDescriptor;
pub use error::RootUpdateError;
pub use manifest::{
    find_require, parse_manifest_document, render_manifest_document, ManifestDocument,
    RequirementEntry, REQUIRE_DEV_SECTION, REQUIRE_SECTION,
};
pub use naming::ProductNaming;
pub use report::{NullReporter, RecordingReporter, Reporter};
pub use version::{compare_versions, parse_version_lenient, Stability, VersionConstraint};
