use std::path::PathBuf;

use anyhow::Result;
use rootup_core::{apply_change_set, find_require, ChangeSet, ResolutionContext, Reporter};
use rootup_registry::{DeclineReason, OriginalResolution, TargetResolver};
use rootup_resolver::DeltaResolver;
use tracing::info;

use crate::manifest_file::{read_manifest, write_manifest};

static NO_CHANGES: ChangeSet = ChangeSet::new();

/// Expected reasons for an update run to do nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The updater's own package is no longer required by the project.
    SelfRequirementRemoved,
    LocalModificationDeclined(DeclineReason),
    /// Templates differ only in ways the live manifest already reflects.
    NoChanges,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateState {
    Idle,
    /// Installed edition and version already equal the target.
    NoOpDetected,
    Skipped(SkipReason),
    ChangesComputed(ChangeSet),
    Applied(ChangeSet),
}

/// Drives one update of the root manifest: `run_update` decides and computes
/// the change set, `write_updated_manifest` persists it.
pub struct RootUpdater<'r> {
    manifest_path: PathBuf,
    plugin_package: String,
    reporter: &'r dyn Reporter,
    state: UpdateState,
    target_label: Option<String>,
}

impl<'r> RootUpdater<'r> {
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        plugin_package: impl Into<String>,
        reporter: &'r dyn Reporter,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            plugin_package: plugin_package.into(),
            reporter,
            state: UpdateState::Idle,
            target_label: None,
        }
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    /// The computed (or applied) change set; empty otherwise.
    pub fn change_set(&self) -> &ChangeSet {
        match &self.state {
            UpdateState::ChangesComputed(change_set) | UpdateState::Applied(change_set) => {
                change_set
            }
            _ => &NO_CHANGES,
        }
    }

    /// Returns `true` when changes were computed and are waiting for
    /// `write_updated_manifest`.
    pub fn run_update(
        &mut self,
        resolver: &TargetResolver<'_>,
        context: &ResolutionContext,
    ) -> Result<bool> {
        self.state = UpdateState::Idle;
        self.target_label = None;

        if find_require(resolver.live(), &self.plugin_package).is_none() {
            self.reporter.labeled_verbose(
                None,
                &format!(
                    "{} is no longer required by the project; skipping root manifest updates",
                    self.plugin_package
                ),
            );
            return Ok(self.skip(SkipReason::SelfRequirementRemoved));
        }

        let original_edition = resolver.original_edition().to_string();
        let original_version = resolver.original_version().clone();
        let pretty_original_version = resolver.pretty_original_version().to_string();

        let target = resolver.resolve_target(context)?;
        let product = resolver.product_requirement()?;

        if original_edition == target.edition() && &original_version == target.version() {
            self.reporter.labeled_verbose(
                None,
                "The product requirement matched the current installation; no root updates are required",
            );
            self.state = UpdateState::NoOpDetected;
            return Ok(false);
        }

        let original = match resolver.resolve_original(context.override_local_changes)? {
            OriginalResolution::Resolved(original) => original,
            OriginalResolution::Declined(reason) => {
                self.reporter.log(&format!("Skipping root manifest update: {reason}"));
                return Ok(self.skip(SkipReason::LocalModificationDeclined(reason)));
            }
        };

        let label = resolver.label_for(&target);
        self.reporter.labeled_verbose(
            Some(&label),
            &format!(
                "Base project package version: {} {pretty_original_version}",
                resolver.naming().project_package(&original_edition)
            ),
        );

        let installed_product = resolver.naming().product_package(&original_edition);
        let delta = DeltaResolver::new(
            context.override_local_changes,
            &original,
            &target,
            resolver.live(),
        )
        .ignoring_requirement(&product.package)
        .ignoring_requirement(&installed_product);
        for section in delta.preserved_sections() {
            self.reporter.labeled_verbose(
                Some(&label),
                &format!(
                    "Keeping the locally modified '{section}' section; the target template value was not applied"
                ),
            );
        }

        let change_set = delta.resolve_root_deltas();
        self.target_label = Some(label);
        if change_set.is_empty() {
            self.reporter.labeled_verbose(
                self.target_label.as_deref(),
                "No root manifest changes are required",
            );
            return Ok(self.skip(SkipReason::NoChanges));
        }

        info!(
            sections = change_set.len(),
            target = target.pretty_version(),
            "computed root manifest changes"
        );
        self.state = UpdateState::ChangesComputed(change_set);
        Ok(true)
    }

    /// Re-reads the manifest from disk, applies the pending change set and
    /// writes the result back. Does nothing without pending changes.
    pub fn write_updated_manifest(&mut self) -> Result<()> {
        let UpdateState::ChangesComputed(change_set) = &self.state else {
            return Ok(());
        };

        let live = read_manifest(&self.manifest_path)?;
        let updated = apply_change_set(live, change_set);

        self.reporter.labeled_verbose(
            self.target_label.as_deref(),
            "Writing changes to the root manifest...",
        );
        write_manifest(&self.manifest_path, &updated)?;
        self.reporter.labeled_verbose(
            self.target_label.as_deref(),
            &format!("{} has been updated", self.manifest_path.display()),
        );

        if let UpdateState::ChangesComputed(change_set) =
            std::mem::replace(&mut self.state, UpdateState::Idle)
        {
            self.state = UpdateState::Applied(change_set);
        }
        Ok(())
    }

    fn skip(&mut self, reason: SkipReason) -> bool {
        self.state = UpdateState::Skipped(reason);
        false
    }
}
