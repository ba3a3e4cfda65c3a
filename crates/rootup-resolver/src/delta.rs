use std::collections::{BTreeMap, BTreeSet};

use rootup_core::{
    ChangeSet, ManifestDocument, PackageDescriptor, REQUIRE_DEV_SECTION, REQUIRE_SECTION,
};
use serde_json::Value;
use tracing::debug;

/// Outcome for a single top-level section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionDecision {
    /// Only the live manifest has it.
    LiveOnly,
    /// Original and target templates agree.
    Unchanged,
    /// The live manifest already matches the target.
    AlreadyApplied,
    /// Target changes it but the live value was customized; live value kept.
    Preserved,
    Replace(Value),
    Remove,
}

/// Computes section-level edits by diffing the original template against the
/// target template, resolved against what the live manifest holds.
#[derive(Debug, Clone)]
pub struct DeltaResolver<'a> {
    override_local_changes: bool,
    original: &'a PackageDescriptor,
    target: &'a PackageDescriptor,
    live: &'a ManifestDocument,
    ignored_requirements: Vec<&'a str>,
}

impl<'a> DeltaResolver<'a> {
    pub fn new(
        override_local_changes: bool,
        original: &'a PackageDescriptor,
        target: &'a PackageDescriptor,
        live: &'a ManifestDocument,
    ) -> Self {
        Self {
            override_local_changes,
            original,
            target,
            live,
            ignored_requirements: Vec::new(),
        }
    }

    /// Leaves `package` out when checking requirement sections for local
    /// customization. Editing the product requirement is how an upgrade is
    /// requested, so it must not count as a customization. Call once per
    /// product package; an edition switch involves two.
    pub fn ignoring_requirement(mut self, package: &'a str) -> Self {
        self.ignored_requirements.push(package);
        self
    }

    pub fn resolve_root_deltas(&self) -> ChangeSet {
        let mut change_set = ChangeSet::new();
        for (section, decision) in self.section_decisions() {
            match decision {
                SectionDecision::Replace(value) => change_set.replace(section, value),
                SectionDecision::Remove => change_set.remove(section),
                _ => {}
            }
        }
        change_set
    }

    /// Sections whose live customization blocked a target change.
    pub fn preserved_sections(&self) -> Vec<String> {
        self.section_decisions()
            .into_iter()
            .filter_map(|(section, decision)| {
                (decision == SectionDecision::Preserved).then_some(section)
            })
            .collect()
    }

    pub fn section_decisions(&self) -> BTreeMap<String, SectionDecision> {
        let original = self.original.document();
        let target = self.target.document();
        let sections: BTreeSet<&String> = original
            .keys()
            .chain(target.keys())
            .chain(self.live.keys())
            .collect();

        sections
            .into_iter()
            .map(|section| {
                let decision = self.decide(section);
                debug!(section = %section, ?decision, "resolved section delta");
                (section.clone(), decision)
            })
            .collect()
    }

    fn decide(&self, section: &str) -> SectionDecision {
        let original = template_section(self.original.document(), section);
        let target = template_section(self.target.document(), section);
        let live = template_section(self.live, section);

        if original.is_none() && target.is_none() {
            return if self.live.contains_key(section) {
                SectionDecision::LiveOnly
            } else {
                SectionDecision::Unchanged
            };
        }
        if original == target {
            return SectionDecision::Unchanged;
        }

        let Some(target) = target else {
            return if self.live.contains_key(section) {
                SectionDecision::Remove
            } else {
                SectionDecision::AlreadyApplied
            };
        };

        if live == Some(target) {
            return SectionDecision::AlreadyApplied;
        }
        if !self.override_local_changes && self.is_customized(section, live, original) {
            return SectionDecision::Preserved;
        }
        SectionDecision::Replace(target.clone())
    }

    fn is_customized(&self, section: &str, live: Option<&Value>, original: Option<&Value>) -> bool {
        if self.ignored_requirements.is_empty()
            || (section != REQUIRE_SECTION && section != REQUIRE_DEV_SECTION)
        {
            return live != original;
        }
        self.without_ignored(live) != self.without_ignored(original)
    }

    fn without_ignored(&self, section: Option<&Value>) -> Option<Value> {
        let mut section = section.cloned()?;
        if let Some(requirements) = section.as_object_mut() {
            requirements.retain(|name, _| {
                !self
                    .ignored_requirements
                    .iter()
                    .any(|package| name.eq_ignore_ascii_case(package))
            });
        }
        Some(section)
    }
}

/// A `null` section is treated the same as a missing one.
fn template_section<'d>(document: &'d ManifestDocument, section: &str) -> Option<&'d Value> {
    document.get(section).filter(|value| !value.is_null())
}
