use std::collections::BTreeMap;

use serde_json::Value;

use crate::manifest::ManifestDocument;

/// Edit for one top-level section of the live manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionChange {
    /// Replace the whole section; no deep merge.
    Replace(Value),
    Remove,
}

/// Section-level edits keyed by section name. Sections not listed are left
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: BTreeMap<String, SectionChange>,
}

impl ChangeSet {
    pub const fn new() -> Self {
        Self {
            changes: BTreeMap::new(),
        }
    }

    pub fn replace(&mut self, section: impl Into<String>, value: Value) {
        self.changes
            .insert(section.into(), SectionChange::Replace(value));
    }

    pub fn remove(&mut self, section: impl Into<String>) {
        self.changes.insert(section.into(), SectionChange::Remove);
    }

    pub fn get(&self, section: &str) -> Option<&SectionChange> {
        self.changes.get(section)
    }

    pub fn contains(&self, section: &str) -> bool {
        self.changes.contains_key(section)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionChange)> {
        self.changes
            .iter()
            .map(|(section, change)| (section.as_str(), change))
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = (&'a String, &'a SectionChange);
    type IntoIter = std::collections::btree_map::Iter<'a, String, SectionChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Applies `change_set` to `document`. Replaced sections keep their position;
/// new sections are appended; removal keeps the order of the remaining keys.
pub fn apply_change_set(mut document: ManifestDocument, change_set: &ChangeSet) -> ManifestDocument {
    for (section, change) in change_set {
        match change {
            SectionChange::Remove => {
                document.shift_remove(section.as_str());
            }
            SectionChange::Replace(value) => {
                document.insert(section.clone(), value.clone());
            }
        }
    }
    document
}
