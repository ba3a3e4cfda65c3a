mod manifest_file;
mod updater;

pub use manifest_file::{read_manifest, write_manifest};
pub use updater::{RootUpdater, SkipReason, UpdateState};

#[cfg(test)]
mod tests;
