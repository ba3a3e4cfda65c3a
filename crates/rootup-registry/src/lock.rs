use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rootup_core::{parse_version_lenient, ProductNaming};
use semver::Version;
use serde::Deserialize;

/// The product edition and version currently installed in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledProduct {
    pub package: String,
    pub edition: String,
    pub version: Version,
    pub pretty_version: String,
}

#[derive(Debug, Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: Vec<LockedPackage>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

/// Reads the installed product package from a lock file. Returns `None` when
/// the file is absent or locks no product package.
pub fn read_installed_product(
    lock_path: &Path,
    naming: &ProductNaming,
) -> Result<Option<InstalledProduct>> {
    let content = match fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed reading lock file: {}", lock_path.display()))
        }
    };
    parse_installed_product(&content, naming)
        .with_context(|| format!("failed parsing lock file: {}", lock_path.display()))
}

pub(crate) fn parse_installed_product(
    content: &str,
    naming: &ProductNaming,
) -> Result<Option<InstalledProduct>> {
    let lock: LockFile = serde_json::from_str(content)?;
    let Some((package, edition)) = lock
        .packages
        .iter()
        .chain(lock.packages_dev.iter())
        .find_map(|package| {
            naming
                .edition_of_product(&package.name)
                .map(|edition| (package, edition))
        })
    else {
        return Ok(None);
    };

    let pretty_version = package.version.trim().to_string();
    let version = parse_version_lenient(&pretty_version)
        .with_context(|| format!("invalid locked version for {}", package.name))?;
    Ok(Some(InstalledProduct {
        package: package.name.clone(),
        edition,
        version,
        pretty_version,
    }))
}
