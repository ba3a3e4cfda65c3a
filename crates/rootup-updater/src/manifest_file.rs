use std::fs;
use std::path::Path;

use anyhow::Result;
use rootup_core::{
    parse_manifest_document, render_manifest_document, ManifestDocument, RootUpdateError,
};
use tracing::debug;

/// Reads and parses the live manifest. Every failure is a `ManifestRead`.
pub fn read_manifest(path: &Path) -> Result<ManifestDocument> {
    let content = fs::read_to_string(path)
        .map_err(|err| RootUpdateError::manifest_read(path, err))?;
    let document = parse_manifest_document(&content)
        .map_err(|err| RootUpdateError::manifest_read(path, format!("{err:#}")))?;
    debug!(path = %path.display(), sections = document.len(), "read root manifest");
    Ok(document)
}

/// Rewrites the manifest in place. This is a plain overwrite, not an atomic
/// swap.
pub fn write_manifest(path: &Path, document: &ManifestDocument) -> Result<()> {
    let rendered = render_manifest_document(document)
        .map_err(|err| RootUpdateError::manifest_write(path, format!("{err:#}")))?;
    fs::write(path, rendered).map_err(|err| RootUpdateError::manifest_write(path, err))?;
    debug!(path = %path.display(), sections = document.len(), "wrote root manifest");
    Ok(())
}
