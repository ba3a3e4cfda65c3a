use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rootup_core::{
    compare_versions, parse_manifest_document, parse_version_lenient, PackageDescriptor,
};
use rootup_security::{sha256_hex, verify_template_signature};
use semver::Version;
use tracing::debug;

/// Supplies candidate template manifests for an edition.
pub trait TemplateSource {
    /// All known templates for `edition`, ordered by ascending version.
    fn list_candidates(&self, edition: &str) -> Result<Vec<PackageDescriptor>>;

    fn find(&self, edition: &str, version: &Version) -> Result<Option<PackageDescriptor>> {
        Ok(self
            .list_candidates(edition)?
            .into_iter()
            .find(|candidate| candidate.version() == version))
    }
}

/// Template tree on disk: `<root>/index/<edition>/<version>.json`.
///
/// When `<root>/registry.pub` exists, each template must carry a detached
/// hex signature in `<version>.json.sig`.
#[derive(Debug, Clone)]
pub struct TemplateIndex {
    root: PathBuf,
}

impl TemplateIndex {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn trusted_key(&self) -> Result<Option<String>> {
        let key_path = self.root.join("registry.pub");
        if !key_path.exists() {
            return Ok(None);
        }
        let key = fs::read_to_string(&key_path).with_context(|| {
            format!("failed to read trusted template key: {}", key_path.display())
        })?;
        Ok(Some(key.trim().to_string()))
    }

    fn load_template(
        &self,
        edition: &str,
        path: &Path,
        trusted_key: Option<&str>,
    ) -> Result<Option<PackageDescriptor>> {
        let Some(pretty_version) = path.file_stem().and_then(|stem| stem.to_str()) else {
            return Ok(None);
        };
        if let Err(err) = parse_version_lenient(pretty_version) {
            debug!(path = %path.display(), error = %err, "skipping non-version template file");
            return Ok(None);
        }

        let bytes = fs::read(path)
            .with_context(|| format!("failed reading template: {}", path.display()))?;

        if let Some(public_key_hex) = trusted_key {
            let signature_path = path.with_extension("json.sig");
            let signature_hex = fs::read_to_string(&signature_path).with_context(|| {
                format!(
                    "failed reading template signature: {}",
                    signature_path.display()
                )
            })?;
            let valid = verify_template_signature(&bytes, public_key_hex, &signature_hex)
                .with_context(|| {
                    format!(
                        "failed verifying template signature: {}",
                        signature_path.display()
                    )
                })?;
            if !valid {
                anyhow::bail!(
                    "invalid template signature: template {}, signature {}",
                    path.display(),
                    signature_path.display()
                );
            }
        }

        let content = String::from_utf8(bytes)
            .with_context(|| format!("template is not utf-8: {}", path.display()))?;
        let document = parse_manifest_document(&content)
            .with_context(|| format!("failed parsing template: {}", path.display()))?;
        let descriptor = PackageDescriptor::new(edition, pretty_version, document)
            .with_context(|| format!("invalid template version: {}", path.display()))?
            .with_fingerprint(sha256_hex(content.as_bytes()));
        Ok(Some(descriptor))
    }
}

impl TemplateSource for TemplateIndex {
    fn list_candidates(&self, edition: &str) -> Result<Vec<PackageDescriptor>> {
        let edition_dir = self.root.join("index").join(edition);
        if !edition_dir.exists() {
            debug!(edition, root = %self.root.display(), "no templates for edition");
            return Ok(Vec::new());
        }

        let trusted_key = self.trusted_key()?;
        let mut candidates = Vec::new();
        for entry in fs::read_dir(&edition_dir).with_context(|| {
            format!("failed to read template directory: {}", edition_dir.display())
        })? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(descriptor) = self.load_template(edition, &path, trusted_key.as_deref())? {
                candidates.push(descriptor);
            }
        }

        sort_candidates(&mut candidates);
        debug!(edition, count = candidates.len(), "loaded template candidates");
        Ok(candidates)
    }
}

/// Fixed set of templates held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateSource {
    templates: Vec<PackageDescriptor>,
}

impl StaticTemplateSource {
    pub fn new(templates: Vec<PackageDescriptor>) -> Self {
        Self { templates }
    }
}

impl TemplateSource for StaticTemplateSource {
    fn list_candidates(&self, edition: &str) -> Result<Vec<PackageDescriptor>> {
        let mut candidates: Vec<PackageDescriptor> = self
            .templates
            .iter()
            .filter(|template| template.edition().eq_ignore_ascii_case(edition))
            .cloned()
            .collect();
        sort_candidates(&mut candidates);
        Ok(candidates)
    }
}

fn sort_candidates(candidates: &mut [PackageDescriptor]) {
    candidates.sort_by(|a, b| {
        compare_versions(a.version(), b.version())
            .then_with(|| a.pretty_version().cmp(b.pretty_version()))
    });
}
