/// Package naming convention shared by product and project template packages.
///
/// A product package looks like `<vendor>/product-<edition>-edition` and the
/// matching template package like `<vendor>/project-<edition>-edition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductNaming {
    vendor: String,
}

impl ProductNaming {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
        }
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn product_package(&self, edition: &str) -> String {
        format!("{}/product-{edition}-edition", self.vendor)
    }

    pub fn project_package(&self, edition: &str) -> String {
        format!("{}/project-{edition}-edition", self.vendor)
    }

    /// Extracts the edition from a product package name, case-insensitively.
    pub fn edition_of_product(&self, package: &str) -> Option<String> {
        let lowered = package.to_ascii_lowercase();
        let prefix = format!("{}/product-", self.vendor.to_ascii_lowercase());
        let edition = lowered.strip_prefix(&prefix)?.strip_suffix("-edition")?;
        if edition.is_empty() {
            return None;
        }
        Some(edition.to_string())
    }
}
