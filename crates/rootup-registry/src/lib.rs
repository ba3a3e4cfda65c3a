mod lock;
mod retriever;
mod template_index;

pub use lock::{read_installed_product, InstalledProduct};
pub use retriever::{DeclineReason, OriginalResolution, ProductRequirement, TargetResolver};
pub use template_index::{StaticTemplateSource, TemplateIndex, TemplateSource};
