use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

pub const REQUIRE_SECTION: &str = "require";
pub const REQUIRE_DEV_SECTION: &str = "require-dev";

/// Top-level sections of a project manifest, in file order.
pub type ManifestDocument = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEntry {
    pub package: String,
    pub constraint: String,
    pub dev: bool,
}

pub fn parse_manifest_document(input: &str) -> anyhow::Result<ManifestDocument> {
    let value: Value = serde_json::from_str(input).context("failed to parse manifest json")?;
    match value {
        Value::Object(document) => Ok(document),
        other => Err(anyhow!(
            "manifest root must be a json object, found {}",
            json_kind(&other)
        )),
    }
}

/// Pretty-prints with four-space indentation and a trailing newline.
/// Slashes and non-ASCII characters are written unescaped.
pub fn render_manifest_document(document: &ManifestDocument) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .context("failed to serialize manifest json")?;
    let mut rendered = String::from_utf8(buffer).context("serialized manifest is not utf-8")?;
    rendered.push('\n');
    Ok(rendered)
}

/// Looks up a package requirement in `require`, then `require-dev`.
pub fn find_require(document: &ManifestDocument, package: &str) -> Option<RequirementEntry> {
    [(REQUIRE_SECTION, false), (REQUIRE_DEV_SECTION, true)]
        .into_iter()
        .find_map(|(section, dev)| {
            let requirements = document.get(section)?.as_object()?;
            requirements
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(package))
                .map(|(name, constraint)| RequirementEntry {
                    package: name.clone(),
                    constraint: constraint.as_str().unwrap_or_default().to_string(),
                    dev,
                })
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
