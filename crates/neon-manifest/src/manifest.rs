//! Behaviour shared by library and binary `package.json` manifests.

use crate::{ManifestError, ManifestResult};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Manifest file name within a package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// The npm package fields every manifest carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

impl Preamble {
    pub(crate) fn from_json(json: &Map<String, Value>) -> ManifestResult<Self> {
        let field = |key: &str| {
            json.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ManifestError::shape(key, "a string"))
        };
        let description = match json.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(ManifestError::shape("description", "a string")),
        };

        Ok(Self {
            name: field("name")?,
            version: field("version")?,
            description,
        })
    }
}

/// A `package.json` manifest that can be written back to disk.
pub trait PackageManifest {
    fn preamble(&self) -> &Preamble;

    /// The complete manifest in the current schema.
    fn to_json(&self) -> Value;

    fn name(&self) -> &str {
        &self.preamble().name
    }

    fn version(&self) -> &str {
        &self.preamble().version
    }

    fn description(&self) -> Option<&str> {
        self.preamble().description.as_deref()
    }

    /// Pretty-printed JSON with a trailing newline, as npm writes it.
    fn stringify(&self) -> ManifestResult<String> {
        let mut text = serde_json::to_string_pretty(&self.to_json())?;
        text.push('\n');
        Ok(text)
    }

    /// Write `package.json` into `dir`.
    fn save_to(&self, dir: &Path) -> ManifestResult<()> {
        fs::write(dir.join(MANIFEST_FILE), self.stringify()?)?;
        Ok(())
    }
}

/// Read and parse `<dir>/package.json`, requiring a JSON object.
pub fn read_manifest(dir: &Path) -> ManifestResult<Map<String, Value>> {
    let text = fs::read_to_string(dir.join(MANIFEST_FILE))?;
    into_object(serde_json::from_str(&text)?)
}

pub(crate) fn into_object(json: Value) -> ManifestResult<Map<String, Value>> {
    match json {
        Value::Object(obj) => Ok(obj),
        _ => Err(ManifestError::shape("package.json", "an object")),
    }
}

pub(crate) fn neon_block(json: &Map<String, Value>) -> ManifestResult<&Value> {
    json.get("neon")
        .ok_or_else(|| ManifestError::shape("neon", "an object"))
}
