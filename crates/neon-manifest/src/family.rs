//! Platform families and their expansion into flat platform maps.
//!
//! A family is what a library manifest writes under `neon.platforms`: a preset
//! name, a list of preset names, or an explicit Node platform → Rust target
//! map. Expansion always yields the flat map.

use crate::error::Catalog;
use crate::platform::{self, PresetDef};
use crate::{ManifestError, ManifestResult};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Node platform → Rust target.
pub type PlatformMap = BTreeMap<String, String>;

/// Node platform → Rust target as written in `neon.platforms`, in the
/// author's order.
pub type DeclaredPlatforms = IndexMap<String, String>;

/// One platform support entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetPair {
    pub node: String,
    pub rust: String,
}

impl TargetPair {
    pub fn new(node: impl Into<String>, rust: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            rust: rust.into(),
        }
    }
}

/// The declarative form of `neon.platforms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlatformFamily {
    /// A single preset name, e.g. `"common"`.
    Preset(String),
    /// Several preset names merged left to right.
    Presets(Vec<String>),
    /// An explicit map.
    Map(DeclaredPlatforms),
}

impl PlatformFamily {
    /// Decode a family from manifest JSON, checking every identifier against
    /// the catalog. `path` names the property for error messages.
    pub fn from_json(value: &Value, path: &str) -> ManifestResult<Self> {
        match value {
            Value::String(name) => {
                platform::assert_platform_preset(name)?;
                Ok(Self::Preset(name.clone()))
            }
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let name = item
                        .as_str()
                        .ok_or_else(|| ManifestError::shape(format!("{path}[{i}]"), "a string"))?;
                    platform::assert_platform_preset(name)?;
                    names.push(name.to_string());
                }
                Ok(Self::Presets(names))
            }
            Value::Object(entries) => {
                let mut map = DeclaredPlatforms::new();
                for (node, rust) in entries {
                    platform::assert_node_platform(node)?;
                    let rust = rust
                        .as_str()
                        .ok_or_else(|| ManifestError::shape(format!("{path}.{node}"), "a string"))?;
                    platform::assert_rust_target(rust)?;
                    map.insert(node.clone(), rust.to_string());
                }
                Ok(Self::Map(map))
            }
            _ => Err(ManifestError::shape(
                path,
                "a preset name, an array of preset names, or a platform map",
            )),
        }
    }

    /// Encode back to manifest JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Preset(name) => Value::String(name.clone()),
            Self::Presets(names) => names.iter().cloned().map(Value::String).collect(),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(node, rust)| (node.clone(), Value::String(rust.clone())))
                    .collect(),
            ),
        }
    }

    /// Expand into a flat map.
    pub fn expand(&self) -> ManifestResult<PlatformMap> {
        expand_platform_family(self)
    }
}

impl From<PlatformMap> for PlatformFamily {
    fn from(map: PlatformMap) -> Self {
        Self::Map(map.into_iter().collect())
    }
}

/// Expand a platform family into a flat Node platform → Rust target map.
///
/// Lists are merged left to right and later entries win on collision. A flat
/// map expands to itself.
pub fn expand_platform_family(family: &PlatformFamily) -> ManifestResult<PlatformMap> {
    match family {
        PlatformFamily::Preset(name) => expand_preset(name),
        PlatformFamily::Presets(names) => {
            let mut out = PlatformMap::new();
            for name in names {
                merge_preset(name, platform::preset, &mut out, &mut Vec::new())?;
            }
            Ok(out)
        }
        PlatformFamily::Map(map) => Ok(map
            .iter()
            .map(|(node, rust)| (node.clone(), rust.clone()))
            .collect()),
    }
}

/// Expand a single catalog preset.
pub fn expand_preset(name: &str) -> ManifestResult<PlatformMap> {
    let mut out = PlatformMap::new();
    merge_preset(name, platform::preset, &mut out, &mut Vec::new())?;
    Ok(out)
}

type PresetLookup = fn(&str) -> Option<&'static PresetDef>;

/// Merge the expansion of `name` into `out`. `visiting` holds the presets on
/// the current path so a self-referencing chain fails instead of recursing
/// forever; shared sub-presets (diamonds) are fine.
fn merge_preset(
    name: &str,
    lookup: PresetLookup,
    out: &mut PlatformMap,
    visiting: &mut Vec<String>,
) -> ManifestResult<()> {
    let def = lookup(name).ok_or_else(|| ManifestError::InvalidIdentifier {
        kind: Catalog::PlatformPreset,
        value: name.to_string(),
    })?;

    if visiting.iter().any(|v| v == name) {
        return Err(ManifestError::PresetCycle(name.to_string()));
    }

    match def {
        PresetDef::Map(entries) => {
            for (node, rust) in *entries {
                out.insert((*node).to_string(), (*rust).to_string());
            }
        }
        PresetDef::Group(members) => {
            visiting.push(name.to_string());
            for member in *members {
                merge_preset(member, lookup, out, visiting)?;
            }
            visiting.pop();
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "family/family_tests.rs"]
mod family_tests;
