//! Manifest schema versions and the upgrades between them.
//!
//! Library manifests have gone through five layouts of the `neon` block,
//! binary manifests through three:
//!
//! | version | library `neon` block                                        |
//! |---------|-------------------------------------------------------------|
//! | 5       | `{ type: "library", org, platforms, load? }`                |
//! | 4       | `{ type: "source", org, platforms, load? }`                 |
//! | 3       | `{ type: "source", org, targets }`                          |
//! | 2       | `{ org, targets }` (flat platform map)                      |
//! | 1       | `{ targets: { <rust target>: "@org/<platform>" } }`         |
//!
//! | version | binary `neon` block                                         |
//! |---------|-------------------------------------------------------------|
//! | 3       | `{ type: "binary", rust, node, os, arch, abi }`             |
//! | 2       | `{ type: "binary", rust, node, platform, arch, abi }`       |
//! | 1       | `{ binary: { rust, node, platform, arch, abi } }`           |
//!
//! Each table below is ordered newest first. Older layouts are structural
//! variants of newer ones, so the first matching detector decides.

use crate::family::{DeclaredPlatforms, PlatformFamily};
use crate::platform;
use crate::{ManifestError, ManifestResult};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

pub const LIBRARY_SCHEMA_VERSION: u8 = 5;
pub const BINARY_SCHEMA_VERSION: u8 = 3;

type Object = Map<String, Value>;

/// Current `neon` block of a library manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCfg {
    pub org: String,
    pub platforms: PlatformFamily,
    pub load: Option<String>,
}

impl LibraryCfg {
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut neon = json!({
            "type": "library",
            "org": self.org,
            "platforms": self.platforms.to_json(),
        });
        if let Some(load) = &self.load {
            neon["load"] = Value::String(load.clone());
        }
        neon
    }
}

/// Current `neon` block of a binary manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCfg {
    pub rust: String,
    pub node: String,
    pub os: String,
    pub arch: String,
    pub abi: Option<String>,
}

impl BinaryCfg {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "type": "binary",
            "rust": self.rust,
            "node": self.node,
            "os": self.os,
            "arch": self.arch,
            "abi": self.abi,
        })
    }
}

/// A decoded `neon` block together with the schema version it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub cfg: T,
    pub version: u8,
    current: u8,
}

impl<T> Decoded<T> {
    /// Whether the block had to be rewritten to reach the current schema.
    #[must_use]
    pub fn upgraded(&self) -> bool {
        self.version != self.current
    }
}

struct Schema<T> {
    version: u8,
    detect: fn(&Object) -> bool,
    decode: fn(&Object) -> ManifestResult<T>,
}

static LIBRARY_SCHEMAS: &[Schema<LibraryCfg>] = &[
    Schema {
        version: 5,
        detect: is_library_v5,
        decode: decode_library_v5,
    },
    Schema {
        version: 4,
        detect: is_library_v4,
        decode: decode_library_v4,
    },
    Schema {
        version: 3,
        detect: is_library_v3,
        decode: decode_library_v3,
    },
    Schema {
        version: 2,
        detect: is_library_v2,
        decode: decode_library_v2,
    },
    Schema {
        version: 1,
        detect: is_library_v1,
        decode: decode_library_v1,
    },
];

static BINARY_SCHEMAS: &[Schema<BinaryCfg>] = &[
    Schema {
        version: 3,
        detect: is_binary_v3,
        decode: decode_binary_v3,
    },
    Schema {
        version: 2,
        detect: is_binary_v2,
        decode: decode_binary_v2,
    },
    Schema {
        version: 1,
        detect: is_binary_v1,
        decode: decode_binary_v1,
    },
];

/// Decode the `neon` block of a library manifest, whatever its vintage.
pub fn decode_library(neon: &Value) -> ManifestResult<Decoded<LibraryCfg>> {
    decode_with(neon, LIBRARY_SCHEMAS, LIBRARY_SCHEMA_VERSION, "library")
}

/// Decode the `neon` block of a binary manifest, whatever its vintage.
pub fn decode_binary(neon: &Value) -> ManifestResult<Decoded<BinaryCfg>> {
    decode_with(neon, BINARY_SCHEMAS, BINARY_SCHEMA_VERSION, "binary")
}

fn decode_with<T>(
    neon: &Value,
    schemas: &[Schema<T>],
    current: u8,
    kind: &str,
) -> ManifestResult<Decoded<T>> {
    let obj = neon
        .as_object()
        .ok_or_else(|| ManifestError::shape("neon", "an object"))?;

    let schema = schemas
        .iter()
        .find(|schema| (schema.detect)(obj))
        .ok_or_else(|| ManifestError::shape("neon.type", format!("\"{kind}\"")))?;

    Ok(Decoded {
        cfg: (schema.decode)(obj)?,
        version: schema.version,
        current,
    })
}

// ============================================================================
// Library schemas
// ============================================================================

fn type_is(obj: &Object, expected: &str) -> bool {
    obj.get("type").and_then(Value::as_str) == Some(expected)
}

fn is_library_v5(obj: &Object) -> bool {
    type_is(obj, "library")
}

fn is_library_v4(obj: &Object) -> bool {
    type_is(obj, "source") && obj.contains_key("platforms")
}

fn is_library_v3(obj: &Object) -> bool {
    type_is(obj, "source")
}

fn is_library_v2(obj: &Object) -> bool {
    !obj.contains_key("type") && obj.contains_key("org")
}

fn is_library_v1(obj: &Object) -> bool {
    !obj.contains_key("type") && obj.contains_key("targets")
}

fn decode_library_v5(obj: &Object) -> ManifestResult<LibraryCfg> {
    decode_library_platforms(obj, "platforms")
}

fn decode_library_v4(obj: &Object) -> ManifestResult<LibraryCfg> {
    decode_library_platforms(obj, "platforms")
}

fn decode_library_v3(obj: &Object) -> ManifestResult<LibraryCfg> {
    decode_library_platforms(obj, "targets")
}

fn decode_library_platforms(obj: &Object, key: &str) -> ManifestResult<LibraryCfg> {
    let org = required_str(obj, "org", "neon.org")?;
    let platforms = obj
        .get(key)
        .ok_or_else(|| ManifestError::shape(format!("neon.{key}"), "present"))?;

    Ok(LibraryCfg {
        org: org.to_string(),
        platforms: PlatformFamily::from_json(platforms, &format!("neon.{key}"))?,
        load: optional_str(obj, "load", "neon.load")?.map(str::to_string),
    })
}

fn decode_library_v2(obj: &Object) -> ManifestResult<LibraryCfg> {
    let org = required_str(obj, "org", "neon.org")?;
    let targets = obj
        .get("targets")
        .filter(|targets| targets.is_object())
        .ok_or_else(|| ManifestError::shape("neon.targets", "a platform map"))?;

    Ok(LibraryCfg {
        org: org.to_string(),
        platforms: PlatformFamily::from_json(targets, "neon.targets")?,
        load: None,
    })
}

fn decode_library_v1(obj: &Object) -> ManifestResult<LibraryCfg> {
    let targets = required_object(obj, "targets", "neon.targets")?;

    let mut orgs = BTreeSet::new();
    let mut platforms = DeclaredPlatforms::new();
    for (rust, package) in targets {
        let path = format!("neon.targets.{rust}");
        platform::assert_rust_target(rust)?;
        let package = package
            .as_str()
            .ok_or_else(|| ManifestError::shape(&path, "a string"))?;
        let (org, node) = package
            .rsplit_once('/')
            .filter(|(org, node)| org.starts_with('@') && org.len() > 1 && !node.is_empty())
            .ok_or_else(|| ManifestError::shape(&path, "a scoped package name \"@org/platform\""))?;
        platform::assert_node_platform(node)?;

        orgs.insert(org.to_string());
        platforms.insert(node.to_string(), rust.clone());
    }

    if orgs.len() != 1 {
        return Err(ManifestError::OrgMismatch(orgs.into_iter().collect()));
    }
    let org = orgs.into_iter().next().unwrap_or_default();

    Ok(LibraryCfg {
        org,
        platforms: PlatformFamily::Map(platforms),
        load: None,
    })
}

// ============================================================================
// Binary schemas
// ============================================================================

fn is_binary_v3(obj: &Object) -> bool {
    type_is(obj, "binary") && obj.contains_key("os")
}

fn is_binary_v2(obj: &Object) -> bool {
    type_is(obj, "binary")
}

fn is_binary_v1(obj: &Object) -> bool {
    !obj.contains_key("type") && obj.contains_key("binary")
}

fn decode_binary_v3(obj: &Object) -> ManifestResult<BinaryCfg> {
    decode_binary_fields(obj, "neon", "os")
}

fn decode_binary_v2(obj: &Object) -> ManifestResult<BinaryCfg> {
    decode_binary_fields(obj, "neon", "platform")
}

fn decode_binary_v1(obj: &Object) -> ManifestResult<BinaryCfg> {
    let binary = required_object(obj, "binary", "neon.binary")?;
    decode_binary_fields(binary, "neon.binary", "platform")
}

fn decode_binary_fields(obj: &Object, prefix: &str, os_key: &str) -> ManifestResult<BinaryCfg> {
    let rust = required_str(obj, "rust", &format!("{prefix}.rust"))?;
    let node = required_str(obj, "node", &format!("{prefix}.node"))?;
    let os = required_str(obj, os_key, &format!("{prefix}.{os_key}"))?;
    let arch = required_str(obj, "arch", &format!("{prefix}.arch"))?;
    let abi = match obj.get("abi") {
        Some(Value::String(abi)) => Some(abi.clone()),
        Some(Value::Null) => None,
        _ => {
            return Err(ManifestError::shape(
                format!("{prefix}.abi"),
                "a string or null",
            ));
        }
    };

    Ok(BinaryCfg {
        rust: platform::assert_rust_target(rust)?.to_string(),
        node: platform::assert_node_platform(node)?.to_string(),
        os: os.to_string(),
        arch: arch.to_string(),
        abi,
    })
}

// ============================================================================
// Field access
// ============================================================================

pub(crate) fn required_str<'a>(obj: &'a Object, key: &str, path: &str) -> ManifestResult<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ManifestError::shape(path, "a string"))
}

pub(crate) fn optional_str<'a>(
    obj: &'a Object,
    key: &str,
    path: &str,
) -> ManifestResult<Option<&'a str>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ManifestError::shape(path, "a string")),
    }
}

fn required_object<'a>(obj: &'a Object, key: &str, path: &str) -> ManifestResult<&'a Object> {
    obj.get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| ManifestError::shape(path, "an object"))
}
