//! Binary package manifests: one prebuilt addon for one platform.

use crate::manifest::{self, PackageManifest, Preamble};
use crate::schema::{self, BinaryCfg};
use crate::ManifestResult;
use serde_json::{Map, Value};
use std::path::Path;

/// Manifest of a per-platform binary package.
#[derive(Debug, Clone)]
pub struct BinaryManifest {
    json: Map<String, Value>,
    preamble: Preamble,
    cfg: BinaryCfg,
    upgraded: bool,
}

impl BinaryManifest {
    /// Build from parsed `package.json` contents, upgrading older schemas.
    pub fn from_json(json: Value) -> ManifestResult<Self> {
        let mut json = manifest::into_object(json)?;
        let preamble = Preamble::from_json(&json)?;
        let decoded = schema::decode_binary(manifest::neon_block(&json)?)?;

        let upgraded = decoded.upgraded();
        if upgraded {
            json.insert("neon".to_string(), decoded.cfg.to_json());
        }

        Ok(Self {
            json,
            preamble,
            cfg: decoded.cfg,
            upgraded,
        })
    }

    /// Load `<dir>/package.json`.
    pub fn load(dir: &Path) -> ManifestResult<Self> {
        Self::from_json(Value::Object(manifest::read_manifest(dir)?))
    }

    #[must_use]
    pub fn cfg(&self) -> &BinaryCfg {
        &self.cfg
    }

    /// Whether the manifest was read from an older schema.
    #[must_use]
    pub fn upgraded(&self) -> bool {
        self.upgraded
    }

    /// Write `package.json` into `dir`.
    pub fn save(&self, dir: &Path) -> ManifestResult<()> {
        self.save_to(dir)
    }
}

impl PackageManifest for BinaryManifest {
    fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    fn to_json(&self) -> Value {
        Value::Object(self.json.clone())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use serde_json::json;

    #[test]
    fn BinaryManifest___from_json___current_schema_is_untouched() {
        let json = json!({
            "name": "@acme/linux-x64-gnu",
            "version": "1.2.3",
            "neon": {
                "type": "binary",
                "rust": "x86_64-unknown-linux-gnu",
                "node": "linux-x64-gnu",
                "os": "linux",
                "arch": "x64",
                "abi": "gnu"
            }
        });

        let manifest = BinaryManifest::from_json(json.clone()).unwrap();

        assert!(!manifest.upgraded());
        assert_eq!(manifest.to_json(), json);
        assert_eq!(manifest.name(), "@acme/linux-x64-gnu");
        assert_eq!(manifest.cfg().abi.as_deref(), Some("gnu"));
    }

    #[test]
    fn BinaryManifest___from_json___v1_is_rewritten() {
        let manifest = BinaryManifest::from_json(json!({
            "name": "@acme/darwin-arm64",
            "version": "0.1.0",
            "neon": {
                "binary": {
                    "rust": "aarch64-apple-darwin",
                    "node": "darwin-arm64",
                    "platform": "darwin",
                    "arch": "arm64",
                    "abi": null
                }
            }
        }))
        .unwrap();

        assert!(manifest.upgraded());
        assert_eq!(
            manifest.to_json()["neon"],
            json!({
                "type": "binary",
                "rust": "aarch64-apple-darwin",
                "node": "darwin-arm64",
                "os": "darwin",
                "arch": "arm64",
                "abi": null
            })
        );
    }

    #[test]
    fn BinaryManifest___from_json___missing_version___fails() {
        let err = BinaryManifest::from_json(json!({ "name": "@acme/x", "neon": {} })).unwrap_err();

        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn BinaryManifest___save_and_load___round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BinaryManifest::from_json(json!({
            "name": "@acme/win32-x64-msvc",
            "version": "2.0.0",
            "neon": {
                "type": "binary",
                "rust": "x86_64-pc-windows-msvc",
                "node": "win32-x64-msvc",
                "platform": "win32",
                "arch": "x64",
                "abi": "msvc"
            }
        }))
        .unwrap();

        manifest.save(dir.path()).unwrap();
        let reloaded = BinaryManifest::load(dir.path()).unwrap();

        assert!(!reloaded.upgraded());
        assert_eq!(reloaded.cfg(), manifest.cfg());
        assert_eq!(reloaded.version(), "2.0.0");
    }
}
