//! The `upgrade` command.

use crate::package;
use anyhow::{Context, Result};
use neon_manifest::MANIFEST_FILE;
use std::path::Path;

pub fn run(cwd: &Path) -> Result<()> {
    let path = cwd.join(MANIFEST_FILE);

    if upgrade(cwd)? {
        println!("upgraded {}", path.display());
    } else {
        println!("{} is already in the current schema", path.display());
    }
    Ok(())
}

/// Re-save the project's manifest if it was written in an older schema.
/// Returns whether anything was written.
pub fn upgrade(cwd: &Path) -> Result<bool> {
    let manifest = package::load_project(cwd)?;
    if !manifest.upgraded() {
        return Ok(false);
    }

    manifest
        .save()
        .with_context(|| format!("Failed to write {}", manifest.manifest_path().display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use serde_json::{Value, json};
    use std::fs;

    fn write_manifest(dir: &Path, neon: Value) {
        let json = json!({ "name": "bolts", "version": "3.0.0", "neon": neon });
        fs::write(dir.join(MANIFEST_FILE), json.to_string()).unwrap();
    }

    #[test]
    fn upgrade___old_schema___rewrites_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            json!({ "type": "source", "org": "@bolts", "targets": { "darwin-x64": "x86_64-apple-darwin" } }),
        );

        assert!(upgrade(dir.path()).unwrap());

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["neon"]["type"], "library");
        assert_eq!(json["neon"]["platforms"]["darwin-x64"], "x86_64-apple-darwin");
    }

    #[test]
    fn upgrade___current_schema___leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            json!({ "type": "library", "org": "@bolts", "platforms": "macos" }),
        );
        let before = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();

        assert!(!upgrade(dir.path()).unwrap());

        let after = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(before, after);
    }
}
