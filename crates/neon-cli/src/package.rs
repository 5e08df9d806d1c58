//! Binary package directories and optional dependency upkeep.

use anyhow::{Context, Result};
use neon_manifest::{BinaryManifest, LibraryManifest, MANIFEST_FILE, PackageManifest};
use std::path::{Path, PathBuf};

/// Load the library manifest of the project in `cwd`.
pub fn load_project(cwd: &Path) -> Result<LibraryManifest> {
    let manifest = LibraryManifest::load(cwd)
        .with_context(|| format!("Failed to load {}", cwd.join(MANIFEST_FILE).display()))?;

    if manifest.upgraded() {
        tracing::info!("read {} in an older schema", manifest.manifest_path().display());
    }
    Ok(manifest)
}

/// Create missing binary packages for every declared platform, then update
/// the library's optional dependencies.
pub fn update_platforms(cwd: &Path, out_dir: Option<PathBuf>, bundle: Option<PathBuf>) -> Result<()> {
    let mut manifest = load_project(cwd)?;

    if let Some(out_dir) = out_dir {
        for dir in create_missing_packages(&manifest, &cwd.join(out_dir))? {
            println!("created {}", dir.display());
        }
    }

    update_targets(&mut manifest, bundle.as_deref())
}

/// Create `<out_dir>/<platform>/` for each declared platform that has no
/// `package.json` there yet. Returns the directories created.
pub fn create_missing_packages(manifest: &LibraryManifest, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for node in manifest.platforms().keys() {
        if out_dir.join(node).join(MANIFEST_FILE).exists() {
            tracing::debug!("binary package for {node} already exists");
            continue;
        }
        created.push(create_binary_package(manifest, out_dir, node)?);
    }
    Ok(created)
}

/// Write `package.json` and `README.md` for one platform's binary package.
pub fn create_binary_package(manifest: &LibraryManifest, out_dir: &Path, node: &str) -> Result<PathBuf> {
    let rust = manifest
        .rust_target_for(node)
        .with_context(|| format!("Platform {node} is not declared in neon.platforms"))?;
    let binary = manifest.manifest_for(rust)?;

    let dir = out_dir.join(node);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    binary
        .save(&dir)
        .with_context(|| format!("Failed to write {}", dir.join(MANIFEST_FILE).display()))?;
    std::fs::write(dir.join("README.md"), readme(&binary))
        .with_context(|| format!("Failed to write {}", dir.join("README.md").display()))?;

    tracing::debug!("wrote binary package {} for {rust}", binary.name());
    Ok(dir)
}

/// README of a binary package: its name as the title, then its description.
pub fn readme(binary: &BinaryManifest) -> String {
    format!(
        "# `{}`\n\n{}\n",
        binary.name(),
        binary.description().unwrap_or_default()
    )
}

/// Add every platform package to `optionalDependencies`, logging progress.
pub fn update_targets(manifest: &mut LibraryManifest, bundle: Option<&Path>) -> Result<()> {
    manifest
        .update_targets(|msg| tracing::info!("{msg}"), bundle)
        .context("Failed to update optionalDependencies")
}
