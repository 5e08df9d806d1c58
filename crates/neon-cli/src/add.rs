//! The `add-platform` command.

use crate::package;
use anyhow::{Context, Result};
use neon_manifest::TargetPair;
use neon_manifest::platform;
use std::path::{Path, PathBuf};

/// What an `add-platform` argument names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    Preset,
    NodePlatform,
    RustTarget,
}

impl PlatformArg {
    /// Classify an argument against the platform catalog.
    pub fn classify(arg: &str) -> Result<Self> {
        if platform::is_platform_preset(arg) {
            Ok(Self::Preset)
        } else if platform::is_node_platform(arg) {
            Ok(Self::NodePlatform)
        } else if platform::is_rust_target(arg) {
            Ok(Self::RustTarget)
        } else {
            anyhow::bail!(
                "'{arg}' is not a platform preset, Node platform or Rust target (see `neon show`)"
            )
        }
    }
}

/// Run `add-platform` and print the pairs that were added.
pub fn run(cwd: &Path, arg: &str, out_dir: Option<PathBuf>, bundle: Option<PathBuf>) -> Result<()> {
    let added = add_platform(cwd, arg, out_dir, bundle)?;

    if added.is_empty() {
        tracing::warn!("{arg} is already declared in neon.platforms");
    }
    println!("{}", serde_json::to_string_pretty(&added)?);
    Ok(())
}

/// Declare `arg` in the project's manifest, create binary packages for the
/// new platforms under `out_dir`, and update optional dependencies.
pub fn add_platform(
    cwd: &Path,
    arg: &str,
    out_dir: Option<PathBuf>,
    bundle: Option<PathBuf>,
) -> Result<Vec<TargetPair>> {
    let kind = PlatformArg::classify(arg)?;
    let mut manifest = package::load_project(cwd)?;

    let added: Vec<TargetPair> = match kind {
        PlatformArg::Preset => manifest.add_platform_preset(arg)?,
        PlatformArg::NodePlatform => manifest.add_node_platform(arg)?.into_iter().collect(),
        PlatformArg::RustTarget => manifest.add_rust_target(arg)?.into_iter().collect(),
    };
    for pair in &added {
        tracing::debug!("added {} => {}", pair.node, pair.rust);
    }

    if let Some(out_dir) = out_dir {
        let out_dir = cwd.join(out_dir);
        for pair in &added {
            package::create_binary_package(&manifest, &out_dir, &pair.node)
                .with_context(|| format!("Failed to create binary package for {}", pair.node))?;
        }
    }

    package::update_targets(&mut manifest, bundle.as_deref())?;
    Ok(added)
}
