//! Read-only commands: platform lists, presets and catalog tables.

use crate::package;
use anyhow::{Context, Result};
use clap::ValueEnum;
use neon_manifest::family::expand_preset;
use neon_manifest::platform;
use serde_json::{Map, Value};
use std::path::Path;

/// Catalog tables printed by `neon show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Table {
    /// Node platforms with their OS, CPU, ABI and Rust targets
    Platforms,
    /// Preset names with their expansions
    Presets,
    /// Rust targets with their Node platforms
    Targets,
}

pub fn list_platforms(cwd: &Path) -> Result<()> {
    let manifest = package::load_project(cwd)?;
    print_json(&serde_json::to_value(manifest.platforms())?)
}

pub fn preset(name: &str) -> Result<()> {
    let expansion = expand_preset(name)?;
    print_json(&serde_json::to_value(expansion)?)
}

pub fn rust_target(cwd: &Path, requested: Option<&str>) -> Result<()> {
    println!("{}", declared_target(cwd, requested)?);
    Ok(())
}

pub fn current_platform() -> Result<()> {
    println!("{}", host_platform()?);
    Ok(())
}

pub fn show(table: Table) -> Result<()> {
    print_json(&catalog_table(table)?)
}

/// The Rust target the project declares for `requested`, or for the host
/// platform when none is given.
pub fn declared_target(cwd: &Path, requested: Option<&str>) -> Result<String> {
    let node = match requested {
        Some(node) => platform::assert_node_platform(node)?,
        None => host_platform()?,
    };

    let manifest = package::load_project(cwd)?;
    manifest
        .rust_target_for(node)
        .map(str::to_string)
        .with_context(|| format!("Platform {node} is not declared in neon.platforms"))
}

/// Node platform of the machine running the CLI.
pub fn host_platform() -> Result<&'static str> {
    let target = platform::current_target()
        .context("This machine does not match any Rust target in the platform catalog")?;
    Ok(platform::rust_to_node(target)?)
}

/// A catalog table as a JSON object keyed by name.
pub fn catalog_table(table: Table) -> Result<Value> {
    let mut out = Map::new();
    match table {
        Table::Platforms => {
            for node in platform::node_platforms() {
                if let Some(info) = platform::node_platform_info(node) {
                    out.insert(node.to_string(), serde_json::to_value(info)?);
                }
            }
        }
        Table::Presets => {
            for name in platform::platform_presets() {
                out.insert(name.to_string(), serde_json::to_value(expand_preset(name)?)?);
            }
        }
        Table::Targets => {
            for target in platform::rust_targets() {
                out.insert(target.to_string(), Value::from(platform::rust_to_node(target)?));
            }
        }
    }
    Ok(Value::Object(out))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
