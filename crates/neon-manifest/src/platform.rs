//! Static catalog of Rust targets, Node platforms and platform presets.
//!
//! Three tables drive everything else in this crate:
//!
//! - Rust target triple → Node platform (`x86_64-unknown-linux-gnu` →
//!   `linux-x64-gnu`)
//! - Node platform → `{ os, arch, abi, llvm }` descriptor
//! - preset name → platform map or list of other presets

use crate::error::Catalog;
use crate::{ManifestError, ManifestResult};
use serde::Serialize;

/// OS, CPU and ABI facts for a Node platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodePlatformInfo {
    /// Value of Node's `process.platform`.
    pub os: &'static str,
    /// Value of Node's `process.arch`.
    pub arch: &'static str,
    /// C runtime / calling convention, if the platform distinguishes one.
    pub abi: Option<&'static str>,
    /// Rust targets that build for this platform.
    pub llvm: &'static [&'static str],
}

/// Everything known about a Rust target: its Node platform and that
/// platform's descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetDescriptor {
    pub node: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub abi: Option<&'static str>,
    pub llvm: &'static [&'static str],
}

/// Definition of a named preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetDef {
    /// A flat Node platform → Rust target map.
    Map(&'static [(&'static str, &'static str)]),
    /// A merge of other presets, later entries winning.
    Group(&'static [&'static str]),
}

const fn info(
    os: &'static str,
    arch: &'static str,
    abi: Option<&'static str>,
    llvm: &'static [&'static str],
) -> NodePlatformInfo {
    NodePlatformInfo { os, arch, abi, llvm }
}

static RUST_TARGETS: &[(&str, &str)] = &[
    ("aarch64-apple-darwin", "darwin-arm64"),
    ("x86_64-apple-darwin", "darwin-x64"),
    ("aarch64-apple-ios", "ios-arm64"),
    ("x86_64-apple-ios", "ios-x64"),
    ("aarch64-linux-android", "android-arm64"),
    ("armv7-linux-androideabi", "android-arm-eabi"),
    ("i686-linux-android", "android-ia32"),
    ("x86_64-linux-android", "android-x64"),
    ("aarch64-pc-windows-msvc", "win32-arm64-msvc"),
    ("i686-pc-windows-gnu", "win32-ia32-gnu"),
    ("i686-pc-windows-msvc", "win32-ia32-msvc"),
    ("x86_64-pc-windows-gnu", "win32-x64-gnu"),
    ("x86_64-pc-windows-msvc", "win32-x64-msvc"),
    ("aarch64-unknown-linux-gnu", "linux-arm64-gnu"),
    ("aarch64-unknown-linux-musl", "linux-arm64-musl"),
    ("arm-unknown-linux-gnueabihf", "linux-arm-gnueabihf"),
    ("arm-unknown-linux-musleabihf", "linux-arm-musleabihf"),
    ("armv7-unknown-linux-gnueabihf", "linux-arm-gnueabihf"),
    ("armv7-unknown-linux-musleabihf", "linux-arm-musleabihf"),
    ("i686-unknown-linux-gnu", "linux-ia32-gnu"),
    ("i686-unknown-linux-musl", "linux-ia32-musl"),
    ("mips-unknown-linux-gnu", "linux-mips-gnu"),
    ("mips-unknown-linux-musl", "linux-mips-musl"),
    ("mips64-unknown-linux-gnuabi64", "linux-mips64-gnuabi64"),
    ("mips64-unknown-linux-muslabi64", "linux-mips64-muslabi64"),
    ("mips64el-unknown-linux-gnuabi64", "linux-mips64el-gnuabi64"),
    ("mips64el-unknown-linux-muslabi64", "linux-mips64el-muslabi64"),
    ("mipsel-unknown-linux-gnu", "linux-mipsel-gnu"),
    ("mipsel-unknown-linux-musl", "linux-mipsel-musl"),
    ("powerpc-unknown-linux-gnu", "linux-powerpc-gnu"),
    ("powerpc64-unknown-linux-gnu", "linux-powerpc64-gnu"),
    ("powerpc64le-unknown-linux-gnu", "linux-ppc64-gnu"),
    ("riscv64gc-unknown-linux-gnu", "linux-riscv64gc-gnu"),
    ("s390x-unknown-linux-gnu", "linux-s390x-gnu"),
    ("x86_64-unknown-linux-gnu", "linux-x64-gnu"),
    ("x86_64-unknown-linux-musl", "linux-x64-musl"),
    ("i686-unknown-freebsd", "freebsd-ia32"),
    ("x86_64-unknown-freebsd", "freebsd-x64"),
];

static NODE_PLATFORMS: &[(&str, NodePlatformInfo)] = &[
    ("darwin-arm64", info("darwin", "arm64", None, &["aarch64-apple-darwin"])),
    ("darwin-x64", info("darwin", "x64", None, &["x86_64-apple-darwin"])),
    ("ios-arm64", info("ios", "arm64", None, &["aarch64-apple-ios"])),
    ("ios-x64", info("ios", "x64", None, &["x86_64-apple-ios"])),
    ("android-arm64", info("android", "arm64", None, &["aarch64-linux-android"])),
    ("android-arm-eabi", info("android", "arm", Some("eabi"), &["armv7-linux-androideabi"])),
    ("android-ia32", info("android", "ia32", None, &["i686-linux-android"])),
    ("android-x64", info("android", "x64", None, &["x86_64-linux-android"])),
    ("win32-arm64-msvc", info("win32", "arm64", Some("msvc"), &["aarch64-pc-windows-msvc"])),
    ("win32-ia32-gnu", info("win32", "ia32", Some("gnu"), &["i686-pc-windows-gnu"])),
    ("win32-ia32-msvc", info("win32", "ia32", Some("msvc"), &["i686-pc-windows-msvc"])),
    ("win32-x64-gnu", info("win32", "x64", Some("gnu"), &["x86_64-pc-windows-gnu"])),
    ("win32-x64-msvc", info("win32", "x64", Some("msvc"), &["x86_64-pc-windows-msvc"])),
    ("linux-arm64-gnu", info("linux", "arm64", Some("gnu"), &["aarch64-unknown-linux-gnu"])),
    ("linux-arm64-musl", info("linux", "arm64", Some("musl"), &["aarch64-unknown-linux-musl"])),
    (
        "linux-arm-gnueabihf",
        info(
            "linux",
            "arm",
            Some("gnueabihf"),
            &["arm-unknown-linux-gnueabihf", "armv7-unknown-linux-gnueabihf"],
        ),
    ),
    (
        "linux-arm-musleabihf",
        info(
            "linux",
            "arm",
            Some("musleabihf"),
            &["arm-unknown-linux-musleabihf", "armv7-unknown-linux-musleabihf"],
        ),
    ),
    ("linux-ia32-gnu", info("linux", "ia32", Some("gnu"), &["i686-unknown-linux-gnu"])),
    ("linux-ia32-musl", info("linux", "ia32", Some("musl"), &["i686-unknown-linux-musl"])),
    ("linux-mips-gnu", info("linux", "mips", Some("gnu"), &["mips-unknown-linux-gnu"])),
    ("linux-mips-musl", info("linux", "mips", Some("musl"), &["mips-unknown-linux-musl"])),
    (
        "linux-mips64-gnuabi64",
        info("linux", "mips64", Some("gnuabi64"), &["mips64-unknown-linux-gnuabi64"]),
    ),
    (
        "linux-mips64-muslabi64",
        info("linux", "mips64", Some("muslabi64"), &["mips64-unknown-linux-muslabi64"]),
    ),
    (
        "linux-mips64el-gnuabi64",
        info("linux", "mips64el", Some("gnuabi64"), &["mips64el-unknown-linux-gnuabi64"]),
    ),
    (
        "linux-mips64el-muslabi64",
        info("linux", "mips64el", Some("muslabi64"), &["mips64el-unknown-linux-muslabi64"]),
    ),
    ("linux-mipsel-gnu", info("linux", "mipsel", Some("gnu"), &["mipsel-unknown-linux-gnu"])),
    ("linux-mipsel-musl", info("linux", "mipsel", Some("musl"), &["mipsel-unknown-linux-musl"])),
    ("linux-powerpc-gnu", info("linux", "ppc", Some("gnu"), &["powerpc-unknown-linux-gnu"])),
    ("linux-powerpc64-gnu", info("linux", "ppc64", Some("gnu"), &["powerpc64-unknown-linux-gnu"])),
    ("linux-ppc64-gnu", info("linux", "ppc64", Some("gnu"), &["powerpc64le-unknown-linux-gnu"])),
    ("linux-riscv64gc-gnu", info("linux", "riscv64", Some("gnu"), &["riscv64gc-unknown-linux-gnu"])),
    ("linux-s390x-gnu", info("linux", "s390x", Some("gnu"), &["s390x-unknown-linux-gnu"])),
    ("linux-x64-gnu", info("linux", "x64", Some("gnu"), &["x86_64-unknown-linux-gnu"])),
    ("linux-x64-musl", info("linux", "x64", Some("musl"), &["x86_64-unknown-linux-musl"])),
    ("freebsd-ia32", info("freebsd", "ia32", None, &["i686-unknown-freebsd"])),
    ("freebsd-x64", info("freebsd", "x64", None, &["x86_64-unknown-freebsd"])),
];

static PRESETS: &[(&str, PresetDef)] = &[
    (
        "linux",
        PresetDef::Map(&[
            ("linux-x64-gnu", "x86_64-unknown-linux-gnu"),
            ("linux-arm64-gnu", "aarch64-unknown-linux-gnu"),
            ("linux-arm-gnueabihf", "armv7-unknown-linux-gnueabihf"),
        ]),
    ),
    (
        "linux-musl",
        PresetDef::Map(&[
            ("linux-x64-musl", "x86_64-unknown-linux-musl"),
            ("linux-arm64-musl", "aarch64-unknown-linux-musl"),
        ]),
    ),
    (
        "macos",
        PresetDef::Map(&[
            ("darwin-x64", "x86_64-apple-darwin"),
            ("darwin-arm64", "aarch64-apple-darwin"),
        ]),
    ),
    (
        "windows",
        PresetDef::Map(&[
            ("win32-x64-msvc", "x86_64-pc-windows-msvc"),
            ("win32-arm64-msvc", "aarch64-pc-windows-msvc"),
        ]),
    ),
    (
        "android",
        PresetDef::Map(&[
            ("android-arm64", "aarch64-linux-android"),
            ("android-arm-eabi", "armv7-linux-androideabi"),
        ]),
    ),
    ("ios", PresetDef::Map(&[("ios-arm64", "aarch64-apple-ios")])),
    (
        "freebsd",
        PresetDef::Map(&[("freebsd-x64", "x86_64-unknown-freebsd")]),
    ),
    ("desktop", PresetDef::Group(&["linux", "macos", "windows"])),
    ("mobile", PresetDef::Group(&["android", "ios"])),
    ("common", PresetDef::Group(&["desktop"])),
    (
        "extended",
        PresetDef::Group(&["common", "mobile", "linux-musl", "freebsd"]),
    ),
];

/// All Rust targets in the catalog.
pub fn rust_targets() -> impl Iterator<Item = &'static str> {
    RUST_TARGETS.iter().map(|(target, _)| *target)
}

/// All Node platforms in the catalog.
pub fn node_platforms() -> impl Iterator<Item = &'static str> {
    NODE_PLATFORMS.iter().map(|(platform, _)| *platform)
}

/// All preset names in the catalog.
pub fn platform_presets() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

#[must_use]
pub fn is_rust_target(s: &str) -> bool {
    RUST_TARGETS.iter().any(|(target, _)| *target == s)
}

#[must_use]
pub fn is_node_platform(s: &str) -> bool {
    NODE_PLATFORMS.iter().any(|(platform, _)| *platform == s)
}

#[must_use]
pub fn is_platform_preset(s: &str) -> bool {
    PRESETS.iter().any(|(name, _)| *name == s)
}

/// Check that `s` is a known Rust target, returning the catalog's copy.
pub fn assert_rust_target(s: &str) -> ManifestResult<&'static str> {
    rust_targets()
        .find(|target| *target == s)
        .ok_or_else(|| invalid(Catalog::RustTarget, s))
}

/// Check that `s` is a known Node platform, returning the catalog's copy.
pub fn assert_node_platform(s: &str) -> ManifestResult<&'static str> {
    node_platforms()
        .find(|platform| *platform == s)
        .ok_or_else(|| invalid(Catalog::NodePlatform, s))
}

/// Check that `s` is a known preset name, returning the catalog's copy.
pub fn assert_platform_preset(s: &str) -> ManifestResult<&'static str> {
    platform_presets()
        .find(|name| *name == s)
        .ok_or_else(|| invalid(Catalog::PlatformPreset, s))
}

fn invalid(kind: Catalog, value: &str) -> ManifestError {
    ManifestError::InvalidIdentifier {
        kind,
        value: value.to_string(),
    }
}

/// Look up the descriptor of a Node platform.
#[must_use]
pub fn node_platform_info(platform: &str) -> Option<&'static NodePlatformInfo> {
    NODE_PLATFORMS
        .iter()
        .find(|(name, _)| *name == platform)
        .map(|(_, info)| info)
}

/// Look up a preset definition.
#[must_use]
pub fn preset(name: &str) -> Option<&'static PresetDef> {
    PRESETS.iter().find(|(n, _)| *n == name).map(|(_, def)| def)
}

/// Describe a Rust target: its Node platform plus OS, CPU and ABI.
pub fn target_descriptor(target: &str) -> ManifestResult<TargetDescriptor> {
    let target = assert_rust_target(target)?;
    let node = rust_to_node(target)?;
    let info = node_platform_info(node).ok_or_else(|| {
        ManifestError::CatalogInconsistency(format!("{target} maps to unknown platform {node}"))
    })?;

    if let Some(bad) = info.llvm.iter().find(|llvm| !is_rust_target(llvm)) {
        return Err(ManifestError::CatalogInconsistency(format!(
            "platform {node} lists unknown Rust target {bad}"
        )));
    }

    Ok(TargetDescriptor {
        node,
        os: info.os,
        arch: info.arch,
        abi: info.abi,
        llvm: info.llvm,
    })
}

/// Rust targets that build for a Node platform. Never empty.
pub fn node_to_rust(platform: &str) -> ManifestResult<&'static [&'static str]> {
    let platform = assert_node_platform(platform)?;
    let info = node_platform_info(platform).ok_or_else(|| invalid(Catalog::NodePlatform, platform))?;

    if info.llvm.is_empty() {
        return Err(ManifestError::CatalogInconsistency(format!(
            "platform {platform} has no Rust targets"
        )));
    }

    Ok(info.llvm)
}

/// The Node platform a Rust target builds for.
pub fn rust_to_node(target: &str) -> ManifestResult<&'static str> {
    let target = assert_rust_target(target)?;
    let node = RUST_TARGETS
        .iter()
        .find(|(t, _)| *t == target)
        .map(|(_, node)| *node)
        .ok_or_else(|| invalid(Catalog::RustTarget, target))?;

    let round_trips = node_platform_info(node).is_some_and(|info| info.llvm.contains(&target));
    if !round_trips {
        return Err(ManifestError::CatalogInconsistency(format!(
            "{target} maps to {node}, which does not list it"
        )));
    }

    Ok(node)
}

/// Detect the Rust target of the host at runtime.
#[must_use]
pub fn current_target() -> Option<&'static str> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    let musl = cfg!(target_env = "musl");
    let gnu = cfg!(target_env = "gnu");

    let target = match (os, arch) {
        ("macos", "aarch64") => "aarch64-apple-darwin",
        ("macos", "x86_64") => "x86_64-apple-darwin",
        ("ios", "aarch64") => "aarch64-apple-ios",
        ("ios", "x86_64") => "x86_64-apple-ios",
        ("android", "aarch64") => "aarch64-linux-android",
        ("android", "arm") => "armv7-linux-androideabi",
        ("android", "x86") => "i686-linux-android",
        ("android", "x86_64") => "x86_64-linux-android",
        ("windows", "aarch64") => "aarch64-pc-windows-msvc",
        ("windows", "x86") if gnu => "i686-pc-windows-gnu",
        ("windows", "x86") => "i686-pc-windows-msvc",
        ("windows", "x86_64") if gnu => "x86_64-pc-windows-gnu",
        ("windows", "x86_64") => "x86_64-pc-windows-msvc",
        ("linux", "aarch64") if musl => "aarch64-unknown-linux-musl",
        ("linux", "aarch64") => "aarch64-unknown-linux-gnu",
        ("linux", "arm") if musl => "armv7-unknown-linux-musleabihf",
        ("linux", "arm") => "armv7-unknown-linux-gnueabihf",
        ("linux", "x86") if musl => "i686-unknown-linux-musl",
        ("linux", "x86") => "i686-unknown-linux-gnu",
        ("linux", "x86_64") if musl => "x86_64-unknown-linux-musl",
        ("linux", "x86_64") => "x86_64-unknown-linux-gnu",
        ("linux", "riscv64") => "riscv64gc-unknown-linux-gnu",
        ("linux", "s390x") => "s390x-unknown-linux-gnu",
        ("linux", "powerpc64") if cfg!(target_endian = "little") => "powerpc64le-unknown-linux-gnu",
        ("linux", "powerpc64") => "powerpc64-unknown-linux-gnu",
        ("freebsd", "x86") => "i686-unknown-freebsd",
        ("freebsd", "x86_64") => "x86_64-unknown-freebsd",
        _ => return None,
    };

    Some(target)
}
