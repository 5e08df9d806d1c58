//! Manifests for distributing Neon addons as per-platform npm packages.
//!
//! A Neon library publishes one npm package per platform it supports, each
//! holding a single prebuilt `index.node`, and lists them all as optional
//! dependencies of the library package. This crate models both sides:
//!
//! - [`LibraryManifest`]: the project's own `package.json`, whose `neon`
//!   block names the npm org and the platforms to build for
//! - [`BinaryManifest`]: the `package.json` of one platform package
//!
//! # Library manifest
//!
//! ```json
//! {
//!   "name": "acme",
//!   "version": "1.0.0",
//!   "neon": {
//!     "type": "library",
//!     "org": "@acme",
//!     "platforms": ["common", "mobile"],
//!     "load": "./ts/load.cts"
//!   }
//! }
//! ```
//!
//! `platforms` is a preset name, a list of preset names, or an explicit map
//! from Node platform to Rust target. Manifests written by older tools are
//! upgraded in memory when loaded (see [`schema`]).
//!
//! # Example
//!
//! ```no_run
//! use neon_manifest::{LibraryManifest, PackageManifest};
//!
//! let mut manifest = LibraryManifest::load(".")?;
//! manifest.add_platform_preset("desktop")?;
//!
//! let binary = manifest.manifest_for("x86_64-unknown-linux-gnu")?;
//! assert_eq!(binary.name(), "@acme/linux-x64-gnu");
//! # Ok::<(), neon_manifest::ManifestError>(())
//! ```

mod binary;
mod error;
mod library;
mod manifest;

pub mod family;
pub mod loader;
pub mod platform;
pub mod schema;

pub use binary::BinaryManifest;
pub use error::{Catalog, ManifestError};
pub use family::{
    DeclaredPlatforms, PlatformFamily, PlatformMap, TargetPair, expand_platform_family,
};
pub use library::{ADDON_FILE, INHERITED_FIELDS, LibraryManifest, bundler_shim};
pub use manifest::{MANIFEST_FILE, PackageManifest, Preamble, read_manifest};
pub use schema::{BinaryCfg, LibraryCfg};

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;
