//! Error types for manifest operations.

use crate::loader::LoaderError;
use std::fmt;
use thiserror::Error;

/// The static catalog an identifier was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    /// Rust target triples.
    RustTarget,
    /// Node platform identifiers.
    NodePlatform,
    /// Named platform presets.
    PlatformPreset,
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RustTarget => "Rust target",
            Self::NodePlatform => "Node platform",
            Self::PlatformPreset => "platform preset",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while loading, upgrading or editing manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A string is not a member of the catalog it was checked against.
    #[error("invalid identifier: '{value}' is not a valid {kind}")]
    InvalidIdentifier { kind: Catalog, value: String },

    /// A manifest property is missing or has the wrong type.
    #[error("malformed manifest: expected {path} to be {expected}")]
    InvalidShape { path: String, expected: String },

    /// A Node platform is implemented by more than one Rust target.
    #[error(
        "ambiguous platform: {platform} can be built by several Rust targets ({}), pick one explicitly",
        .targets.join(", ")
    )]
    AmbiguousPlatform {
        platform: String,
        targets: Vec<String>,
    },

    /// The static catalogs disagree with each other.
    #[error("inconsistent platform catalog: {0}")]
    CatalogInconsistency(String),

    /// A Rust target was requested that the library manifest does not declare.
    #[error("Rust target {0} is not declared in neon.platforms")]
    UndeclaredTarget(String),

    /// A version 1 manifest does not name exactly one npm org.
    #[error("expected exactly one org in neon.targets, found {}", describe_orgs(.0))]
    OrgMismatch(Vec<String>),

    /// A preset refers back to itself.
    #[error("platform preset '{0}' refers to itself")]
    PresetCycle(String),

    /// The loader module could not be updated.
    #[error("cannot update loader {path}: {source}")]
    Loader { path: String, source: LoaderError },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ManifestError {
    pub(crate) fn shape(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidShape {
            path: path.into(),
            expected: expected.into(),
        }
    }
}

fn describe_orgs(orgs: &[String]) -> String {
    if orgs.is_empty() {
        "none".to_string()
    } else {
        orgs.join(", ")
    }
}
