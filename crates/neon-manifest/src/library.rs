//! Library manifests: the project's own `package.json`.
//!
//! [`LibraryManifest`] owns the declarative form of `neon.platforms` (what is
//! written back to disk) and a flat expansion of it that every query runs
//! against. The expansion is recomputed from the declarative form after each
//! change, so the two cannot drift apart.

use crate::binary::BinaryManifest;
use crate::family::{DeclaredPlatforms, PlatformFamily, PlatformMap, TargetPair, expand_preset};
use crate::loader;
use crate::manifest::{self, MANIFEST_FILE, PackageManifest, Preamble};
use crate::platform;
use crate::schema::{self, LibraryCfg};
use crate::{ManifestError, ManifestResult};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Fields copied verbatim from a library manifest into its binary manifests.
pub const INHERITED_FIELDS: &[&str] = &[
    "author",
    "repository",
    "keywords",
    "bugs",
    "homepage",
    "license",
    "engines",
];

/// File name of the prebuilt addon inside a binary package.
pub const ADDON_FILE: &str = "index.node";

/// Manifest of the library package that depends on the binary packages.
#[derive(Debug, Clone)]
pub struct LibraryManifest {
    dir: PathBuf,
    json: Map<String, Value>,
    preamble: Preamble,
    cfg: LibraryCfg,
    expanded: PlatformMap,
    upgraded: bool,
}

impl LibraryManifest {
    /// Build from parsed `package.json` contents located in `dir`, upgrading
    /// older schemas.
    pub fn from_json(dir: impl Into<PathBuf>, json: Value) -> ManifestResult<Self> {
        let mut json = manifest::into_object(json)?;
        let preamble = Preamble::from_json(&json)?;
        let decoded = schema::decode_library(manifest::neon_block(&json)?)?;

        let upgraded = decoded.upgraded();
        if upgraded {
            json.insert("neon".to_string(), decoded.cfg.to_json());
        }

        let expanded = decoded.cfg.platforms.expand()?;

        Ok(Self {
            dir: dir.into(),
            json,
            preamble,
            cfg: decoded.cfg,
            expanded,
            upgraded,
        })
    }

    /// Load `<dir>/package.json`.
    pub fn load(dir: impl Into<PathBuf>) -> ManifestResult<Self> {
        let dir = dir.into();
        let json = manifest::read_manifest(&dir)?;
        Self::from_json(dir, Value::Object(json))
    }

    /// Whether the manifest was read from an older schema.
    #[must_use]
    pub fn upgraded(&self) -> bool {
        self.upgraded
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    #[must_use]
    pub fn cfg(&self) -> &LibraryCfg {
        &self.cfg
    }

    #[must_use]
    pub fn org(&self) -> &str {
        &self.cfg.org
    }

    /// The declarative `neon.platforms` as it is written to disk.
    #[must_use]
    pub fn platforms_source(&self) -> &PlatformFamily {
        &self.cfg.platforms
    }

    /// The flat Node platform → Rust target map.
    #[must_use]
    pub fn platforms(&self) -> &PlatformMap {
        &self.expanded
    }

    /// Write `package.json` back to the manifest's directory.
    pub fn save(&self) -> ManifestResult<()> {
        self.save_to(&self.dir)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// npm package names of every declared platform.
    #[must_use]
    pub fn package_names(&self) -> Vec<String> {
        self.expanded
            .keys()
            .map(|node| self.package_name(node))
            .collect()
    }

    /// npm package name for a declared Rust target.
    #[must_use]
    pub fn package_for(&self, rust: &str) -> Option<String> {
        self.node_for(rust).map(|node| self.package_name(node))
    }

    /// Rust target declared for a Node platform.
    #[must_use]
    pub fn rust_target_for(&self, node: &str) -> Option<&str> {
        self.expanded.get(node).map(String::as_str)
    }

    fn node_for(&self, rust: &str) -> Option<&str> {
        self.expanded
            .iter()
            .find(|(_, target)| *target == rust)
            .map(|(node, _)| node.as_str())
    }

    fn package_name(&self, node: &str) -> String {
        format!("{}/{node}", self.cfg.org)
    }

    /// Derive the binary package manifest for a declared Rust target.
    pub fn manifest_for(&self, rust: &str) -> ManifestResult<BinaryManifest> {
        let rust = platform::assert_rust_target(rust)?;
        let node = self
            .node_for(rust)
            .ok_or_else(|| ManifestError::UndeclaredTarget(rust.to_string()))?;
        let descriptor = platform::target_descriptor(rust)?;

        let mut json = json!({
            "name": self.package_name(node),
            "description": format!("Prebuilt binary package for `{}` on `{node}`.", self.name()),
            "version": self.version(),
            "os": [descriptor.os],
            "cpu": [descriptor.arch],
            "main": ADDON_FILE,
            "files": [ADDON_FILE],
            "neon": {
                "type": "binary",
                "rust": rust,
                "node": node,
                "os": descriptor.os,
                "arch": descriptor.arch,
                "abi": descriptor.abi,
            },
        });
        for key in INHERITED_FIELDS {
            if let Some(value) = self.json.get(*key).filter(|v| !v.is_null()) {
                json[*key] = value.clone();
            }
        }

        BinaryManifest::from_json(json)
    }

    /// Pairs from `platforms` that are absent from, or differ from, the
    /// current expansion.
    #[must_use]
    pub fn filter_new_targets(&self, platforms: &PlatformMap) -> Vec<TargetPair> {
        platforms
            .iter()
            .filter(|(node, rust)| self.expanded.get(*node) != Some(*rust))
            .map(|(node, rust)| TargetPair::new(node.clone(), rust.clone()))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Declare one platform. Returns `None`, without writing anything, if
    /// the pair is already declared.
    pub fn add_target_pair(&mut self, pair: TargetPair) -> ManifestResult<Option<TargetPair>> {
        platform::assert_node_platform(&pair.node)?;
        platform::assert_rust_target(&pair.rust)?;

        let added = self.add_platforms(&PlatformMap::from([(pair.node, pair.rust)]))?;
        Ok(added.into_iter().next())
    }

    /// Declare a Node platform, resolving its Rust target from the catalog.
    /// Fails when several Rust targets build for the platform.
    pub fn add_node_platform(&mut self, node: &str) -> ManifestResult<Option<TargetPair>> {
        let targets = platform::node_to_rust(node)?;
        match targets {
            [rust] => self.add_target_pair(TargetPair::new(node, *rust)),
            _ => Err(ManifestError::AmbiguousPlatform {
                platform: node.to_string(),
                targets: targets.iter().map(|t| (*t).to_string()).collect(),
            }),
        }
    }

    /// Declare a Rust target under its Node platform.
    pub fn add_rust_target(&mut self, rust: &str) -> ManifestResult<Option<TargetPair>> {
        let node = platform::rust_to_node(rust)?;
        self.add_target_pair(TargetPair::new(node, rust))
    }

    /// Declare every new pair of `platforms`, saving and updating the loader
    /// once. Returns the pairs that were added.
    ///
    /// When `neon.platforms` names presets, individual pairs cannot be
    /// expressed there, so the presets are replaced by the explicit map of
    /// everything they expanded to plus the new pairs. Use
    /// [`add_platform_preset`](Self::add_platform_preset) to keep the
    /// declarative form.
    pub fn add_platforms(&mut self, platforms: &PlatformMap) -> ManifestResult<Vec<TargetPair>> {
        let added = self.filter_new_targets(platforms);
        if added.is_empty() {
            return Ok(added);
        }

        let mut source: DeclaredPlatforms = match &self.cfg.platforms {
            PlatformFamily::Map(map) => map.clone(),
            PlatformFamily::Preset(_) | PlatformFamily::Presets(_) => self
                .expanded
                .iter()
                .map(|(node, rust)| (node.clone(), rust.clone()))
                .collect(),
        };
        source.extend(added.iter().map(|p| (p.node.clone(), p.rust.clone())));

        self.commit(PlatformFamily::Map(source), &added)?;
        Ok(added)
    }

    /// Reference a preset from `neon.platforms` and declare its platforms.
    pub fn add_platform_preset(&mut self, preset: &str) -> ManifestResult<Vec<TargetPair>> {
        let preset = platform::assert_platform_preset(preset)?;
        let expansion = expand_preset(preset)?;
        let added = self.filter_new_targets(&expansion);
        if added.is_empty() {
            return Ok(added);
        }

        let source = match &self.cfg.platforms {
            PlatformFamily::Preset(existing) => {
                PlatformFamily::Presets(vec![existing.clone(), preset.to_string()])
            }
            PlatformFamily::Presets(existing) => {
                let mut names = existing.clone();
                names.push(preset.to_string());
                PlatformFamily::Presets(names)
            }
            PlatformFamily::Map(map) if map.is_empty() => {
                PlatformFamily::Presets(vec![preset.to_string()])
            }
            PlatformFamily::Map(map) => {
                let mut map = map.clone();
                map.extend(expansion);
                PlatformFamily::Map(map)
            }
        };

        self.commit(source, &added)?;
        Ok(added)
    }

    /// Replace the declarative platforms, refresh the expansion, persist, and
    /// regenerate the loader for the newly added platforms. The loader is
    /// rewritten in memory first, so a loader that cannot be scanned leaves
    /// both files and this manifest untouched.
    fn commit(&mut self, source: PlatformFamily, added: &[TargetPair]) -> ManifestResult<()> {
        let expanded = source.expand()?;
        let nodes: Vec<String> = added.iter().map(|p| p.node.clone()).collect();
        let loader = self.render_loader(&nodes)?;

        self.expanded = expanded;
        self.cfg.platforms = source;
        self.sync_neon();
        self.save()?;

        if let Some((path, text)) = loader {
            fs::write(path, text)?;
        }
        Ok(())
    }

    fn sync_neon(&mut self) {
        let current = self.cfg.to_json();
        match self.json.get_mut("neon").and_then(Value::as_object_mut) {
            Some(neon) => {
                if let Value::Object(fields) = current {
                    neon.extend(fields);
                }
            }
            None => {
                self.json.insert("neon".to_string(), current);
            }
        }
    }

    /// Add a lazy `require` for each platform to the loader module, if the
    /// manifest names one in `neon.load`.
    pub fn update_loader(&self, platforms: &[String]) -> ManifestResult<()> {
        if let Some((path, text)) = self.render_loader(platforms)? {
            fs::write(path, text)?;
        }
        Ok(())
    }

    /// The loader path and its new contents, or `None` when there is no
    /// loader or it already lists every platform.
    fn render_loader(&self, platforms: &[String]) -> ManifestResult<Option<(PathBuf, String)>> {
        let Some(load) = &self.cfg.load else {
            return Ok(None);
        };

        let path = self.dir.join(load);
        let source = fs::read_to_string(&path)?;
        let updated = loader::insert_platform_loaders(&source, &self.cfg.org, platforms)
            .map_err(|source| ManifestError::Loader {
                path: path.display().to_string(),
                source,
            })?;

        Ok((updated != source).then_some((path, updated)))
    }

    /// Make every platform package an optional dependency at this library's
    /// version, leaving existing entries alone, and save. With `bundle`, also
    /// write a module that lists every package statically for bundlers.
    pub fn update_targets(
        &mut self,
        mut log: impl FnMut(&str),
        bundle: Option<&Path>,
    ) -> ManifestResult<()> {
        let version = self.preamble.version.clone();
        let packages = self.package_names();

        let deps = self
            .json
            .entry("optionalDependencies")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| ManifestError::shape("optionalDependencies", "an object"))?;

        for package in &packages {
            if !deps.contains_key(package) {
                log(&format!("adding {package}@{version} to optionalDependencies"));
                deps.insert(package.clone(), Value::String(version.clone()));
            }
        }

        self.save()?;
        log(&format!("updated {}", self.manifest_path().display()));

        if let Some(bundle) = bundle {
            let path = self.dir.join(bundle);
            fs::write(&path, bundler_shim(&packages))?;
            log(&format!("generated {}", path.display()));
        }

        Ok(())
    }
}

impl PackageManifest for LibraryManifest {
    fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    fn to_json(&self) -> Value {
        Value::Object(self.json.clone())
    }
}

/// Module source that `require`s every package inside dead code, so bundlers
/// with static analysis include the optional binary packages.
#[must_use]
pub fn bundler_shim(packages: &[String]) -> String {
    let mut text = String::from(
        "// AUTOMATICALLY GENERATED FILE. DO NOT EDIT.\n\
         //\n\
         // This code is never executed but is detected by the static analysis of\n\
         // bundlers such as `@vercel/ncc`. The require() expression that selects\n\
         // the right binary module for the current platform is too dynamic to be\n\
         // analyzable by bundler analyses, so this module provides an exhaustive\n\
         // static list for those analyses.\n\
         \n\
         if (0) {\n",
    );
    for package in packages {
        text.push_str(&format!("  require('{package}');\n"));
    }
    text.push_str("}\n");
    text
}
