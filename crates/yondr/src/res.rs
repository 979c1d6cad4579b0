//! # Resources and Packages
//!
//! The loader reads from a [`ResourceManager`]: a set of named packages, each
//! a bundle of resources (schema YAML, scripts, shaders, ...).
//!
//! ```text
//! packages/                      ResourceManager
//! ├── base/                      ├── Package "base"
//! │   ├── world.yaml             │   ├── world     (schema)
//! │   ├── controls.yml           │   ├── controls  (schema)
//! │   └── npc-stats.yaml         │   └── npc_stats (schema)
//! └── forest/                    └── Package "forest"
//!     ├── deps.yaml                  ├── deps      (schema)
//!     ├── world.yaml                 ├── world     (schema)
//!     └── shaders/leaf.frag          └── leaf      (shader)
//! ```
//!
//! Resource and package names are simplified (see [`crate::naming`]), so
//! `NPC-Stats.yaml` is found as `npc_stats`.
//!
//! ## In-Use Flag
//!
//! Each resource carries an in-use flag used for cycle detection while
//! imports are resolved. Loading is single-threaded, so the flag is a plain
//! [`Cell`].

use std::cell::Cell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::naming::simplify;

/// What a resource contains, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Structured YAML read by the deserialization pipeline.
    Schema,
    Script,
    Shader,
    Other,
}

impl ResourceKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => ResourceKind::Schema,
            Some("cs" | "lua" | "rhai" | "rs") => ResourceKind::Script,
            Some("glsl" | "vert" | "frag" | "wgsl" | "hlsl") => ResourceKind::Shader,
            _ => ResourceKind::Other,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Schema => "schema",
            ResourceKind::Script => "script",
            ResourceKind::Shader => "shader",
            ResourceKind::Other => "other",
        })
    }
}

// ── Resource ────────────────────────────────────────────────────────────

/// One file-backed unit of a package.
#[derive(Debug)]
pub struct Resource {
    name: String,
    path: PathBuf,
    kind: ResourceKind,
    bytes: Vec<u8>,
    in_use: Cell<bool>,
}

impl Resource {
    /// A resource named after the file stem of `path`, kind from its extension.
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name: simplify(&stem),
            kind: ResourceKind::from_path(&path),
            path,
            bytes: bytes.into(),
            in_use: Cell::new(false),
        }
    }

    /// An in-memory schema resource, at the virtual path `<name>.yaml`.
    pub fn schema(name: &str, text: &str) -> Self {
        Self::new(format!("{name}.yaml"), text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    pub fn in_use(&self) -> bool {
        self.in_use.get()
    }

    pub fn set_in_use(&self, in_use: bool) {
        self.in_use.set(in_use);
    }
}

// ── Package ─────────────────────────────────────────────────────────────

/// A named bundle of resources.
#[derive(Debug)]
pub struct Package {
    name: String,
    path: PathBuf,
    resources: IndexMap<String, Resource>,
}

impl Package {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: simplify(name),
            path: path.into(),
            resources: IndexMap::new(),
        }
    }

    /// Add a resource, returning the one it replaced (same simplified name).
    pub fn insert(&mut self, resource: Resource) -> Option<Resource> {
        self.resources.insert(resource.name().to_owned(), resource)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.insert(resource);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a resource by name (any spelling).
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(&simplify(name))
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }
}

// ── ResourceManager ─────────────────────────────────────────────────────

/// All packages known to the process, in insertion order.
#[derive(Debug, Default)]
pub struct ResourceManager {
    packages: IndexMap<String, Package>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package, returning the one it replaced (same simplified name).
    pub fn insert(&mut self, package: Package) -> Option<Package> {
        self.packages.insert(package.name().to_owned(), package)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_package(mut self, package: Package) -> Self {
        self.insert(package);
        self
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.get(&simplify(name))
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Read a package directory tree: every sub-directory of `root` is a
    /// package, every file below it (recursively) a resource. Entries are
    /// visited in name order so the result is deterministic.
    pub fn scan(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let mut manager = Self::new();

        for dir in sorted_entries(root)? {
            if !dir.is_dir() {
                continue;
            }
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut package = Package::new(&name, &dir);

            let mut files = Vec::new();
            collect_files(&dir, &mut files)?;
            for file in files {
                let bytes = fs::read(&file)?;
                if let Some(old) = package.insert(Resource::new(&file, bytes)) {
                    log::warn!(
                        "Resource '{}' in package '{}' is shadowed by a later file.",
                        old.path().display(),
                        package.name()
                    );
                }
            }

            log::debug!("Found package '{}' at {}.", package.name(), dir.display());
            if manager.insert(package).is_some() {
                log::warn!("Package '{name}' appears twice under {}.", root.display());
            }
        }

        Ok(manager)
    }
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(ResourceKind::from_path(Path::new("world.yaml")), ResourceKind::Schema);
        assert_eq!(ResourceKind::from_path(Path::new("a/Controls.YML")), ResourceKind::Schema);
        assert_eq!(ResourceKind::from_path(Path::new("ai.lua")), ResourceKind::Script);
        assert_eq!(ResourceKind::from_path(Path::new("leaf.frag")), ResourceKind::Shader);
        assert_eq!(ResourceKind::from_path(Path::new("README")), ResourceKind::Other);
    }

    #[test]
    fn resources_are_found_by_any_spelling() {
        let package = Package::new("Base Game", "mem")
            .with_resource(Resource::schema("NPC-Stats", "health: 1"));

        assert_eq!(package.name(), "base_game");
        let res = package.resource("npcStats").unwrap();
        assert_eq!(res.name(), "npc_stats");
        assert_eq!(res.kind(), ResourceKind::Schema);
        assert_eq!(res.text().unwrap(), "health: 1");
        assert!(!res.in_use());
    }

    #[test]
    fn scan_reads_packages_and_nested_files() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("Base");
        fs::create_dir_all(base.join("shaders")).unwrap();
        fs::write(base.join("world.yaml"), "npc: {}").unwrap();
        fs::write(base.join("shaders/leaf.frag"), "void main() {}").unwrap();
        fs::create_dir_all(root.path().join("forest")).unwrap();
        fs::write(root.path().join("forest/deps.yml"), "- base").unwrap();
        fs::write(root.path().join("stray.txt"), "not a package").unwrap();

        let manager = ResourceManager::scan(root.path()).unwrap();
        let names: Vec<&str> = manager.packages().map(Package::name).collect();
        assert_eq!(names, vec!["base", "forest"]);

        let base = manager.package("base").unwrap();
        assert_eq!(base.resource("world").unwrap().kind(), ResourceKind::Schema);
        assert_eq!(base.resource("leaf").unwrap().kind(), ResourceKind::Shader);
        assert_eq!(manager.package("forest").unwrap().resource("deps").unwrap().bytes(), b"- base");
    }
}
