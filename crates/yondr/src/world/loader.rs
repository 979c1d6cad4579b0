//! # Package Loading
//!
//! Packages are folders of resources. Three schema resources per package are
//! reserved and read by the loader itself:
//!
//! ```text
//! package "town"
//!  ├─ deps.yaml       [base, monsters]        packages to load first
//!  ├─ world.yaml      npc: { properties, bases, components }
//!  ├─ controls.yaml   jump: [space, w]        action → keys
//!  └─ npcs.yaml, ...  anything world.yaml imports
//! ```
//!
//! ```text
//! load(manager)
//!   │
//!   ├─ reserve deps/world/controls of every package (in-use for the whole load)
//!   ├─ for each package, depth first:
//!   │     deps ──► load each dependency ──► world ──► controls ──► finished
//!   ├─ init every group
//!   └─ create the self entity
//! ```
//!
//! A package is marked loaded when it is entered, so diamonds load once and
//! dependency cycles stop at the first repeat. Unknown dependencies, bad
//! defaults and bad overrides are [`LoadWarning`]s; everything else stops the
//! load with a [`LoadError`]. A vector value authored with the wrong number of
//! components is not a bad default but a deserialize error.

use std::fmt;

use indexmap::IndexMap;

use super::World;
use super::schema::{ControlsDef, GroupDef, WorldDef};
use crate::controls::{Controls, KeyBindings};
use crate::de::{DeError, DeErrorKind, Pipeline, ResolveContext, Schema};
use crate::entity::EntityBase;
use crate::error::LoadError;
use crate::naming::simplify;
use crate::res::{Package, Resource, ResourceKind, ResourceManager};
use crate::value::{Literal, Value, ValueType};

// ── Configuration ───────────────────────────────────────────────────────

/// Names the loader treats specially.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    /// Resource listing a package's dependencies.
    pub deps: String,
    /// Resource defining groups.
    pub world: String,
    /// Resource defining control bindings.
    pub controls: String,
    /// Group holding the implicit self entity.
    pub self_group: String,
    pub max_groups: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            deps: "deps".into(),
            world: "world".into(),
            controls: "controls".into(),
            self_group: "self".into(),
            max_groups: super::MAX_GROUPS,
        }
    }
}

impl LoadConfig {
    pub fn with_deps(mut self, name: &str) -> Self {
        self.deps = name.to_owned();
        self
    }

    pub fn with_world(mut self, name: &str) -> Self {
        self.world = name.to_owned();
        self
    }

    pub fn with_controls(mut self, name: &str) -> Self {
        self.controls = name.to_owned();
        self
    }

    pub fn with_self_group(mut self, name: &str) -> Self {
        self.self_group = name.to_owned();
        self
    }

    /// Capped at 256.
    pub fn with_max_groups(mut self, max_groups: usize) -> Self {
        self.max_groups = max_groups;
        self
    }
}

// ── Report ──────────────────────────────────────────────────────────────

/// A problem that did not stop the load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    UnknownDependency {
        package: String,
        dependency: String,
    },
    /// The default could not be parsed; the type's zero value is used.
    BadDefault {
        group: String,
        property: String,
        value: String,
        ty: ValueType,
    },
    /// A base overrides a property the group does not have.
    UnknownProperty {
        group: String,
        base: String,
        property: String,
    },
    /// A base override could not be parsed as the property's type.
    MistypedOverride {
        group: String,
        base: String,
        property: String,
        value: String,
        ty: ValueType,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::UnknownDependency { package, dependency } => {
                write!(f, "package '{package}' depends on unknown package '{dependency}'")
            }
            LoadWarning::BadDefault { group, property, value, ty } => write!(
                f,
                "group '{group}': default '{value}' of property '{property}' is not a valid {ty}, using the zero value"
            ),
            LoadWarning::UnknownProperty { group, base, property } => {
                write!(f, "group '{group}': base '{base}' overrides unknown property '{property}'")
            }
            LoadWarning::MistypedOverride { group, base, property, value, ty } => write!(
                f,
                "group '{group}': base '{base}' sets property '{property}' to '{value}', which is not a valid {ty}"
            ),
        }
    }
}

/// Result of a successful [`PackageLoader::load`].
#[derive(Debug, Default)]
pub struct LoadReport<'m> {
    /// Packages in the order they finished loading; dependencies come first.
    pub packages: Vec<&'m Package>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport<'_> {
    pub fn package_names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name()).collect()
    }

    fn warn(&mut self, warning: LoadWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }
}

// ── Bookkeeping ─────────────────────────────────────────────────────────

/// Per-load state of one package.
#[derive(Clone, Copy)]
struct PackageEntry<'m> {
    package: &'m Package,
    deps: Option<&'m Resource>,
    world: Option<&'m Resource>,
    controls: Option<&'m Resource>,
    loaded: bool,
}

impl<'m> PackageEntry<'m> {
    fn scan(package: &'m Package, config: &LoadConfig) -> Self {
        let reserved = |name: &str| {
            package
                .resource(name)
                .filter(|r| r.kind() == ResourceKind::Schema)
        };
        Self {
            package,
            deps: reserved(&config.deps),
            world: reserved(&config.world),
            controls: reserved(&config.controls),
            loaded: false,
        }
    }

    fn reserved(self) -> impl Iterator<Item = &'m Resource> {
        [self.deps, self.world, self.controls].into_iter().flatten()
    }
}

/// Keeps the reserved resources in use until the load returns.
struct Reservation<'m> {
    resources: Vec<&'m Resource>,
}

impl<'m> Reservation<'m> {
    fn acquire(resources: impl IntoIterator<Item = &'m Resource>) -> Self {
        let resources: Vec<_> = resources.into_iter().collect();
        for resource in &resources {
            resource.set_in_use(true);
        }
        Self { resources }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        for resource in &self.resources {
            resource.set_in_use(false);
        }
    }
}

struct LoadRun<'m> {
    entries: IndexMap<String, PackageEntry<'m>>,
    report: LoadReport<'m>,
}

// ── PackageLoader ───────────────────────────────────────────────────────

/// Loads packages into a [`World`], feeding control bindings to `C`.
pub struct PackageLoader<C = KeyBindings> {
    config: LoadConfig,
    pipeline: Pipeline,
    world: World,
    controls: Option<C>,
}

impl PackageLoader<KeyBindings> {
    pub fn new() -> Self {
        Self::with_config(LoadConfig::default())
    }

    /// A loader without a controls sink; controls resources are skipped
    /// until one is installed with [`with_controls`](Self::with_controls).
    pub fn with_config(config: LoadConfig) -> Self {
        Self {
            world: World::new(config.max_groups),
            config,
            pipeline: Pipeline::standard(),
            controls: None,
        }
    }
}

impl Default for PackageLoader<KeyBindings> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PackageLoader<C> {
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Install the sink that receives `(key, action)` bindings.
    pub fn with_controls<D: Controls>(self, controls: D) -> PackageLoader<D> {
        PackageLoader {
            config: self.config,
            pipeline: self.pipeline,
            world: self.world,
            controls: Some(controls),
        }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn controls(&self) -> Option<&C> {
        self.controls.as_ref()
    }
}

impl<C: Controls> PackageLoader<C> {
    /// Load every package of `manager` into the world.
    ///
    /// On error, groups and packages processed before the failure stay in the
    /// world, but groups are not initialized and no self entity is created.
    pub fn load<'m>(&mut self, manager: &'m ResourceManager) -> Result<LoadReport<'m>, LoadError> {
        let mut run = LoadRun {
            entries: manager
                .packages()
                .map(|p| (p.name().to_owned(), PackageEntry::scan(p, &self.config)))
                .collect(),
            report: LoadReport::default(),
        };
        let _reservation = Reservation::acquire(run.entries.values().flat_map(|e| e.reserved()));

        log::info!("Loading {} packages.", run.entries.len());
        let names: Vec<String> = run.entries.keys().cloned().collect();
        for name in &names {
            self.load_package(name, &mut run)?;
        }

        self.world.init_groups();
        self.world.create_self(&self.config.self_group)?;
        log::info!(
            "Loaded {} packages into {} groups ({} warnings).",
            run.report.packages.len(),
            self.world.len(),
            run.report.warnings.len()
        );
        Ok(run.report)
    }

    fn load_package<'m>(&mut self, name: &str, run: &mut LoadRun<'m>) -> Result<(), LoadError> {
        let entry = match run.entries.get_mut(name) {
            Some(entry) if !entry.loaded => {
                entry.loaded = true;
                *entry
            }
            _ => return Ok(()),
        };
        let package = entry.package;
        let mut cx = ResolveContext::new(package);

        if let Some(resource) = entry.deps {
            let deps: Vec<String> = self.read(&mut cx, package, resource)?;
            for dependency in deps {
                let key = simplify(&dependency);
                if run.entries.contains_key(&key) {
                    self.load_package(&key, run)?;
                } else {
                    run.report.warn(LoadWarning::UnknownDependency {
                        package: package.name().to_owned(),
                        dependency,
                    });
                }
            }
        }

        if let Some(resource) = entry.world {
            let world: WorldDef = self.read(&mut cx, package, resource)?;
            for (group, def) in world {
                self.apply_group(package, resource, &group, def, &mut run.report)?;
            }
        }

        if let Some(resource) = entry.controls {
            if self.controls.is_some() {
                let controls: ControlsDef = self.read(&mut cx, package, resource)?;
                self.bind_controls(&controls);
            } else {
                log::debug!("No controls sink, skipping {}.", resource.path().display());
            }
        }

        log::info!("Loaded package '{}'.", package.name());
        run.report.packages.push(package);
        Ok(())
    }

    fn read<T: Schema>(
        &self,
        cx: &mut ResolveContext<'_>,
        package: &Package,
        resource: &Resource,
    ) -> Result<T, LoadError> {
        log::info!("Reading {} from '{}'.", resource.path().display(), package.name());
        self.pipeline
            .deserialize_resource(cx, resource)
            .map_err(|source| LoadError::Deserialize {
                package: package.name().to_owned(),
                source,
            })
    }

    fn apply_group(
        &mut self,
        package: &Package,
        resource: &Resource,
        name: &str,
        def: GroupDef,
        report: &mut LoadReport<'_>,
    ) -> Result<(), LoadError> {
        let arity_error = |path: String, kind: DeErrorKind| LoadError::Deserialize {
            package: package.name().to_owned(),
            source: DeError::new(resource, path, kind),
        };
        let group = self.world.get_or_create_group(name)?;
        let group_name = group.name().to_owned();

        for (i, property) in def.properties.into_iter().enumerate() {
            let default = match &property.default {
                None => property.ty.zero(),
                Some(literal) => {
                    if let Some(kind) = arity_mismatch(property.ty, literal) {
                        return Err(arity_error(format!("{name}.properties[{i}].default"), kind));
                    }
                    match Value::from_literal(property.ty, literal) {
                        Some(value) => value,
                        None => {
                            report.warn(LoadWarning::BadDefault {
                                group: group_name.clone(),
                                property: property.name.clone(),
                                value: literal.to_string(),
                                ty: property.ty,
                            });
                            property.ty.zero()
                        }
                    }
                }
            };
            group
                .registry_mut()
                .add(&property.name, default)
                .map_err(|source| LoadError::Property {
                    group: group_name.clone(),
                    source,
                })?;
        }

        for (j, entry) in def.bases.into_iter().enumerate() {
            for (base_name, overrides) in entry {
                let mut base = EntityBase::new(&base_name);
                for (property_name, literal) in overrides {
                    let Some(property) = group.registry().with_name(&property_name) else {
                        report.warn(LoadWarning::UnknownProperty {
                            group: group_name.clone(),
                            base: base.name().to_owned(),
                            property: property_name,
                        });
                        continue;
                    };
                    if let Some(kind) = literal.as_ref().and_then(|l| arity_mismatch(property.ty(), l)) {
                        let path = format!("{name}.bases[{j}].{base_name}.{property_name}");
                        return Err(arity_error(path, kind));
                    }
                    match literal.as_ref().and_then(|l| Value::from_literal(property.ty(), l)) {
                        Some(value) => {
                            base.set(property.index(), value);
                        }
                        None => report.warn(LoadWarning::MistypedOverride {
                            group: group_name.clone(),
                            base: base.name().to_owned(),
                            property: property.name().to_owned(),
                            value: literal.map(|l| l.to_string()).unwrap_or_default(),
                            ty: property.ty(),
                        }),
                    }
                }
                group.add_base(base);
            }
        }

        for kind in def.components {
            group.add_component(kind).map_err(|source| LoadError::Group {
                group: group_name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn bind_controls(&mut self, controls: &ControlsDef) {
        let Some(sink) = self.controls.as_mut() else {
            return;
        };
        for (action, keys) in controls {
            for key in keys {
                sink.bind(key, action);
            }
        }
    }
}

/// A component list authored for a vector type must have exactly its arity.
fn arity_mismatch(ty: ValueType, literal: &Literal) -> Option<DeErrorKind> {
    match (ty.arity(), literal) {
        (Some(expected), Literal::Components(components)) if components.len() != expected => {
            Some(DeErrorKind::VectorArity {
                expected,
                found: components.len(),
            })
        }
        _ => None,
    }
}
