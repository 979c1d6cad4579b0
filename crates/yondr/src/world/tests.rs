use std::fs;

use super::*;
use crate::controls::{Controls, KeyBindings};
use crate::de::DeErrorKind;
use crate::group::{ComponentKind, GroupError};
use crate::property::PropertyError;
use crate::res::{Package, Resource, ResourceManager};
use crate::value::{Value, ValueType, Vec3};

fn package(name: &str, resources: &[(&str, &str)]) -> Package {
    resources
        .iter()
        .fold(Package::new(name, name), |package, (resource, text)| {
            package.with_resource(Resource::schema(resource, text))
        })
}

fn manager(packages: Vec<Package>) -> ResourceManager {
    packages
        .into_iter()
        .fold(ResourceManager::new(), |manager, package| manager.with_package(package))
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn property(world: &World, group: &str, name: &str) -> usize {
    world.group(group).unwrap().registry().with_name(name).unwrap().index()
}

const NPC_WORLD: &str = "
npc:
  components: [spatial]
  properties:
    - { name: health, type: number, default: 10.0 }
    - { name: name, type: text, default: '' }
    - { name: position, type: Vec3, default: [1.0, 2.0, 3.0] }
  bases:
    - ogre: { health: 25.5 }
    - goblin: { name: Grik }
";

// ── World ────────────────────────────────────────────────────────────────

#[test]
fn group_ids_are_dense_and_capped() {
    let mut world = World::new(1000);
    assert_eq!(world.max_groups(), MAX_GROUPS);

    for i in 0..MAX_GROUPS {
        let group = world.get_or_create_group(&format!("group {i}")).unwrap();
        assert_eq!(group.id().index(), i);
    }
    assert_eq!(world.get_or_create_group("Group 7").unwrap().id().index(), 7);

    let err = world.get_or_create_group("one too many").unwrap_err();
    assert!(matches!(err, LoadError::TooManyGroups { limit: 256, .. }), "{err}");
    assert_eq!(world.len(), MAX_GROUPS);
}

#[test]
fn self_entity_ignores_authored_self_base() {
    let mut world = World::default();
    let group = world.get_or_create_group("self").unwrap();
    let hp = group.registry_mut().add("hp", Value::Number(3.0)).unwrap();
    let mut authored = EntityBase::new("self");
    authored.set(hp, Value::Number(99.0));
    group.add_base(authored);

    let entity = world.create_self("self").unwrap();
    assert_eq!(entity.base(), "self");
    assert_eq!(entity.values(), &[Value::Number(3.0)]);
    assert!(world.group("self").unwrap().is_initialized());
}

// ── Loading ──────────────────────────────────────────────────────────────

#[test]
fn ogre_overrides_health_only() {
    let manager = manager(vec![package("base", &[("world", NPC_WORLD)])]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let world = loader.world();
    let npc = world.group("npc").unwrap();
    assert_eq!(npc.registry().count(), 3);
    assert!(npc.has_component(ComponentKind::Spatial));
    assert!(npc.is_initialized());

    let ogre = npc.create_entity(npc.base("ogre").unwrap());
    assert_eq!(ogre.get(property(world, "npc", "health")), Some(&Value::Number(25.5)));
    assert_eq!(ogre.get(property(world, "npc", "name")), Some(&Value::from("")));
    assert_eq!(
        ogre.get(property(world, "npc", "position")),
        Some(&Value::Vec3(Vec3::new(1.0, 2.0, 3.0)))
    );

    let goblin = npc.create_entity(npc.base("goblin").unwrap());
    assert_eq!(goblin.get(property(world, "npc", "health")), Some(&Value::Number(10.0)));
    assert_eq!(goblin.get(property(world, "npc", "name")), Some(&Value::from("Grik")));
}

#[test]
fn dependencies_load_first() {
    let manager = manager(vec![
        package("a", &[("deps", "[b]")]),
        package("b", &[]),
    ]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();
    assert_eq!(report.package_names(), vec!["b", "a"]);
}

#[test]
fn unknown_dependency_only_warns() {
    init_logs();
    let manager = manager(vec![
        package("a", &[("deps", "[b, ghost]"), ("world", "npc: { properties: [{ name: hp, type: number }] }")]),
        package("b", &[]),
    ]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();

    assert_eq!(report.package_names(), vec!["b", "a"]);
    assert_eq!(
        report.warnings,
        vec![LoadWarning::UnknownDependency {
            package: "a".into(),
            dependency: "ghost".into(),
        }]
    );
    assert!(loader.world().group("npc").is_some());
}

#[test]
fn diamond_loads_shared_dependency_once() {
    let shared = "shared: { properties: [{ name: hp, type: number, default: 1 }] }";
    let manager = manager(vec![
        package("top", &[("deps", "[left, right]")]),
        package("left", &[("deps", "[base]")]),
        package("right", &[("deps", "base")]),
        package("base", &[("world", shared)]),
    ]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();

    assert_eq!(report.package_names(), vec!["base", "left", "right", "top"]);
    assert_eq!(loader.world().group("shared").unwrap().registry().count(), 1);
}

#[test]
fn dependency_cycle_terminates() {
    let manager = manager(vec![
        package("a", &[("deps", "[b]")]),
        package("b", &[("deps", "[a]")]),
    ]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();
    assert_eq!(report.package_names(), vec!["b", "a"]);
}

#[test]
fn grid_component_fails_the_load() {
    let manager = manager(vec![package("base", &[("world", "map: { components: [Grid] }")])]);
    let err = PackageLoader::new().load(&manager).unwrap_err();
    match err {
        LoadError::Group { group, source } => {
            assert_eq!(group, "map");
            assert_eq!(source, GroupError::NotImplemented(ComponentKind::Grid));
        }
        other => panic!("expected a group error, got {other}"),
    }
}

#[test]
fn duplicate_property_fails_the_load() {
    let world = "npc:\n  properties:\n    - { name: Health, type: number }\n    - { name: health, type: text }";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let err = PackageLoader::new().load(&manager).unwrap_err();
    assert!(
        matches!(
            &err,
            LoadError::Property { source: PropertyError::Duplicate { index: 0, .. }, .. }
        ),
        "{err}"
    );
}

#[test]
fn bad_default_falls_back_to_zero() {
    init_logs();
    let world = "npc: { properties: [{ name: speed, type: number, default: fast }] }";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();

    assert_eq!(
        report.warnings,
        vec![LoadWarning::BadDefault {
            group: "npc".into(),
            property: "speed".into(),
            value: "fast".into(),
            ty: ValueType::Number,
        }]
    );
    let speed = loader.world().group("npc").unwrap().registry().at(0);
    assert_eq!(speed.value(), &Value::Number(0.0));
}

#[test]
fn bad_overrides_are_skipped_individually() {
    init_logs();
    let world = "
npc:
  properties:
    - { name: health, type: number, default: 10 }
    - { name: name, type: text }
  bases:
    - ogre: { health: lots, armor: 3, name: Grok }
";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();

    assert_eq!(
        report.warnings,
        vec![
            LoadWarning::MistypedOverride {
                group: "npc".into(),
                base: "ogre".into(),
                property: "health".into(),
                value: "lots".into(),
                ty: ValueType::Number,
            },
            LoadWarning::UnknownProperty {
                group: "npc".into(),
                base: "ogre".into(),
                property: "armor".into(),
            },
        ]
    );

    let npc = loader.world().group("npc").unwrap();
    let ogre = npc.base("ogre").unwrap();
    assert_eq!(ogre.len(), 1);
    assert_eq!(ogre.get(1), Some(&Value::from("Grok")));
}

#[test]
fn short_vector_default_fails_the_load() {
    let world = "npc: { properties: [{ name: pos, type: vec3, default: [1.0, 2.0] }] }";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let err = PackageLoader::new().load(&manager).unwrap_err();

    let LoadError::Deserialize { package, source } = &err else {
        panic!("expected a deserialize error, got {err}");
    };
    assert_eq!(package, "base");
    assert!(
        matches!(source.kind(), DeErrorKind::VectorArity { expected: 3, found: 2 }),
        "{err}"
    );
    assert_eq!(source.path(), "npc.properties[0].default");
}

#[test]
fn long_vector_override_fails_the_load() {
    let world = "
npc:
  properties: [{ name: pos, type: vec2 }]
  bases:
    - ogre: { pos: [1, 2, 3] }
";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let err = PackageLoader::new().load(&manager).unwrap_err();

    let LoadError::Deserialize { source, .. } = &err else {
        panic!("expected a deserialize error, got {err}");
    };
    assert!(
        matches!(source.kind(), DeErrorKind::VectorArity { expected: 2, found: 3 }),
        "{err}"
    );
    assert_eq!(source.path(), "npc.bases[0].ogre.pos");
}

#[test]
fn yaml_infinity_is_a_number_default() {
    let world = "npc: { properties: [{ name: reach, type: number, default: .inf }, { name: floor, type: number, default: -.inf }] }";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let npc = loader.world().group("npc").unwrap();
    assert_eq!(npc.registry().at(0).value(), &Value::Number(f64::INFINITY));
    assert_eq!(npc.registry().at(1).value(), &Value::Number(f64::NEG_INFINITY));
}

#[test]
fn later_packages_extend_groups() {
    let manager = manager(vec![
        package("base", &[("world", "npc: { properties: [{ name: hp, type: number }] }")]),
        package(
            "mod",
            &[
                ("deps", "[base]"),
                ("world", "npc: { properties: [{ name: mana, type: number }], bases: [{ mage: { mana: 50 } }] }"),
            ],
        ),
    ]);
    let mut loader = PackageLoader::new();
    loader.load(&manager).unwrap();

    let npc = loader.world().group("npc").unwrap();
    assert_eq!(npc.id().index(), 0);
    assert_eq!(npc.registry().count(), 2);
    let mage = npc.create_entity(npc.base("mage").unwrap());
    assert_eq!(mage.values(), &[Value::Number(0.0), Value::Number(50.0)]);
}

// ── Imports ──────────────────────────────────────────────────────────────

#[test]
fn world_imports_package_resources() {
    let manager = manager(vec![package(
        "base",
        &[
            ("world", "npc: npc.yaml\nitem:\n  properties: item-props\n  bases: [chest.yaml]"),
            ("npc", "properties: [{ name: hp, type: number, default: 5 }]"),
            ("item_props", "- { name: weight, type: number, default: 1 }"),
            ("chest", "chest: { weight: 40 }"),
        ],
    )]);
    let mut loader = PackageLoader::new();
    let report = loader.load(&manager).unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let world = loader.world();
    assert_eq!(world.group("npc").unwrap().registry().count(), 1);
    let item = world.group("item").unwrap();
    let chest = item.create_entity(item.base("chest").unwrap());
    assert_eq!(chest.values(), &[Value::Number(40.0)]);

    for resource in manager.package("base").unwrap().resources() {
        assert!(!resource.in_use(), "{} still in use", resource.name());
    }
}

#[test]
fn importing_a_reserved_resource_is_circular() {
    let manager = manager(vec![package("base", &[("world", "npc: world.yaml")])]);
    let err = PackageLoader::new().load(&manager).unwrap_err();

    let LoadError::Deserialize { package, source } = &err else {
        panic!("expected a deserialize error, got {err}");
    };
    assert_eq!(package, "base");
    assert!(matches!(source.kind(), DeErrorKind::CircularImport { name, .. } if name == "world"));
    assert_eq!(source.path(), "npc");
    assert!(!manager.package("base").unwrap().resource("world").unwrap().in_use());
}

#[test]
fn failed_package_keeps_earlier_ones() {
    let manager = manager(vec![
        package("a", &[("deps", "[b]"), ("world", "npc: { properties: [{ name: hp, type: nmber }] }")]),
        package("b", &[("world", "item: { properties: [{ name: weight, type: number }] }")]),
    ]);
    let mut loader = PackageLoader::new();
    let err = loader.load(&manager).unwrap_err();

    assert!(matches!(&err, LoadError::Deserialize { package, .. } if package == "a"), "{err}");
    assert!(loader.world().group("item").is_some());
    assert!(loader.world().group("npc").is_none());
    assert!(loader.world().self_entity().is_none());
}

// ── Controls and self ────────────────────────────────────────────────────

#[test]
fn controls_are_inverted_into_the_sink() {
    let manager = manager(vec![package("base", &[("controls", "jump: [space, w]\ncrouch: ctrl")])]);
    let mut loader = PackageLoader::new().with_controls(KeyBindings::new());
    loader.load(&manager).unwrap();

    let controls = loader.controls().unwrap();
    assert_eq!(controls.len(), 3);
    assert_eq!(controls.action("space"), Some("jump"));
    assert_eq!(controls.action("w"), Some("jump"));
    assert_eq!(controls.action("ctrl"), Some("crouch"));
}

#[test]
fn controls_are_skipped_without_a_sink() {
    let manager = manager(vec![package("base", &[("controls", "jump: { not: keys }")])]);
    let mut loader = PackageLoader::new();
    assert!(loader.load(&manager).is_ok());
    assert!(loader.controls().is_none());
}

#[test]
fn load_creates_self_entity() {
    let config = LoadConfig::default().with_self_group("Player");
    let world = "player: { properties: [{ name: hp, type: number, default: 100 }] }";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let mut loader = PackageLoader::with_config(config);
    loader.load(&manager).unwrap();

    let world = loader.into_world();
    let me = world.self_entity().unwrap();
    assert_eq!(me.group(), world.group("player").unwrap().id());
    assert_eq!(me.values(), &[Value::Number(100.0)]);
}

#[test]
fn authored_self_base_does_not_reach_self_entity() {
    let world = "self: { properties: [{ name: hp, type: number, default: 1 }], bases: [{ self: { hp: 99 } }] }";
    let manager = manager(vec![package("base", &[("world", world)])]);
    let mut loader = PackageLoader::new();
    loader.load(&manager).unwrap();

    let world = loader.world();
    assert_eq!(world.self_entity().unwrap().values(), &[Value::Number(1.0)]);
    let authored = world.group("self").unwrap().base("self").unwrap();
    assert_eq!(authored.get(0), Some(&Value::Number(99.0)));
}

#[test]
fn group_limit_includes_self() {
    let config = LoadConfig::default().with_max_groups(2);
    let manager = manager(vec![package("base", &[("world", "a: ~\nb: ~")])]);
    let err = PackageLoader::with_config(config).load(&manager).unwrap_err();
    assert!(matches!(&err, LoadError::TooManyGroups { name, limit: 2 } if name == "self"), "{err}");
}

#[test]
fn scanned_directory_loads_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base");
    let mods = dir.path().join("mods");
    fs::create_dir_all(base.join("npcs")).unwrap();
    fs::create_dir_all(&mods).unwrap();
    fs::write(base.join("world.yaml"), "npc: ogre-stats.yaml").unwrap();
    fs::write(
        base.join("npcs/Ogre Stats.yaml"),
        "properties: [{ name: hp, type: number, default: 30 }]",
    )
    .unwrap();
    fs::write(mods.join("deps.yml"), "- base").unwrap();
    fs::write(mods.join("controls.yaml"), "fire: [mouse1]").unwrap();

    let manager = ResourceManager::scan(dir.path()).unwrap();
    let mut loader = PackageLoader::new().with_controls(KeyBindings::new());
    let report = loader.load(&manager).unwrap();

    assert_eq!(report.package_names(), vec!["base", "mods"]);
    assert_eq!(loader.world().group("npc").unwrap().registry().count(), 1);
    assert_eq!(loader.controls().unwrap().action("mouse1"), Some("fire"));
}
