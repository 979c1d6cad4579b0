//! yondr-inspect: load a package directory and print what it defines.
//!
//! Every sub-directory of `DIR` is a package. The tool runs the full loader
//! over them and prints the load order, each group's properties, bases and
//! components, the control bindings, and any warnings.
//!
//! ```text
//! yondr-inspect assets/packages
//! yondr-inspect assets/packages --json | jq '.groups[].name'
//! RUST_LOG=debug yondr-inspect assets/packages
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use yondr::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "yondr-inspect")]
#[command(about = "Load yondr packages and summarize the resulting world")]
struct Args {
    /// Directory whose sub-directories are packages
    #[arg(value_name = "DIR")]
    root: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Group that holds the self entity
    #[arg(long, value_name = "NAME", default_value = "self")]
    self_group: String,

    /// Maximum number of groups (at most 256)
    #[arg(long, value_name = "N", default_value_t = 256)]
    max_groups: usize,
}

// ── Summary ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct WorldSummary {
    packages: Vec<String>,
    groups: Vec<GroupSummary>,
    controls: Vec<BindingSummary>,
    self_entity: Option<Vec<String>>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct GroupSummary {
    id: usize,
    name: String,
    components: Vec<String>,
    properties: Vec<PropertySummary>,
    bases: Vec<BaseSummary>,
}

#[derive(Serialize)]
struct PropertySummary {
    index: usize,
    name: String,
    display_name: String,
    #[serde(rename = "type")]
    ty: String,
    default: String,
}

#[derive(Serialize)]
struct BaseSummary {
    name: String,
    overrides: Vec<OverrideSummary>,
}

#[derive(Serialize)]
struct OverrideSummary {
    property: String,
    value: String,
}

#[derive(Serialize)]
struct BindingSummary {
    key: String,
    action: String,
}

impl WorldSummary {
    fn new(report: &LoadReport<'_>, world: &World, controls: Option<&KeyBindings>) -> Self {
        Self {
            packages: report.package_names().into_iter().map(str::to_owned).collect(),
            groups: world.groups().map(GroupSummary::new).collect(),
            controls: controls
                .into_iter()
                .flat_map(|c| c.iter())
                .map(|(key, action)| BindingSummary {
                    key: key.to_owned(),
                    action: action.to_owned(),
                })
                .collect(),
            self_entity: world
                .self_entity()
                .map(|e| e.values().iter().map(Value::to_string).collect()),
            warnings: report.warnings.iter().map(LoadWarning::to_string).collect(),
        }
    }

    fn print(&self) {
        println!("Load order: {}", self.packages.join(" -> "));
        for group in &self.groups {
            println!();
            println!("[{}] {}", group.id, group.name);
            if !group.components.is_empty() {
                println!("  components: {}", group.components.join(", "));
            }
            for p in &group.properties {
                println!("  {:>3}  {:<20} {:<8} = {}", p.index, p.name, p.ty, p.default);
            }
            for base in &group.bases {
                let overrides: Vec<String> = base
                    .overrides
                    .iter()
                    .map(|o| format!("{} = {}", o.property, o.value))
                    .collect();
                println!("  base {}: {{{}}}", base.name, overrides.join(", "));
            }
        }
        if !self.controls.is_empty() {
            println!();
            println!("Controls:");
            for binding in &self.controls {
                println!("  {:<12} -> {}", binding.key, binding.action);
            }
        }
        if let Some(values) = &self.self_entity {
            println!();
            println!("Self entity: [{}]", values.join(", "));
        }
        if !self.warnings.is_empty() {
            println!();
            println!("{} warnings:", self.warnings.len());
            for warning in &self.warnings {
                println!("  {warning}");
            }
        }
    }
}

impl GroupSummary {
    fn new(group: &EntityGroup) -> Self {
        let registry = group.registry();
        Self {
            id: group.id().index(),
            name: group.name().to_owned(),
            components: group.components().map(|c| c.kind().to_string()).collect(),
            properties: registry
                .iter()
                .map(|p| PropertySummary {
                    index: p.index(),
                    name: p.name().to_owned(),
                    display_name: p.display_name().to_owned(),
                    ty: p.ty().to_string(),
                    default: p.value().to_string(),
                })
                .collect(),
            bases: group
                .bases()
                .map(|base| BaseSummary {
                    name: base.name().to_owned(),
                    overrides: base
                        .iter()
                        .map(|(index, value)| OverrideSummary {
                            property: registry.at(index).name().to_owned(),
                            value: value.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let manager = match ResourceManager::scan(&args.root) {
        Ok(manager) => manager,
        Err(e) => {
            log::error!("Cannot read {}: {e}", args.root.display());
            return ExitCode::FAILURE;
        }
    };
    if manager.is_empty() {
        log::warn!("No packages under {}.", args.root.display());
    }

    let config = LoadConfig::default()
        .with_self_group(&args.self_group)
        .with_max_groups(args.max_groups);
    let mut loader = PackageLoader::with_config(config).with_controls(KeyBindings::new());

    let report = match loader.load(&manager) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Load failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let summary = WorldSummary::new(&report, loader.world(), loader.controls());
    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                log::error!("Cannot serialize summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        summary.print();
    }
    ExitCode::SUCCESS
}
