use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use zonal::actor::zone_controller::{Event, HandOffFiles, ZoneController};
use zonal::common::config::{Config, config_file, data_dir};
use zonal::common::log;
use zonal::layout_engine::{LayoutSystem, LayoutSystemKind};
use zonal::model::LayoutType;
use zonal::persistence::{self, MemoryRegistry, PersistenceStore};
use zonal::sys::geometry::Rect;
use zonal::sys::screen::order_monitors;
use zonal::sys::virtual_host::VirtualHost;
use zonal::sys::window::WindowId;

#[derive(Parser)]
#[command(name = "zonal")]
#[command(about = "Zone layouts, zone data migration and drag replay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the zones a built-in layout generates, as JSON
    Layout {
        /// focus, columns, rows, grid or priority-grid
        layout: LayoutType,
        #[arg(long, default_value_t = 3)]
        zone_count: usize,
        #[arg(long)]
        width: i32,
        #[arg(long)]
        height: i32,
        #[arg(long, default_value_t = 0)]
        spacing: i32,
    },
    /// Print monitor indices left to right, top to bottom
    OrderMonitors {
        /// Monitor rects as left,top,right,bottom
        #[arg(required = true, value_parser = parse_rect)]
        rects: Vec<Rect>,
    },
    /// Migrate a legacy registry dump unless zone data already exists
    Migrate {
        /// RON dump of the legacy registry keys
        #[arg(long)]
        registry: PathBuf,
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Write a device hand-off file the way the layout editor does
    PersistZoneSet {
        #[arg(long)]
        work_area: String,
        #[arg(long)]
        layout_id: u16,
        #[arg(long, default_value_t = 0)]
        zone_count: usize,
        /// Zone rect as left,top,right,bottom; repeat per zone
        #[arg(long = "zone", value_parser = parse_rect)]
        zones: Vec<Rect>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        no_spacing: bool,
        #[arg(long, default_value_t = 16)]
        spacing: i32,
        #[arg(long, default_value_t = 3)]
        editor_zone_count: usize,
        /// Zone set uuid; a fresh one when omitted
        #[arg(long)]
        uuid: Option<String>,
    },
    /// Feed a scripted session to the zone controller and print where the
    /// windows ended up
    Replay {
        script: PathBuf,
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Validate the config file
    CheckConfig {
        #[arg(long)]
        path: Option<PathBuf>,
        /// Reset invalid values to their defaults and save
        #[arg(long)]
        fix: bool,
    },
}

/// A scripted session for `replay`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplayScript {
    #[serde(default)]
    config: Config,
    #[serde(default)]
    host: VirtualHost,
    events: Vec<Event>,
}

#[derive(Serialize)]
struct Placement {
    window: WindowId,
    rect: Rect,
    stamp: u64,
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("{s:?}: {e}"))?;
    match parts[..] {
        [left, top, right, bottom] => Ok(Rect::new(left, top, right, bottom)),
        _ => Err(format!("{s:?}: expected left,top,right,bottom")),
    }
}

fn main() {
    let cli = Cli::parse();
    log::init_logging();
    install_panic_hook();

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Layout {
            layout,
            zone_count,
            width,
            height,
            spacing,
        } => {
            let Some(system) = LayoutSystemKind::builtin(layout) else {
                bail!("custom layouts have no generator; pick a built-in layout");
            };
            let rects = system.calculate_zones(Rect::new(0, 0, width, height), zone_count, spacing)?;
            println!("{}", serde_json::to_string_pretty(&rects)?);
        }
        Commands::OrderMonitors { rects } => {
            let mut monitors: Vec<(usize, Rect)> = rects.into_iter().enumerate().collect();
            order_monitors(&mut monitors);
            let order: Vec<usize> = monitors.into_iter().map(|(i, _)| i).collect();
            println!("{}", serde_json::to_string(&order)?);
        }
        Commands::Migrate { registry, root } => {
            let text = std::fs::read_to_string(&registry)
                .with_context(|| format!("reading {}", registry.display()))?;
            let registry = MemoryRegistry::from_ron(&text)?;
            let mut store = PersistenceStore::new(root.unwrap_or_else(data_dir));
            let source = store.load(Some(&registry));
            let data = store.data();
            println!(
                "{source:?}: {} devices, {} custom zone sets, {} apps",
                data.devices.len(),
                data.custom_zone_sets.len(),
                data.app_zone_history.len()
            );
        }
        Commands::PersistZoneSet {
            work_area,
            layout_id,
            zone_count,
            zones,
            out,
            no_spacing,
            spacing,
            editor_zone_count,
            uuid,
        } => {
            let uuid = uuid.unwrap_or_else(|| Uuid::now_v7().to_string());
            let data = persistence::persist_zone_set(
                &work_area,
                layout_id,
                zone_count,
                &zones,
                &out,
                !no_spacing,
                spacing,
                editor_zone_count,
                &uuid,
            )?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Commands::Replay { script, root } => replay(&script, &root.unwrap_or_else(data_dir))?,
        Commands::CheckConfig { path, fix } => check_config(&path.unwrap_or_else(config_file), fix)?,
    }
    Ok(())
}

fn replay(script: &Path, root: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script).with_context(|| format!("reading {}", script.display()))?;
    let script: ReplayScript = ron::from_str(&text)?;
    let issues = script.config.validate();
    if !issues.is_empty() {
        bail!("invalid config in script: {}", issues.join("; "));
    }

    let mut store = PersistenceStore::new(root);
    store.load(None);
    let (controller, events_tx) = ZoneController::new(script.config, script.host, store, HandOffFiles::in_dir(root));
    let count = script.events.len();
    for event in script.events {
        events_tx.send(event);
    }
    drop(events_tx);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let controller = runtime.block_on(controller.run());
    info!(events = count, "replay finished");

    let placements: Vec<Placement> = controller
        .host()
        .windows
        .iter()
        .map(|(window, state)| Placement {
            window: *window,
            rect: state.rect,
            stamp: state.stamp,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&placements)?);
    Ok(())
}

fn check_config(path: &Path, fix: bool) -> anyhow::Result<()> {
    let mut config = Config::read_or_default(path)?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("{}: ok", path.display());
        return Ok(());
    }
    for issue in &issues {
        println!("{issue}");
    }
    if !fix {
        bail!("{} problems in {}", issues.len(), path.display());
    }
    let fixed = config.auto_fix_values();
    config.save(path)?;
    warn!(fixed, path = %path.display(), "reset invalid settings to defaults");
    println!("fixed {fixed} values");
    Ok(())
}

#[cfg(panic = "unwind")]
fn install_panic_hook() {
    // A panic in the controller leaves work areas half-updated; abort instead
    // of unwinding into the runtime.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}

#[cfg(not(panic = "unwind"))]
fn install_panic_hook() {}
