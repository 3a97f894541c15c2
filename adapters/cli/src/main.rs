#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a city layout and runs route queries on it.

mod render;
mod settings;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use civitas_core::{BuildingId, CellCoord, Event, RoutedBuilding};
use civitas_system_construction::{Construction, ConstructionDrag, ConstructionInput};
use civitas_system_routing::Router;
use civitas_world::{apply, layout, query, World};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::settings::Settings;

/// Route queries against a city layout.
#[derive(Debug, Parser)]
#[command(name = "civitas", version)]
struct Cli {
    /// Text layout of the city map.
    #[arg(long)]
    map: PathBuf,
    /// TOML file overriding the routing limits.
    #[arg(long)]
    config: Option<PathBuf>,
    /// File holding the router's persisted counters; read first, rewritten last.
    #[arg(long)]
    state: Option<PathBuf>,
    #[command(subcommand)]
    query: Query,
}

#[derive(Debug, Subcommand)]
enum Query {
    /// Prints the distance field flooded from a cell.
    Distances {
        /// Source cell as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        from: CellCoord,
        /// Kind of traveller flooding the map.
        #[arg(long, value_enum, default_value_t = Medium::Land)]
        medium: Medium,
    },
    /// Checks whether a traveller can get from one cell to another.
    Travel {
        /// Source cell as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        from: CellCoord,
        /// Destination cell as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        to: CellCoord,
        /// Who is travelling.
        #[arg(long, value_enum, default_value_t = Traveller::Citizen)]
        traveller: Traveller,
        /// Only building an invader may enter.
        #[arg(long)]
        through_building: Option<u32>,
        /// Tiles an invader search may expand before giving up.
        #[arg(long)]
        max_tiles: Option<u32>,
    },
    /// Previews, and optionally lays, a road, aqueduct or wall drag.
    Build {
        /// Structure to lay.
        #[arg(long, value_enum)]
        kind: Structure,
        /// Drag start as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        from: CellCoord,
        /// Drag end as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        to: CellCoord,
        /// Lay the structure and print the resulting map.
        #[arg(long)]
        confirm: bool,
    },
    /// Removes the first wall or aqueduct reachable on foot from a cell.
    Demolish {
        /// Search start as `x,y`.
        #[arg(long, value_parser = parse_cell)]
        from: CellCoord,
    },
    /// Prints the persisted route counters.
    Stats,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Medium {
    Land,
    Boat,
    Flotsam,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Traveller {
    Citizen,
    RoadGarden,
    Walls,
    Invader,
    Everything,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Structure {
    Road,
    Aqueduct,
    Wall,
}

impl From<Structure> for RoutedBuilding {
    fn from(structure: Structure) -> Self {
        match structure {
            Structure::Road => Self::Road,
            Structure::Aqueduct => Self::Aqueduct,
            Structure::Wall => Self::Wall,
        }
    }
}

/// Entry point for the Civitas command-line interface.
fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    let contents = fs::read_to_string(&cli.map)
        .with_context(|| format!("failed to read map layout at {}", cli.map.display()))?;
    let mut world = layout::parse(&contents)
        .with_context(|| format!("failed to parse map layout at {}", cli.map.display()))?;

    let geometry = query::geometry(&world);
    tracing::info!(
        width = geometry.width(),
        height = geometry.height(),
        map = %cli.map.display(),
        "map loaded"
    );

    let mut router = Router::new(settings.routing);
    if let Some(path) = cli.state.as_ref().filter(|path| path.exists()) {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read router state at {}", path.display()))?;
        router
            .load_state(&bytes)
            .with_context(|| format!("failed to restore router state from {}", path.display()))?;
    }

    let output = run(cli.query, &mut router, &mut world);
    print!("{output}");

    if let Some(path) = &cli.state {
        let bytes = router.save_state().context("failed to encode router state")?;
        fs::write(path, bytes)
            .with_context(|| format!("failed to write router state to {}", path.display()))?;
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(request: Query, router: &mut Router, world: &mut World) -> String {
    match request {
        Query::Distances { from, medium } => {
            match medium {
                Medium::Land => router.calculate_distances(&*world, from),
                Medium::Boat => router.calculate_distances_water_boat(&*world, from),
                Medium::Flotsam => router.calculate_distances_water_flotsam(&*world, from),
            }
            render::field(router)
        }
        Query::Travel {
            from,
            to,
            traveller,
            through_building,
            max_tiles,
        } => {
            let reachable = match traveller {
                Traveller::Citizen => router.citizen_can_travel_over_land(&*world, from, to),
                Traveller::RoadGarden => {
                    router.citizen_can_travel_over_road_garden(&*world, from, to)
                }
                Traveller::Walls => router.can_travel_over_walls(&*world, from, to),
                Traveller::Invader => router.noncitizen_can_travel_over_land(
                    &*world,
                    from,
                    to,
                    through_building.map(BuildingId::new),
                    max_tiles,
                ),
                Traveller::Everything => {
                    router.noncitizen_can_travel_through_everything(&*world, from, to)
                }
            };
            format!(
                "reachable: {reachable}\ndistance: {}\n",
                router.distance_at(to)
            )
        }
        Query::Build {
            kind,
            from,
            to,
            confirm,
        } => build(router, world, ConstructionDrag::new(kind.into(), from, to), confirm),
        Query::Demolish { from } => match router.delete_first_wall_or_aqueduct(world, from) {
            Some(cell) => format!(
                "removed: {},{}\n{}",
                cell.column(),
                cell.row(),
                render::terrain(world)
            ),
            None => "removed: nothing\n".to_owned(),
        },
        Query::Stats => {
            let stats = router.stats();
            format!(
                "total routes: {}\nenemy routes: {}\n",
                stats.total_routes_calculated(),
                stats.enemy_routes_calculated()
            )
        }
    }
}

fn build(router: &mut Router, world: &mut World, drag: ConstructionDrag, confirm: bool) -> String {
    let geometry = query::geometry(world);
    let events = [Event::MapConfigured {
        width: geometry.width(),
        height: geometry.height(),
    }];
    let mut construction = Construction::new();
    let mut commands = Vec::new();
    construction.handle(
        &events,
        ConstructionInput {
            drag: Some(drag),
            confirm_action: confirm,
        },
        router,
        &*world,
        &mut commands,
    );

    if commands.is_empty() {
        let preview = construction.preview();
        let placeable = preview.is_some_and(|preview| preview.placeable);
        let length = preview.map_or(0, |preview| preview.cells.len());
        return format!(
            "placeable: {placeable}\nlength: {length}\n{}",
            render::field(router)
        );
    }

    let mut events = Vec::new();
    for command in commands {
        apply(world, command, &mut events);
    }
    router.handle(&events);
    let tiles = events
        .iter()
        .filter(|event| matches!(event, Event::TerrainChanged { .. }))
        .count();
    format!("built: {tiles} tiles\n{}", render::terrain(world))
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, found `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column `{column}`"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row `{row}`"))?;
    Ok(CellCoord::new(column, row))
}
