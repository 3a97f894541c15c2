//! Plain-text map layouts.
//!
//! One character per tile, one line per row:
//!
//! | Glyph | Tile |
//! |---|---|
//! | `.` | open land |
//! | `,` | meadow |
//! | `=` | road |
//! | `~` | water |
//! | `b` | bridge (road over water) |
//! | `^` | rock |
//! | `t` | tree |
//! | `E` | elevation |
//! | `/` | access ramp |
//! | `g` | garden |
//! | `r` | rubble |
//! | `A` | aqueduct |
//! | `+` | aqueduct over road |
//! | `W` | wall |
//! | `H` | house |
//! | `O` | reservoir |
//! | `G` | gatehouse |
//! | `T` | wall tower |
//! | `F` | fort |
//! | `w` | warehouse |
//!
//! Blank lines and lines starting with `#` are ignored. Buildings occupy a
//! single tile; [`render`] prints every tile of larger footprints with the
//! building's glyph.

use civitas_core::{BuildingKind, CellCoord, CellRect, Command, TerrainFlags, MAX_MAP_SIZE};
use thiserror::Error;

use crate::{apply, World};

const BUILDING_GLYPHS: [(BuildingKind, char); 6] = [
    (BuildingKind::House, 'H'),
    (BuildingKind::Reservoir, 'O'),
    (BuildingKind::Gatehouse, 'G'),
    (BuildingKind::Tower, 'T'),
    (BuildingKind::Fort, 'F'),
    (BuildingKind::Warehouse, 'w'),
];

/// Checked in order; the first matching set picks the glyph.
const TERRAIN_GLYPHS: [(TerrainFlags, char); 13] = [
    (TerrainFlags::WATER.union(TerrainFlags::ROAD), 'b'),
    (TerrainFlags::WATER, '~'),
    (TerrainFlags::AQUEDUCT.union(TerrainFlags::ROAD), '+'),
    (TerrainFlags::AQUEDUCT, 'A'),
    (TerrainFlags::ROAD, '='),
    (TerrainFlags::WALL, 'W'),
    (TerrainFlags::ROCK, '^'),
    (TerrainFlags::TREE, 't'),
    (TerrainFlags::ELEVATION, 'E'),
    (TerrainFlags::ACCESS_RAMP, '/'),
    (TerrainFlags::GARDEN, 'g'),
    (TerrainFlags::RUBBLE, 'r'),
    (TerrainFlags::MEADOW, ','),
];

/// Failures raised while parsing a layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout contained no rows.
    #[error("layout contains no rows")]
    Empty,
    /// A row differs in width from the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// The layout does not fit inside the grid.
    #[error("layout of {width}x{height} exceeds the {max}x{max} map limit")]
    TooLarge {
        /// Layout width.
        width: u32,
        /// Layout height.
        height: u32,
        /// Largest supported edge.
        max: u32,
    },
    /// A tile used a character outside the legend.
    #[error("unknown tile glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based column.
        column: u32,
        /// Zero-based row.
        row: u32,
    },
}

enum Tile {
    Terrain(TerrainFlags),
    Building(BuildingKind),
}

fn tile_for(glyph: char) -> Option<Tile> {
    let tile = match glyph {
        '.' => Tile::Terrain(TerrainFlags::empty()),
        ',' => Tile::Terrain(TerrainFlags::MEADOW),
        '=' => Tile::Terrain(TerrainFlags::ROAD),
        '~' => Tile::Terrain(TerrainFlags::WATER),
        'b' => Tile::Terrain(TerrainFlags::WATER | TerrainFlags::ROAD),
        '^' => Tile::Terrain(TerrainFlags::ROCK),
        't' => Tile::Terrain(TerrainFlags::TREE),
        'E' => Tile::Terrain(TerrainFlags::ELEVATION),
        '/' => Tile::Terrain(TerrainFlags::ACCESS_RAMP),
        'g' => Tile::Terrain(TerrainFlags::GARDEN),
        'r' => Tile::Terrain(TerrainFlags::RUBBLE),
        'A' => Tile::Terrain(TerrainFlags::AQUEDUCT),
        '+' => Tile::Terrain(TerrainFlags::AQUEDUCT | TerrainFlags::ROAD),
        'W' => Tile::Terrain(TerrainFlags::WALL),
        'H' => Tile::Building(BuildingKind::House),
        'O' => Tile::Building(BuildingKind::Reservoir),
        'G' => Tile::Building(BuildingKind::Gatehouse),
        'T' => Tile::Building(BuildingKind::Tower),
        'F' => Tile::Building(BuildingKind::Fort),
        'w' => Tile::Building(BuildingKind::Warehouse),
        _ => return None,
    };
    Some(tile)
}

/// Builds a world from a text layout.
pub fn parse(layout: &str) -> Result<World, LayoutError> {
    let rows: Vec<&str> = layout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    let Some(first) = rows.first() else {
        return Err(LayoutError::Empty);
    };

    let width = first.chars().count() as u32;
    let height = rows.len() as u32;
    if width > MAX_MAP_SIZE || height > MAX_MAP_SIZE {
        return Err(LayoutError::TooLarge {
            width,
            height,
            max: MAX_MAP_SIZE,
        });
    }

    let mut commands = vec![Command::ConfigureMap { width, height }];
    for (row, line) in rows.iter().enumerate() {
        let row = row as u32;
        let found = line.chars().count() as u32;
        if found != width {
            return Err(LayoutError::RaggedRow {
                row,
                expected: width,
                found,
            });
        }
        for (column, glyph) in line.chars().enumerate() {
            let column = column as u32;
            let cell = CellCoord::new(column, row);
            match tile_for(glyph) {
                Some(Tile::Terrain(flags)) if flags.is_empty() => {}
                Some(Tile::Terrain(flags)) => commands.push(Command::AddTerrain {
                    region: CellRect::single(cell),
                    flags,
                }),
                Some(Tile::Building(kind)) => commands.push(Command::PlaceBuilding {
                    kind,
                    origin: cell,
                    size: 1,
                }),
                None => return Err(LayoutError::UnknownGlyph { glyph, column, row }),
            }
        }
    }

    let mut world = World::new();
    let mut events = Vec::new();
    for command in commands {
        apply(&mut world, command, &mut events);
    }
    tracing::debug!(width, height, events = events.len(), "layout parsed");
    Ok(world)
}

/// Prints the world in the layout format accepted by [`parse`].
#[must_use]
pub fn render(world: &World) -> String {
    let geometry = world.geometry;
    let mut out = String::with_capacity(((geometry.width() + 1) * geometry.height()) as usize);
    for row in 0..geometry.height() {
        for column in 0..geometry.width() {
            let Some(offset) = geometry.offset(CellCoord::new(column, row)) else {
                continue;
            };
            let kind = world.building_ids[offset]
                .and_then(|id| world.buildings.get(id))
                .map(|building| building.kind);
            out.push(glyph_for(world.terrain[offset], kind));
        }
        out.push('\n');
    }
    out
}

fn glyph_for(terrain: TerrainFlags, building: Option<BuildingKind>) -> char {
    if let Some(kind) = building {
        if let Some((_, glyph)) = BUILDING_GLYPHS.iter().find(|(candidate, _)| *candidate == kind) {
            return *glyph;
        }
    }
    TERRAIN_GLYPHS
        .iter()
        .find(|(flags, _)| terrain.contains(*flags))
        .map_or('.', |(_, glyph)| *glyph)
}
