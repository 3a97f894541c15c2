#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Civitas city simulation.
//!
//! This crate defines the grid arithmetic, the terrain classification tiers
//! and the message surface that connects adapters, the authoritative world,
//! and pure systems. Adapters submit [`Command`] values describing desired
//! mutations, the world executes those commands via its `apply` entry point,
//! and then broadcasts [`Event`] values for systems to react to. Systems such
//! as the router read the world exclusively through the collaborator traits
//! declared at the bottom of this crate ([`TerrainView`], [`BuildingView`],
//! [`FigureView`] and [`Clock`]).

use std::{
    ops::{Index, IndexMut},
    time::Duration,
};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of tiles along each edge of the backing grid.
pub const GRID_SIZE: i32 = 162;

/// Number of tiles stored by every [`Grid`].
pub const GRID_CELLS: usize = (GRID_SIZE * GRID_SIZE) as usize;

/// Width of the reserved border that surrounds every map inside the grid.
pub const GRID_BORDER: u32 = 1;

/// Largest map edge that still leaves the reserved border intact.
pub const MAX_MAP_SIZE: u32 = GRID_SIZE as u32 - 2 * GRID_BORDER;

/// Location of a single map tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new map cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Constructs a square rectangle covering `size` cells along each edge.
    #[must_use]
    pub const fn square(origin: CellCoord, size: u32) -> Self {
        Self::from_origin_and_size(origin, CellRectSize::new(size, size))
    }

    /// Constructs a rectangle covering exactly one cell.
    #[must_use]
    pub const fn single(cell: CellCoord) -> Self {
        Self::square(cell, 1)
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Iterates over every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width())
                .map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Linear index of a tile inside the backing grid.
///
/// Offsets are signed so neighbour deltas can be applied without branching;
/// whether an offset addresses a usable tile is decided by
/// [`MapGeometry::is_valid_offset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridOffset(i32);

impl GridOffset {
    /// Wraps a raw linear grid index.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the raw linear index.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Offset of the neighbouring tile in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        Self(self.0 + direction.delta())
    }

    /// Storage index for the offset, if it addresses the backing grid at all.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok().filter(|index| *index < GRID_CELLS)
    }
}

/// Neighbour directions, orthogonal first, then diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing rows.
    North,
    /// Toward increasing columns.
    East,
    /// Toward increasing rows.
    South,
    /// Toward decreasing columns.
    West,
    /// Up and to the right.
    NorthEast,
    /// Down and to the right.
    SouthEast,
    /// Down and to the left.
    SouthWest,
    /// Up and to the left.
    NorthWest,
}

impl Direction {
    /// The four orthogonal directions in expansion order.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// All eight directions in expansion order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Column delta of a single step.
    #[must_use]
    pub const fn dx(self) -> i32 {
        match self {
            Self::North | Self::South => 0,
            Self::East | Self::NorthEast | Self::SouthEast => 1,
            Self::West | Self::SouthWest | Self::NorthWest => -1,
        }
    }

    /// Row delta of a single step.
    #[must_use]
    pub const fn dy(self) -> i32 {
        match self {
            Self::East | Self::West => 0,
            Self::South | Self::SouthEast | Self::SouthWest => 1,
            Self::North | Self::NorthEast | Self::NorthWest => -1,
        }
    }

    /// Linear offset delta of a single step.
    #[must_use]
    pub const fn delta(self) -> i32 {
        self.dy() * GRID_SIZE + self.dx()
    }
}

/// Placement of a `width` x `height` map inside the fixed-size backing grid.
///
/// The map is centred so that at least [`GRID_BORDER`] tiles of reserved
/// border surround it. Border tiles are never valid, which keeps every
/// neighbour delta of an edge tile from wrapping onto the next row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapGeometry {
    width: u32,
    height: u32,
    start_offset: i32,
}

impl MapGeometry {
    /// Creates the geometry for a map, clamping each edge to [`MAX_MAP_SIZE`].
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(MAX_MAP_SIZE);
        let height = height.min(MAX_MAP_SIZE);
        let start_x = (GRID_SIZE - width as i32) / 2;
        let start_y = (GRID_SIZE - height as i32) / 2;
        Self {
            width,
            height,
            start_offset: start_y * GRID_SIZE + start_x,
        }
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies on the map.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Reports whether a `size` x `size` footprint anchored at `origin` fits on the map.
    #[must_use]
    pub fn is_inside(&self, origin: CellCoord, size: u32) -> bool {
        size > 0
            && origin.column().saturating_add(size) <= self.width
            && origin.row().saturating_add(size) <= self.height
    }

    /// Reports whether the cell sits on the outermost ring of the map.
    #[must_use]
    pub fn is_map_edge(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.row() == 0
                || cell.column() + 1 == self.width
                || cell.row() + 1 == self.height)
    }

    /// Linear offset of the cell, or `None` when it lies off the map.
    #[must_use]
    pub fn offset(&self, cell: CellCoord) -> Option<GridOffset> {
        if !self.contains(cell) {
            return None;
        }
        Some(GridOffset(
            self.start_offset + cell.column() as i32 + cell.row() as i32 * GRID_SIZE,
        ))
    }

    /// Map-relative `(x, y)` of an offset. Border tiles yield out-of-range values.
    #[must_use]
    pub const fn coords(&self, offset: GridOffset) -> (i32, i32) {
        let start_x = self.start_offset % GRID_SIZE;
        let start_y = self.start_offset / GRID_SIZE;
        (
            offset.get() % GRID_SIZE - start_x,
            offset.get() / GRID_SIZE - start_y,
        )
    }

    /// Cell addressed by the offset, or `None` for border and out-of-grid offsets.
    #[must_use]
    pub fn cell(&self, offset: GridOffset) -> Option<CellCoord> {
        if !self.is_valid_offset(offset) {
            return None;
        }
        let (x, y) = self.coords(offset);
        Some(CellCoord::new(x as u32, y as u32))
    }

    /// Reports whether the offset addresses a usable map tile.
    #[must_use]
    pub fn is_valid_offset(&self, offset: GridOffset) -> bool {
        if offset.index().is_none() {
            return false;
        }
        let (x, y) = self.coords(offset);
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

impl Default for MapGeometry {
    fn default() -> Self {
        Self::new(MAX_MAP_SIZE, MAX_MAP_SIZE)
    }
}

/// Dense per-tile storage covering the whole backing grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    items: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Creates a grid with every tile set to `T::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::filled(T::default())
    }

    /// Creates a grid with every tile set to `value`.
    #[must_use]
    pub fn filled(value: T) -> Self {
        Self {
            items: vec![value; GRID_CELLS],
        }
    }

    /// Resets every tile to `T::default()`.
    pub fn clear(&mut self) {
        self.items.fill(T::default());
    }

    /// Sets every tile to `value`.
    pub fn fill(&mut self, value: T) {
        self.items.fill(value);
    }

    /// Reads the tile, or `None` when the offset lies outside the grid.
    #[must_use]
    pub fn get(&self, offset: GridOffset) -> Option<T> {
        offset.index().map(|index| self.items[index])
    }

    /// Raw row-major tile storage.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Copy + Default> Default for Grid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<GridOffset> for Grid<T> {
    type Output = T;

    fn index(&self, offset: GridOffset) -> &T {
        &self.items[offset.get() as usize]
    }
}

impl<T> IndexMut<GridOffset> for Grid<T> {
    fn index_mut(&mut self, offset: GridOffset) -> &mut T {
        &mut self.items[offset.get() as usize]
    }
}

bitflags! {
    /// Raw terrain bits stored for a tile. An empty set is open land.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TerrainFlags: u32 {
        /// Trees.
        const TREE = 1 << 0;
        /// Rocks.
        const ROCK = 1 << 1;
        /// Water.
        const WATER = 1 << 2;
        /// Part of a building footprint.
        const BUILDING = 1 << 3;
        /// Shrubs.
        const SHRUB = 1 << 4;
        /// Gardens.
        const GARDEN = 1 << 5;
        /// Roads, including bridges over water.
        const ROAD = 1 << 6;
        /// Within range of a reservoir.
        const RESERVOIR_RANGE = 1 << 7;
        /// Aqueducts.
        const AQUEDUCT = 1 << 8;
        /// Cliffs and raised ground.
        const ELEVATION = 1 << 9;
        /// Ramps leading onto elevation.
        const ACCESS_RAMP = 1 << 10;
        /// Meadow land.
        const MEADOW = 1 << 11;
        /// Rubble left by collapsed buildings.
        const RUBBLE = 1 << 12;
        /// Within range of a fountain.
        const FOUNTAIN_RANGE = 1 << 13;
        /// City walls.
        const WALL = 1 << 14;
        /// Gatehouses cut into walls.
        const GATEHOUSE = 1 << 15;

        /// Anything that prevents building on the tile.
        const NOT_CLEAR = Self::TREE.bits()
            | Self::ROCK.bits()
            | Self::WATER.bits()
            | Self::BUILDING.bits()
            | Self::SHRUB.bits()
            | Self::GARDEN.bits()
            | Self::ROAD.bits()
            | Self::AQUEDUCT.bits()
            | Self::ELEVATION.bits()
            | Self::ACCESS_RAMP.bits()
            | Self::RUBBLE.bits()
            | Self::WALL.bits()
            | Self::GATEHOUSE.bits();

        /// Terrain the player may demolish.
        const CLEARABLE = Self::TREE.bits()
            | Self::SHRUB.bits()
            | Self::GARDEN.bits()
            | Self::ROAD.bits()
            | Self::AQUEDUCT.bits()
            | Self::RUBBLE.bits()
            | Self::WALL.bits()
            | Self::GATEHOUSE.bits()
            | Self::BUILDING.bits();
    }
}

impl Default for TerrainFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Passability of a tile for citizens walking the city.
///
/// Variants are declared in ascending tier order so comparisons such as
/// `class >= CitizenTerrain::Road` follow the numeric tiers.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(i8)]
pub enum CitizenTerrain {
    /// Reservoir tile an aqueduct may connect to.
    ReservoirConnector = -4,
    /// Aqueduct without a road underneath.
    Aqueduct = -3,
    /// Non-empty land.
    #[default]
    Blocked = -1,
    /// Roads and gatehouses.
    Road = 0,
    /// Rubble, gardens and access ramps.
    PassableTerrain = 2,
    /// Open land.
    ClearTerrain = 4,
}

/// Passability of a tile for noncitizens (enemies, animals, traders).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(i8)]
pub enum NoncitizenTerrain {
    /// Water, rocks and cliffs.
    #[default]
    Blocked = -1,
    /// Open land and roads.
    Passable = 0,
    /// Building footprints.
    Building = 1,
    /// Terrain that may be trampled or torn down.
    Clearable = 2,
    /// City walls.
    Wall = 3,
    /// Gatehouses.
    Gatehouse = 4,
    /// Forts.
    Fort = 5,
}

/// Navigability of a tile for boats and flotsam.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(i8)]
pub enum WaterTerrain {
    /// Bridge too low for boats.
    LowBridge = -3,
    /// Water on the map edge; boats are dragged here.
    MapEdge = -2,
    /// Not water.
    #[default]
    Blocked = -1,
    /// Open water.
    Passable = 0,
}

/// Walkability of a tile for figures patrolling the walls.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(i8)]
pub enum WallTerrain {
    /// Not part of the walls.
    #[default]
    Blocked = -1,
    /// Wall segment.
    Passable = 0,
    /// Gatehouse.
    Gatehouse = 1,
    /// Tower.
    Tower = 2,
}

/// Unique identifier assigned to a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Building types the router distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Housing.
    House,
    /// Water reservoir that feeds aqueducts.
    Reservoir,
    /// Gatehouse spanning a wall.
    Gatehouse,
    /// Wall tower.
    Tower,
    /// Military fort.
    Fort,
    /// Storage and any other generic building.
    Warehouse,
}

/// Unique identifier assigned to a figure walking the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FigureId(u32);

impl FigureId {
    /// Creates a new figure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Allegiance of a figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatSide {
    /// The player's own soldiers and citizens.
    Friendly,
    /// Invaders and hostile natives.
    Enemy,
}

/// Linear structures laid out by dragging a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoutedBuilding {
    /// Road segment.
    Road,
    /// City wall segment.
    Wall,
    /// Aqueduct segment.
    Aqueduct,
}

impl RoutedBuilding {
    /// Terrain bit written for every constructed tile.
    #[must_use]
    pub const fn terrain(self) -> TerrainFlags {
        match self {
            Self::Road => TerrainFlags::ROAD,
            Self::Wall => TerrainFlags::WALL,
            Self::Aqueduct => TerrainFlags::AQUEDUCT,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the map with empty land of the provided size.
    ConfigureMap {
        /// Map width in tiles.
        width: u32,
        /// Map height in tiles.
        height: u32,
    },
    /// Sets terrain bits over a region.
    AddTerrain {
        /// Cells receiving the terrain.
        region: CellRect,
        /// Bits to set.
        flags: TerrainFlags,
    },
    /// Clears terrain bits over a region.
    RemoveTerrain {
        /// Cells losing the terrain.
        region: CellRect,
        /// Bits to clear.
        flags: TerrainFlags,
    },
    /// Places a square building.
    PlaceBuilding {
        /// Type of building to construct.
        kind: BuildingKind,
        /// Upper-left cell of the footprint.
        origin: CellCoord,
        /// Edge length of the footprint in tiles.
        size: u32,
    },
    /// Lays a routed structure along a sequence of cells.
    Construct {
        /// Structure to lay.
        kind: RoutedBuilding,
        /// Cells to cover, in drag order.
        cells: Vec<CellCoord>,
    },
    /// Spawns a figure on a tile.
    SpawnFigure {
        /// Tile the figure appears on.
        cell: CellCoord,
        /// Allegiance of the figure.
        side: CombatSide,
    },
    /// Moves an existing figure to another tile.
    MoveFigure {
        /// Figure to move.
        figure: FigureId,
        /// Destination tile.
        cell: CellCoord,
    },
    /// Toggles whether a figure is engaged in melee.
    SetFigureAttacking {
        /// Figure to update.
        figure: FigureId,
        /// Whether the figure is attacking.
        attacking: bool,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the map was replaced.
    MapConfigured {
        /// Map width in tiles.
        width: u32,
        /// Map height in tiles.
        height: u32,
    },
    /// Reports that terrain changed over a region and was reclassified.
    TerrainChanged {
        /// Affected cells.
        region: CellRect,
    },
    /// Confirms that a building was placed.
    BuildingPlaced {
        /// Identifier assigned to the building.
        building: BuildingId,
        /// Type of building placed.
        kind: BuildingKind,
        /// Cells occupied by the building.
        region: CellRect,
    },
    /// Reports that a building placement request was rejected.
    BuildingRejected {
        /// Type of building requested.
        kind: BuildingKind,
        /// Origin provided in the request.
        origin: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a figure was spawned.
    FigureSpawned {
        /// Identifier assigned to the figure.
        figure: FigureId,
        /// Tile the figure occupies.
        cell: CellCoord,
        /// Allegiance of the figure.
        side: CombatSide,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
}

/// Reasons a building placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The footprint extends beyond the map.
    OutOfBounds,
    /// The footprint overlaps terrain that is not clear.
    Occupied,
}

/// Read access to terrain and its per-traveller classification.
pub trait TerrainView {
    /// Placement of the map inside the backing grid.
    fn geometry(&self) -> MapGeometry;

    /// Raw terrain bits of a tile.
    fn terrain(&self, offset: GridOffset) -> TerrainFlags;

    /// Classification for citizens.
    fn citizen(&self, offset: GridOffset) -> CitizenTerrain;

    /// Classification for noncitizens.
    fn noncitizen(&self, offset: GridOffset) -> NoncitizenTerrain;

    /// Classification for boats and flotsam.
    fn water(&self, offset: GridOffset) -> WaterTerrain;

    /// Classification for wall walkers.
    fn walls(&self, offset: GridOffset) -> WallTerrain;
}

/// Read access to buildings and their structural conflict rules.
pub trait BuildingView {
    /// Building covering the tile, if any.
    fn building_at(&self, offset: GridOffset) -> Option<BuildingId>;

    /// Type of a building.
    fn building_kind(&self, building: BuildingId) -> Option<BuildingKind>;

    /// Whether a road may be laid underneath the aqueduct on this tile.
    fn can_place_road_under_aqueduct(&self, offset: GridOffset) -> bool;

    /// Whether an aqueduct may be laid over the road on this tile.
    fn can_place_aqueduct_on_road(&self, offset: GridOffset) -> bool;
}

/// Read access to the figures standing on tiles.
pub trait FigureView {
    /// Whether a figure of `side` on this tile is currently attacking.
    fn has_fighting(&self, offset: GridOffset, side: CombatSide) -> bool;
}

/// Monotonic simulation clock.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// Everything the router reads while answering a query.
pub trait RoutingMap: TerrainView + BuildingView + FigureView + Clock {}

impl<T> RoutingMap for T where T: TerrainView + BuildingView + FigureView + Clock {}

/// Write access used by demolition queries.
pub trait TerrainEditor {
    /// Clears terrain bits on a tile and reclassifies it.
    fn remove_terrain(&mut self, offset: GridOffset, flags: TerrainFlags);
}

#[cfg(test)]
mod tests {
    use super::{
        CellCoord, CellRect, CellRectSize, CitizenTerrain, Direction, Grid, GridOffset,
        MapGeometry, NoncitizenTerrain, PlacementError, TerrainFlags, GRID_SIZE, MAX_MAP_SIZE,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_rect_round_trips_through_bincode() {
        let origin = CellCoord::new(5, 7);
        let size = CellRectSize::new(2, 3);
        let rect = CellRect::from_origin_and_size(origin, size);
        assert_round_trip(&rect);
    }

    #[test]
    fn terrain_flags_and_geometry_round_trip_through_bincode() {
        assert_round_trip(&(TerrainFlags::ROAD | TerrainFlags::AQUEDUCT));
        assert_round_trip(&MapGeometry::new(40, 25));
        assert_round_trip(&PlacementError::Occupied);
    }

    #[test]
    fn offsets_convert_back_to_cells() {
        let geometry = MapGeometry::new(30, 20);
        let cell = CellCoord::new(29, 19);
        let offset = geometry.offset(cell).expect("cell on map");
        assert_eq!(geometry.cell(offset), Some(cell));
        assert_eq!(geometry.coords(offset), (29, 19));
    }

    #[test]
    fn cells_off_the_map_have_no_offset() {
        let geometry = MapGeometry::new(10, 10);
        assert_eq!(geometry.offset(CellCoord::new(10, 0)), None);
        assert_eq!(geometry.offset(CellCoord::new(0, 10)), None);
    }

    #[test]
    fn border_neighbours_are_invalid() {
        let geometry = MapGeometry::new(10, 10);
        let corner = geometry.offset(CellCoord::new(0, 0)).expect("corner");
        assert!(!geometry.is_valid_offset(corner.step(Direction::North)));
        assert!(!geometry.is_valid_offset(corner.step(Direction::West)));
        assert!(!geometry.is_valid_offset(corner.step(Direction::NorthWest)));
        assert!(geometry.is_valid_offset(corner.step(Direction::SouthEast)));

        let right = geometry.offset(CellCoord::new(9, 4)).expect("right edge");
        assert!(!geometry.is_valid_offset(right.step(Direction::East)));
    }

    #[test]
    fn full_size_maps_keep_a_border() {
        let geometry = MapGeometry::new(500, 500);
        assert_eq!(geometry.width(), MAX_MAP_SIZE);
        let corner = geometry.offset(CellCoord::new(0, 0)).expect("corner");
        assert_eq!(corner.get(), GRID_SIZE + 1);
        assert!(!geometry.is_valid_offset(GridOffset::new(0)));
        assert!(!geometry.is_valid_offset(GridOffset::new(-1)));
    }

    #[test]
    fn direction_deltas_match_grid_stride() {
        let deltas: Vec<i32> = Direction::ALL.iter().map(|d| d.delta()).collect();
        assert_eq!(deltas, vec![-162, 1, 162, -1, -161, 163, 161, -163]);
    }

    #[test]
    fn grid_clear_restores_defaults() {
        let mut grid: Grid<i16> = Grid::new();
        let offset = GridOffset::new(500);
        grid[offset] = 7;
        assert_eq!(grid.get(offset), Some(7));
        grid.clear();
        assert!(grid.as_slice().iter().all(|value| *value == 0));
        assert_eq!(grid.get(GridOffset::new(-3)), None);
    }

    #[test]
    fn classification_tiers_are_ordered() {
        assert!(CitizenTerrain::Aqueduct < CitizenTerrain::Road);
        assert!(CitizenTerrain::ClearTerrain > CitizenTerrain::PassableTerrain);
        assert!(NoncitizenTerrain::Wall < NoncitizenTerrain::Fort);
        assert_eq!(CitizenTerrain::ReservoirConnector as i8, -4);
    }

    #[test]
    fn terrain_flags_set_operations() {
        let mut flags = TerrainFlags::ROAD | TerrainFlags::AQUEDUCT;
        assert!(flags.contains(TerrainFlags::ROAD));
        assert!(flags.intersects(TerrainFlags::AQUEDUCT | TerrainFlags::WALL));
        flags.remove(TerrainFlags::CLEARABLE);
        assert!(flags.is_empty());
        assert_eq!(flags, TerrainFlags::default());
    }

    #[test]
    fn terrain_flags_keep_their_bit_positions() {
        assert_eq!(TerrainFlags::ROAD.bits(), 0x40);
        assert_eq!(TerrainFlags::GATEHOUSE.bits(), 0x8000);
        assert!(TerrainFlags::NOT_CLEAR.contains(TerrainFlags::WALL));
        assert!(!TerrainFlags::NOT_CLEAR.intersects(TerrainFlags::MEADOW));
        assert!(!TerrainFlags::CLEARABLE.contains(TerrainFlags::ROCK));

        let bridge = TerrainFlags::WATER | TerrainFlags::ROAD;
        let bytes = bincode::serialize(&bridge).expect("serialize");
        let restored: TerrainFlags = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, bridge);
    }

    #[test]
    fn rect_cells_cover_footprint() {
        let rect = CellRect::square(CellCoord::new(2, 3), 2);
        let cells: Vec<CellCoord> = rect.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(2, 3),
                CellCoord::new(3, 3),
                CellCoord::new(2, 4),
                CellCoord::new(3, 4),
            ]
        );
    }
}
