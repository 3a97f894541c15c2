#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative city map state for Civitas.
//!
//! The world owns the raw terrain bits, the four derived classification grids,
//! buildings, figures and the simulation clock. It mutates exclusively through
//! [`apply`] and exposes itself to systems through the collaborator traits from
//! `civitas_core`.

mod buildings;
mod classify;
pub mod layout;

use std::time::Duration;

use civitas_core::{
    BuildingId, BuildingKind, BuildingView, CellCoord, CellRect, CellRectSize, CitizenTerrain,
    Clock, CombatSide, Command, Direction, Event, FigureId, FigureView, Grid, GridOffset,
    MapGeometry, NoncitizenTerrain, PlacementError, TerrainEditor, TerrainFlags, TerrainView,
    WallTerrain, WaterTerrain,
};

use crate::buildings::BuildingRegistry;

const DEFAULT_MAP_WIDTH: u32 = 40;
const DEFAULT_MAP_HEIGHT: u32 = 40;

/// Represents the authoritative city map.
#[derive(Debug)]
pub struct World {
    geometry: MapGeometry,
    terrain: Grid<TerrainFlags>,
    citizen: Grid<CitizenTerrain>,
    noncitizen: Grid<NoncitizenTerrain>,
    water: Grid<WaterTerrain>,
    walls: Grid<WallTerrain>,
    building_ids: Grid<Option<BuildingId>>,
    buildings: BuildingRegistry,
    figures: Vec<Figure>,
    next_figure_id: u32,
    clock: Duration,
}

impl World {
    /// Creates a world with an empty map of the default size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT)
    }

    /// Creates a world with an empty map of the provided size.
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut world = Self {
            geometry: MapGeometry::new(width, height),
            terrain: Grid::new(),
            citizen: Grid::new(),
            noncitizen: Grid::new(),
            water: Grid::new(),
            walls: Grid::new(),
            building_ids: Grid::new(),
            buildings: BuildingRegistry::new(),
            figures: Vec::new(),
            next_figure_id: 0,
            clock: Duration::ZERO,
        };
        world.reclassify_all();
        world
    }

    fn reset_map(&mut self, width: u32, height: u32) {
        let clock = self.clock;
        *self = Self::with_size(width, height);
        self.clock = clock;
    }

    fn reclassify_all(&mut self) {
        let region = CellRect::from_origin_and_size(
            CellCoord::new(0, 0),
            CellRectSize::new(self.geometry.width(), self.geometry.height()),
        );
        self.reclassify(region);
    }

    fn reclassify(&mut self, region: CellRect) {
        for cell in region.cells() {
            let Some(offset) = self.geometry.offset(cell) else {
                continue;
            };
            let terrain = self.terrain[offset];
            let building = self.building_ids[offset].and_then(|id| self.buildings.get(id));
            let kind = building.map(|building| building.kind);
            let connector = building.map_or(false, |building| {
                classify::is_reservoir_connector(building.region, cell)
            });
            self.citizen[offset] = classify::citizen(terrain, kind, connector);
            self.noncitizen[offset] = classify::noncitizen(terrain, kind);
            self.water[offset] = classify::water(terrain, self.geometry.is_map_edge(cell));
            self.walls[offset] = classify::walls(terrain, kind);
        }
    }

    fn edit_terrain(&mut self, region: CellRect, flags: TerrainFlags, add: bool) {
        for cell in region.cells() {
            if let Some(offset) = self.geometry.offset(cell) {
                if add {
                    self.terrain[offset].insert(flags);
                } else {
                    self.terrain[offset].remove(flags);
                    if flags.contains(TerrainFlags::BUILDING) {
                        self.building_ids[offset] = None;
                    }
                }
            }
        }
        self.reclassify(region);
    }

    fn place_building(
        &mut self,
        kind: BuildingKind,
        origin: CellCoord,
        size: u32,
    ) -> Result<(BuildingId, CellRect), PlacementError> {
        if !self.geometry.is_inside(origin, size) {
            return Err(PlacementError::OutOfBounds);
        }
        let region = CellRect::square(origin, size);
        let occupied = region.cells().any(|cell| {
            self.geometry
                .offset(cell)
                .map_or(true, |offset| self.terrain[offset].intersects(TerrainFlags::NOT_CLEAR))
        });
        if occupied {
            return Err(PlacementError::Occupied);
        }

        let id = self.buildings.insert(kind, region);
        let mut flags = TerrainFlags::BUILDING;
        if kind == BuildingKind::Gatehouse {
            flags |= TerrainFlags::GATEHOUSE;
        }
        for cell in region.cells() {
            if let Some(offset) = self.geometry.offset(cell) {
                self.terrain[offset].insert(flags);
                self.building_ids[offset] = Some(id);
            }
        }
        self.reclassify(region);
        Ok((id, region))
    }

    fn figure_mut(&mut self, figure: FigureId) -> Option<&mut Figure> {
        self.figures.iter_mut().find(|candidate| candidate.id == figure)
    }

    /// Reports which orthogonal neighbours of a tile satisfy `predicate`, as
    /// `(horizontal, vertical)` axis hits.
    fn neighbour_axes<F>(&self, offset: GridOffset, mut predicate: F) -> (bool, bool)
    where
        F: FnMut(GridOffset) -> bool,
    {
        let mut hit = |direction: Direction| {
            let next = offset.step(direction);
            self.geometry.is_valid_offset(next) && predicate(next)
        };
        let horizontal = hit(Direction::East) || hit(Direction::West);
        let vertical = hit(Direction::North) || hit(Direction::South);
        (horizontal, vertical)
    }

    fn is_aqueduct_or_reservoir(&self, offset: GridOffset) -> bool {
        self.terrain[offset].contains(TerrainFlags::AQUEDUCT)
            || self.citizen[offset] == CitizenTerrain::ReservoirConnector
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
struct Figure {
    id: FigureId,
    cell: CellCoord,
    side: CombatSide,
    attacking: bool,
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMap { width, height } => {
            world.reset_map(width, height);
            out_events.push(Event::MapConfigured {
                width: world.geometry.width(),
                height: world.geometry.height(),
            });
        }
        Command::AddTerrain { region, flags } => {
            world.edit_terrain(region, flags, true);
            out_events.push(Event::TerrainChanged { region });
        }
        Command::RemoveTerrain { region, flags } => {
            world.edit_terrain(region, flags, false);
            out_events.push(Event::TerrainChanged { region });
        }
        Command::PlaceBuilding { kind, origin, size } => {
            match world.place_building(kind, origin, size) {
                Ok((building, region)) => out_events.push(Event::BuildingPlaced {
                    building,
                    kind,
                    region,
                }),
                Err(reason) => {
                    tracing::debug!(?kind, ?origin, size, ?reason, "building placement rejected");
                    out_events.push(Event::BuildingRejected {
                        kind,
                        origin,
                        reason,
                    });
                }
            }
        }
        Command::Construct { kind, cells } => {
            for cell in cells {
                if !world.geometry.contains(cell) {
                    continue;
                }
                let region = CellRect::single(cell);
                world.edit_terrain(region, kind.terrain(), true);
                out_events.push(Event::TerrainChanged { region });
            }
        }
        Command::SpawnFigure { cell, side } => {
            if !world.geometry.contains(cell) {
                return;
            }
            let figure = FigureId::new(world.next_figure_id);
            world.next_figure_id += 1;
            world.figures.push(Figure {
                id: figure,
                cell,
                side,
                attacking: false,
            });
            out_events.push(Event::FigureSpawned { figure, cell, side });
        }
        Command::MoveFigure { figure, cell } => {
            let on_map = world.geometry.contains(cell);
            if let Some(state) = world.figure_mut(figure) {
                if on_map {
                    state.cell = cell;
                }
            }
        }
        Command::SetFigureAttacking { figure, attacking } => {
            if let Some(state) = world.figure_mut(figure) {
                state.attacking = attacking;
            }
        }
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
    }
}

impl TerrainView for World {
    fn geometry(&self) -> MapGeometry {
        self.geometry
    }

    fn terrain(&self, offset: GridOffset) -> TerrainFlags {
        self.terrain[offset]
    }

    fn citizen(&self, offset: GridOffset) -> CitizenTerrain {
        self.citizen[offset]
    }

    fn noncitizen(&self, offset: GridOffset) -> NoncitizenTerrain {
        self.noncitizen[offset]
    }

    fn water(&self, offset: GridOffset) -> WaterTerrain {
        self.water[offset]
    }

    fn walls(&self, offset: GridOffset) -> WallTerrain {
        self.walls[offset]
    }
}

impl BuildingView for World {
    fn building_at(&self, offset: GridOffset) -> Option<BuildingId> {
        self.building_ids[offset]
    }

    fn building_kind(&self, building: BuildingId) -> Option<BuildingKind> {
        self.buildings.get(building).map(|state| state.kind)
    }

    /// Roads only fit under straight aqueduct runs, never under corners or
    /// junctions.
    fn can_place_road_under_aqueduct(&self, offset: GridOffset) -> bool {
        if !self.terrain[offset].contains(TerrainFlags::AQUEDUCT) {
            return false;
        }
        let (horizontal, vertical) =
            self.neighbour_axes(offset, |next| self.is_aqueduct_or_reservoir(next));
        !(horizontal && vertical)
    }

    /// Aqueducts only cross straight roads, never corners or intersections.
    fn can_place_aqueduct_on_road(&self, offset: GridOffset) -> bool {
        if !self.terrain[offset].contains(TerrainFlags::ROAD) {
            return false;
        }
        if self.terrain[offset].contains(TerrainFlags::WATER) {
            return false;
        }
        let (horizontal, vertical) = self.neighbour_axes(offset, |next| {
            self.terrain[next].contains(TerrainFlags::ROAD)
        });
        !(horizontal && vertical)
    }
}

impl FigureView for World {
    fn has_fighting(&self, offset: GridOffset, side: CombatSide) -> bool {
        let Some(cell) = self.geometry.cell(offset) else {
            return false;
        };
        self.figures
            .iter()
            .any(|figure| figure.cell == cell && figure.side == side && figure.attacking)
    }
}

impl Clock for World {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.clock.as_millis()).unwrap_or(u64::MAX)
    }
}

impl TerrainEditor for World {
    fn remove_terrain(&mut self, offset: GridOffset, flags: TerrainFlags) {
        let Some(cell) = self.geometry.cell(offset) else {
            return;
        };
        self.edit_terrain(CellRect::single(cell), flags, false);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use civitas_core::{
        BuildingId, BuildingKind, CellCoord, CellRect, CitizenTerrain, FigureId, MapGeometry,
        NoncitizenTerrain, TerrainFlags,
    };

    use super::World;

    /// Placement of the map inside the backing grid.
    #[must_use]
    pub fn geometry(world: &World) -> MapGeometry {
        world.geometry
    }

    /// Raw terrain bits of a cell, if it lies on the map.
    #[must_use]
    pub fn terrain_at(world: &World, cell: CellCoord) -> Option<TerrainFlags> {
        world.geometry.offset(cell).map(|offset| world.terrain[offset])
    }

    /// Citizen classification of a cell, if it lies on the map.
    #[must_use]
    pub fn citizen_at(world: &World, cell: CellCoord) -> Option<CitizenTerrain> {
        world.geometry.offset(cell).map(|offset| world.citizen[offset])
    }

    /// Noncitizen classification of a cell, if it lies on the map.
    #[must_use]
    pub fn noncitizen_at(world: &World, cell: CellCoord) -> Option<NoncitizenTerrain> {
        world
            .geometry
            .offset(cell)
            .map(|offset| world.noncitizen[offset])
    }

    /// Building covering a cell, if any.
    #[must_use]
    pub fn building_at(world: &World, cell: CellCoord) -> Option<BuildingId> {
        world
            .geometry
            .offset(cell)
            .and_then(|offset| world.building_ids[offset])
    }

    /// Kind and footprint of every building in identifier order.
    #[must_use]
    pub fn buildings(world: &World) -> Vec<(BuildingId, BuildingKind, CellRect)> {
        world
            .buildings
            .iter()
            .map(|state| (state.id, state.kind, state.region))
            .collect()
    }

    /// Tile a figure stands on.
    #[must_use]
    pub fn figure_cell(world: &World, figure: FigureId) -> Option<CellCoord> {
        world
            .figures
            .iter()
            .find(|candidate| candidate.id == figure)
            .map(|candidate| candidate.cell)
    }
}
