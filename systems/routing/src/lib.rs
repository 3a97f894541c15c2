#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid router answering distance and reachability queries for the city.
//!
//! A [`Router`] owns every piece of scratch state a query needs: the distance
//! field, both frontier queues, the boat drag counters and the fighting memo.
//! Queries take `&mut self`, so one router serves one query at a time and the
//! field of the latest query stays readable until the next one starts.

mod fighting;
mod field;
mod policy;
mod queue;
mod stats;

use civitas_core::{
    BuildingId, BuildingKind, CellCoord, CellRect, CitizenTerrain, Direction, Event, Grid,
    GridOffset, MapGeometry, RoutedBuilding, RoutingMap, TerrainEditor, TerrainFlags,
    WaterTerrain,
};
use serde::Deserialize;

use fighting::FightingCache;
use policy::{Flood, FloodPolicy, TravelPolicy};
use queue::{OrderedQueue, RingQueue};

pub use field::DistanceField;
pub use stats::{RoutingStats, StateError, STATE_SIZE};

/// Tunables shared by every flood fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    guard: u32,
    edge_drag: u8,
    edge_penalty: i16,
}

impl Config {
    /// Creates a configuration with explicit limits.
    #[must_use]
    pub const fn new(guard: u32, edge_drag: u8, edge_penalty: i16) -> Self {
        Self {
            guard,
            edge_drag,
            edge_penalty,
        }
    }

    /// Maximum number of tiles a flood fill dequeues before giving up.
    #[must_use]
    pub const fn guard(&self) -> u32 {
        self.guard
    }

    /// Times a boat flood re-queues a map edge tile before expanding it.
    #[must_use]
    pub const fn edge_drag(&self) -> u8 {
        self.edge_drag
    }

    /// Extra distance charged for entering a map edge tile by boat.
    #[must_use]
    pub const fn edge_penalty(&self) -> i16 {
        self.edge_penalty
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(50_000, 4, 4)
    }
}

/// Reusable routing context.
#[derive(Debug)]
pub struct Router {
    config: Config,
    geometry: MapGeometry,
    field: DistanceField,
    ring: RingQueue,
    heap: OrderedQueue,
    water_drag: Grid<u8>,
    fighting: FightingCache,
    stats: RoutingStats,
}

impl Router {
    /// Creates a router using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            geometry: MapGeometry::default(),
            field: DistanceField::new(),
            ring: RingQueue::new(),
            heap: OrderedQueue::new(),
            water_drag: Grid::new(),
            fighting: FightingCache::new(),
            stats: RoutingStats::default(),
        }
    }

    /// Configuration the router was built with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Flood fills citizen walking distances from `source`.
    pub fn calculate_distances<M>(&mut self, map: &M, source: CellCoord)
    where
        M: RoutingMap + ?Sized,
    {
        self.stats.record();
        self.clear_data(map);
        if let Some(offset) = self.geometry.offset(source) {
            let _ = self.flood(map, offset, FloodPolicy::CitizenLand);
        }
    }

    /// Flood fills boat distances from `source`; map edge water drags.
    pub fn calculate_distances_water_boat<M>(&mut self, map: &M, source: CellCoord)
    where
        M: RoutingMap + ?Sized,
    {
        self.flood_water(map, source, FloodPolicy::WaterBoat);
    }

    /// Flood fills drifting distances from `source`, diagonals included.
    pub fn calculate_distances_water_flotsam<M>(&mut self, map: &M, source: CellCoord)
    where
        M: RoutingMap + ?Sized,
    {
        self.flood_water(map, source, FloodPolicy::WaterFlotsam);
    }

    /// Flood fills the tiles a `kind` drag starting at `source` could cover.
    ///
    /// Returns `false` without flooding when `source` cannot start that
    /// structure. Walls are accepted from any tile on the map.
    pub fn calculate_distances_for_building<M>(
        &mut self,
        map: &M,
        kind: RoutedBuilding,
        source: CellCoord,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        self.clear_data(map);
        let Some(offset) = self.geometry.offset(source) else {
            return false;
        };

        let policy = match kind {
            RoutedBuilding::Wall => {
                let _ = self.flood(map, offset, FloodPolicy::BuildWall);
                return true;
            }
            RoutedBuilding::Road => FloodPolicy::BuildRoad,
            RoutedBuilding::Aqueduct => FloodPolicy::BuildAqueduct,
        };

        if !can_start_road_or_aqueduct(map, offset, kind) {
            tracing::debug!(?kind, ?source, "construction source rejected");
            return false;
        }

        self.stats.record();
        let _ = self.flood(map, offset, policy);
        true
    }

    /// Removes the first wall or aqueduct tile reachable on foot from `source`.
    ///
    /// Returns the cleared cell, or `None` when nothing was found before the
    /// flood ran out of tiles or hit the guard. The first hit halts the whole
    /// flood, so a call never clears more than one tile.
    pub fn delete_first_wall_or_aqueduct<M>(
        &mut self,
        map: &mut M,
        source: CellCoord,
    ) -> Option<CellCoord>
    where
        M: RoutingMap + TerrainEditor,
    {
        self.stats.record();
        self.clear_data(&*map);
        let offset = self.geometry.offset(source)?;
        let found = self.flood(&*map, offset, FloodPolicy::DeleteWallOrAqueduct)?;
        map.remove_terrain(found, TerrainFlags::CLEARABLE);
        let cell = self.geometry.cell(found);
        tracing::debug!(?source, ?cell, "wall or aqueduct removed");
        cell
    }

    /// Whether a citizen can walk from `source` to `destination`.
    pub fn citizen_can_travel_over_land<M>(
        &mut self,
        map: &M,
        source: CellCoord,
        destination: CellCoord,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        self.stats.record();
        self.route(map, source, destination, TravelPolicy::CitizenLand, None)
    }

    /// Whether a citizen can reach `destination` using only roads and gardens.
    pub fn citizen_can_travel_over_road_garden<M>(
        &mut self,
        map: &M,
        source: CellCoord,
        destination: CellCoord,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        let geometry = map.geometry();
        let Some(target) = geometry.offset(destination) else {
            return false;
        };
        if !policy::is_road_or_garden(map.citizen(target)) {
            return false;
        }
        self.stats.record();
        self.route(
            map,
            source,
            destination,
            TravelPolicy::CitizenRoadGarden,
            None,
        )
    }

    /// Whether a wall walker can reach `destination` along the walls.
    pub fn can_travel_over_walls<M>(
        &mut self,
        map: &M,
        source: CellCoord,
        destination: CellCoord,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        self.stats.record();
        self.route(map, source, destination, TravelPolicy::Walls, None)
    }

    /// Whether an invader can reach `destination` over land.
    ///
    /// With `through_building` the invader may only enter that building's
    /// tiles among all buildings, and `max_tiles` is ignored. Otherwise the
    /// search gives up after expanding `max_tiles` tiles; `None` or `Some(0)`
    /// leave it unbounded.
    pub fn noncitizen_can_travel_over_land<M>(
        &mut self,
        map: &M,
        source: CellCoord,
        destination: CellCoord,
        through_building: Option<BuildingId>,
        max_tiles: Option<u32>,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        self.stats.record_enemy();
        match through_building {
            Some(building) => self.route(
                map,
                source,
                destination,
                TravelPolicy::NoncitizenThroughBuilding(building),
                None,
            ),
            None => self.route(
                map,
                source,
                destination,
                TravelPolicy::NoncitizenLand,
                max_tiles.filter(|&limit| limit > 0),
            ),
        }
    }

    /// Whether an invader can reach `destination` ignoring every obstacle
    /// that is not outright blocked.
    pub fn noncitizen_can_travel_through_everything<M>(
        &mut self,
        map: &M,
        source: CellCoord,
        destination: CellCoord,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        self.stats.record();
        self.route(
            map,
            source,
            destination,
            TravelPolicy::NoncitizenThroughEverything,
            None,
        )
    }

    /// Zeroes the distance field under a `size` x `size` footprint.
    ///
    /// Footprints that do not fit on the map are ignored.
    pub fn block(&mut self, origin: CellCoord, size: u32) {
        if !self.geometry.is_inside(origin, size) {
            return;
        }
        self.field
            .block(&self.geometry, CellRect::square(origin, size));
    }

    /// Distance recorded at `offset` by the last query.
    #[must_use]
    pub fn distance(&self, offset: GridOffset) -> i16 {
        self.field.determined(offset)
    }

    /// Distance recorded at `cell` by the last query; `0` off the map.
    #[must_use]
    pub fn distance_at(&self, cell: CellCoord) -> i16 {
        self.geometry
            .offset(cell)
            .map_or(0, |offset| self.field.determined(offset))
    }

    /// Field left behind by the last query.
    #[must_use]
    pub const fn field(&self) -> &DistanceField {
        &self.field
    }

    /// Geometry of the map the last query ran on.
    #[must_use]
    pub const fn geometry(&self) -> MapGeometry {
        self.geometry
    }

    /// Walks the last field back from `destination` to the query source.
    ///
    /// Each step moves to an orthogonal neighbour exactly one closer to the
    /// source. Returns the cells source first, or `None` when `destination`
    /// was not reached or the field carries distance penalties that break the
    /// chain.
    #[must_use]
    pub fn path_to(&self, destination: CellCoord) -> Option<Vec<CellCoord>> {
        let mut current = self.geometry.offset(destination)?;
        let mut distance = self.field.determined(current);
        if distance <= 0 {
            return None;
        }

        let mut path = Vec::with_capacity(distance as usize);
        path.push(destination);
        while distance > 1 {
            current = Direction::ORTHOGONAL.iter().find_map(|&direction| {
                let next = current.step(direction);
                (self.geometry.is_valid_offset(next)
                    && self.field.determined(next) == distance - 1)
                    .then_some(next)
            })?;
            distance -= 1;
            path.push(self.geometry.cell(current)?);
        }
        path.reverse();
        Some(path)
    }

    /// Route counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> RoutingStats {
        self.stats
    }

    /// Serialises the route counters.
    pub fn save_state(&self) -> Result<Vec<u8>, StateError> {
        self.stats.save()
    }

    /// Restores route counters written by [`Router::save_state`].
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), StateError> {
        self.stats = RoutingStats::load(bytes)?;
        Ok(())
    }

    /// Keeps the field consistent with world changes.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::MapConfigured { width, height } => {
                    self.geometry = MapGeometry::new(*width, *height);
                    self.field.clear();
                }
                Event::BuildingPlaced { region, .. } => {
                    self.field.block(&self.geometry, *region);
                }
                _ => {}
            }
        }
    }

    fn clear_data<M>(&mut self, map: &M)
    where
        M: RoutingMap + ?Sized,
    {
        self.fighting.reset(map.now_millis());
        self.geometry = map.geometry();
        self.field.clear();
        self.ring.clear();
        self.heap.clear();
    }

    fn flood_water<M>(&mut self, map: &M, source: CellCoord, policy: FloodPolicy)
    where
        M: RoutingMap + ?Sized,
    {
        self.clear_data(map);
        let Some(offset) = self.geometry.offset(source) else {
            return;
        };
        if map.water(offset) == WaterTerrain::Blocked {
            return;
        }
        let _ = self.flood(map, offset, policy);
    }

    /// Breadth-first flood from `source`. Returns the tile a searching policy
    /// stopped on.
    fn flood<M>(&mut self, map: &M, source: GridOffset, policy: FloodPolicy) -> Option<GridOffset>
    where
        M: RoutingMap + ?Sized,
    {
        self.water_drag.clear();
        self.field.determined[source] = 1;
        self.ring.push(source);

        let drag_limit = if policy.is_boat() {
            self.config.edge_drag
        } else {
            0
        };
        let mut iterations = 0_u32;
        while let Some(offset) = self.ring.pop() {
            iterations += 1;
            if iterations > self.config.guard {
                tracing::warn!(?policy, guard = self.config.guard, "flood fill hit the guard");
                return None;
            }

            if drag_limit > 0
                && map.water(offset) == WaterTerrain::MapEdge
                && self.water_drag[offset] < drag_limit
            {
                self.water_drag[offset] += 1;
                self.ring.push(offset);
                continue;
            }

            let distance = self.field.determined[offset].saturating_add(1);
            for &direction in policy.directions() {
                let next = offset.step(direction);
                if !self.geometry.is_valid_offset(next) || self.field.determined[next] != 0 {
                    continue;
                }
                match policy.step(map, next) {
                    Flood::Enqueue => self.enqueue(next, distance),
                    Flood::EnqueueAtEdge => {
                        self.enqueue(next, distance.saturating_add(self.config.edge_penalty));
                    }
                    Flood::Skip => {}
                    Flood::Conflict => self.field.determined[next] = -1,
                    Flood::Found => return Some(next),
                }
            }
        }
        None
    }

    fn enqueue(&mut self, offset: GridOffset, distance: i16) {
        self.field.determined[offset] = distance;
        self.ring.push(offset);
    }

    /// Best-first search from `source` towards `destination` with a Manhattan
    /// heuristic.
    fn route<M>(
        &mut self,
        map: &M,
        source: CellCoord,
        destination: CellCoord,
        policy: TravelPolicy,
        max_tiles: Option<u32>,
    ) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        self.clear_data(map);
        let (Some(start), Some(target)) =
            (self.geometry.offset(source), self.geometry.offset(destination))
        else {
            return false;
        };

        self.offer(start, 1, 0);
        let mut expanded = 0_u32;
        while let Some(offset) = self.heap.pop(&self.field.possible) {
            if offset == target {
                break;
            }
            if let Some(limit) = max_tiles {
                expanded += 1;
                if expanded > limit {
                    break;
                }
            }

            let distance = self.field.determined[offset].saturating_add(1);
            self.field.close(offset);
            for direction in Direction::ORTHOGONAL {
                let next = offset.step(direction);
                if !self.geometry.is_valid_offset(next)
                    || self.field.possible[next] == field::CLOSED
                {
                    continue;
                }
                if !policy.admits(map, &mut self.fighting, next) {
                    continue;
                }
                let (x, y) = self.geometry.coords(next);
                let remaining = (x - destination.column() as i32).abs()
                    + (y - destination.row() as i32).abs();
                self.offer(next, distance, remaining as i16);
            }
        }

        let reached = self.field.determined[target] != 0;
        tracing::debug!(?policy, ?source, ?destination, reached, "route computed");
        reached
    }

    /// Records `offset` at `distance` unless an equal or cheaper estimate is
    /// already known for it.
    fn offer(&mut self, offset: GridOffset, distance: i16, remaining: i16) {
        let estimate = distance.saturating_add(remaining);
        let recorded = self.field.possible[offset];
        if recorded != 0 && recorded <= estimate {
            return;
        }
        self.field.determined[offset] = distance;
        self.field.possible[offset] = estimate;
        self.heap.push_or_decrease(offset, &self.field.possible);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Checks the tile a road or aqueduct drag starts on, which the flood itself
/// never evaluates.
fn can_start_road_or_aqueduct<M>(map: &M, offset: GridOffset, kind: RoutedBuilding) -> bool
where
    M: RoutingMap + ?Sized,
{
    let is_aqueduct = kind == RoutedBuilding::Aqueduct;
    let terrain = map.terrain(offset);
    let legal = match map.citizen(offset) {
        CitizenTerrain::Blocked => {
            is_aqueduct
                && (terrain.contains(TerrainFlags::AQUEDUCT)
                    || (terrain.contains(TerrainFlags::BUILDING)
                        && map
                            .building_at(offset)
                            .and_then(|building| map.building_kind(building))
                            == Some(BuildingKind::Reservoir)))
        }
        CitizenTerrain::PassableTerrain => false,
        CitizenTerrain::Aqueduct => !is_aqueduct && map.can_place_road_under_aqueduct(offset),
        _ => true,
    };
    legal
        && !(is_aqueduct
            && terrain.contains(TerrainFlags::ROAD)
            && !map.can_place_aqueduct_on_road(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use civitas_core::Command;
    use civitas_world::{apply, World};

    fn world(width: u32, height: u32, commands: Vec<Command>) -> World {
        let mut world = World::with_size(width, height);
        let mut events = Vec::new();
        for command in commands {
            apply(&mut world, command, &mut events);
        }
        world
    }

    fn water_strip(width: u32) -> World {
        world(
            width,
            1,
            vec![Command::AddTerrain {
                region: CellRect::from_origin_and_size(
                    CellCoord::new(0, 0),
                    civitas_core::CellRectSize::new(width, 1),
                ),
                flags: TerrainFlags::WATER,
            }],
        )
    }

    #[test]
    fn map_edge_water_is_dragged_before_expanding() {
        let map = water_strip(3);

        let mut stalled = Router::new(Config::new(4, 4, 4));
        stalled.calculate_distances_water_boat(&map, CellCoord::new(0, 0));
        assert_eq!(stalled.distance_at(CellCoord::new(0, 0)), 1);
        assert_eq!(
            stalled.distance_at(CellCoord::new(1, 0)),
            0,
            "source must be re-queued four times before expanding"
        );

        let mut released = Router::new(Config::new(5, 4, 4));
        released.calculate_distances_water_boat(&map, CellCoord::new(0, 0));
        assert_eq!(
            released.distance_at(CellCoord::new(1, 0)),
            6,
            "edge neighbour carries the edge penalty"
        );
    }

    #[test]
    fn boat_query_on_dry_land_only_clears() {
        let map = world(4, 4, Vec::new());
        let mut router = Router::default();
        router.calculate_distances(&map, CellCoord::new(0, 0));
        assert_ne!(router.distance_at(CellCoord::new(3, 3)), 0);

        router.calculate_distances_water_boat(&map, CellCoord::new(0, 0));
        assert!(router.field().as_slice().iter().all(|&value| value == 0));
        assert_eq!(router.stats().total_routes_calculated(), 1);
    }

    #[test]
    fn flotsam_moves_diagonally() {
        let map = world(
            3,
            3,
            vec![Command::AddTerrain {
                region: CellRect::square(CellCoord::new(0, 0), 3),
                flags: TerrainFlags::WATER,
            }],
        );
        let mut router = Router::default();
        router.calculate_distances_water_flotsam(&map, CellCoord::new(1, 1));
        assert_eq!(router.distance_at(CellCoord::new(0, 0)), 2);
        assert_eq!(router.distance_at(CellCoord::new(2, 2)), 2);
    }

    #[test]
    fn block_zeroes_footprint_only() {
        let map = world(6, 6, Vec::new());
        let mut router = Router::default();
        router.calculate_distances(&map, CellCoord::new(0, 0));
        router.block(CellCoord::new(2, 2), 2);

        for cell in CellRect::square(CellCoord::new(2, 2), 2).cells() {
            assert_eq!(router.distance_at(cell), 0, "{cell:?} must be blocked");
        }
        assert_eq!(router.distance_at(CellCoord::new(4, 4)), 9);
    }

    #[test]
    fn block_ignores_footprints_leaving_the_map() {
        let map = world(4, 4, Vec::new());
        let mut router = Router::default();
        router.calculate_distances(&map, CellCoord::new(0, 0));
        router.block(CellCoord::new(3, 3), 2);
        assert_eq!(router.distance_at(CellCoord::new(3, 3)), 7);
    }

    #[test]
    fn clear_data_leaves_no_distances() {
        let map = world(5, 5, Vec::new());
        let mut router = Router::default();
        router.calculate_distances(&map, CellCoord::new(2, 2));
        router.clear_data(&map);
        assert!(router.field().as_slice().iter().all(|&value| value == 0));
    }

    #[test]
    fn heap_stays_ordered_during_search() {
        let map = world(12, 12, Vec::new());
        let mut router = Router::default();
        router.clear_data(&map);
        let start = router
            .geometry
            .offset(CellCoord::new(0, 0))
            .expect("on map");
        router.offer(start, 1, 0);
        while let Some(offset) = router.heap.pop(&router.field.possible) {
            assert!(router.heap.is_heap(&router.field.possible));
            let distance = router.field.determined[offset] + 1;
            router.field.close(offset);
            for direction in Direction::ORTHOGONAL {
                let next = offset.step(direction);
                if router.geometry.is_valid_offset(next)
                    && router.field.possible[next] != field::CLOSED
                {
                    router.offer(next, distance, 0);
                    assert!(router.heap.is_heap(&router.field.possible));
                }
            }
        }
        assert_eq!(router.distance_at(CellCoord::new(11, 11)), 23);
    }

    #[test]
    fn handle_blocks_placed_buildings_and_resets_on_new_maps() {
        let mut map = world(6, 6, Vec::new());
        let mut router = Router::default();
        router.calculate_distances(&map, CellCoord::new(0, 0));

        let mut events = Vec::new();
        apply(
            &mut map,
            Command::PlaceBuilding {
                kind: BuildingKind::House,
                origin: CellCoord::new(1, 1),
                size: 2,
            },
            &mut events,
        );
        router.handle(&events);
        assert_eq!(router.distance_at(CellCoord::new(1, 1)), 0);
        assert_eq!(router.distance_at(CellCoord::new(2, 2)), 0);
        assert_eq!(router.distance_at(CellCoord::new(3, 3)), 7);

        router.handle(&[Event::MapConfigured {
            width: 8,
            height: 8,
        }]);
        assert_eq!(router.geometry(), MapGeometry::new(8, 8));
        assert_eq!(router.distance_at(CellCoord::new(3, 3)), 0);
    }
}
