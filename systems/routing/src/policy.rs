//! Edge policies deciding which neighbours a query may step onto.

use civitas_core::{
    BuildingId, CitizenTerrain, CombatSide, Direction, GridOffset, NoncitizenTerrain,
    RoutingMap, TerrainFlags, WallTerrain, WaterTerrain,
};

use crate::fighting::FightingCache;

/// Outcome of offering a neighbour to a flood fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flood {
    /// Record the neighbour one step further than the current tile.
    Enqueue,
    /// Record the neighbour with the map edge penalty added.
    EnqueueAtEdge,
    /// Leave the neighbour untouched.
    Skip,
    /// Mark the neighbour as a construction conflict and do not expand it.
    Conflict,
    /// Stop the flood; the neighbour is the target being searched for.
    Found,
}

/// Breadth-first flood policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FloodPolicy {
    CitizenLand,
    WaterBoat,
    WaterFlotsam,
    BuildWall,
    BuildRoad,
    BuildAqueduct,
    DeleteWallOrAqueduct,
}

impl FloodPolicy {
    pub(crate) const fn directions(self) -> &'static [Direction] {
        match self {
            Self::WaterFlotsam => &Direction::ALL,
            _ => &Direction::ORTHOGONAL,
        }
    }

    pub(crate) const fn is_boat(self) -> bool {
        matches!(self, Self::WaterBoat)
    }

    pub(crate) fn step<M>(self, map: &M, next: GridOffset) -> Flood
    where
        M: RoutingMap + ?Sized,
    {
        match self {
            Self::CitizenLand => enqueue_if(map.citizen(next) >= CitizenTerrain::Road),
            Self::WaterBoat => match map.water(next) {
                WaterTerrain::Blocked | WaterTerrain::LowBridge => Flood::Skip,
                WaterTerrain::MapEdge => Flood::EnqueueAtEdge,
                WaterTerrain::Passable => Flood::Enqueue,
            },
            Self::WaterFlotsam => enqueue_if(map.water(next) != WaterTerrain::Blocked),
            Self::BuildWall => enqueue_if(map.citizen(next) == CitizenTerrain::ClearTerrain),
            Self::BuildRoad => build_road(map, next),
            Self::BuildAqueduct => build_aqueduct(map, next),
            Self::DeleteWallOrAqueduct => {
                if map.citizen(next) >= CitizenTerrain::Road {
                    Flood::Enqueue
                } else if map
                    .terrain(next)
                    .intersects(TerrainFlags::AQUEDUCT | TerrainFlags::WALL)
                {
                    Flood::Found
                } else {
                    Flood::Skip
                }
            }
        }
    }
}

const fn enqueue_if(passable: bool) -> Flood {
    if passable {
        Flood::Enqueue
    } else {
        Flood::Skip
    }
}

fn build_road<M>(map: &M, next: GridOffset) -> Flood
where
    M: RoutingMap + ?Sized,
{
    match map.citizen(next) {
        CitizenTerrain::Aqueduct if !map.can_place_road_under_aqueduct(next) => Flood::Conflict,
        CitizenTerrain::Aqueduct => Flood::Enqueue,
        CitizenTerrain::PassableTerrain | CitizenTerrain::Blocked => Flood::Skip,
        _ => enqueue_if(!map.terrain(next).contains(TerrainFlags::BUILDING)),
    }
}

fn build_aqueduct<M>(map: &M, next: GridOffset) -> Flood
where
    M: RoutingMap + ?Sized,
{
    let terrain = map.terrain(next);
    if terrain.contains(TerrainFlags::ROAD) && !map.can_place_aqueduct_on_road(next) {
        return Flood::Conflict;
    }
    match map.citizen(next) {
        CitizenTerrain::Aqueduct | CitizenTerrain::PassableTerrain | CitizenTerrain::Blocked => {
            Flood::Skip
        }
        CitizenTerrain::ReservoirConnector => Flood::Enqueue,
        _ => enqueue_if(!terrain.contains(TerrainFlags::BUILDING)),
    }
}

/// Best-first search policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TravelPolicy {
    CitizenLand,
    CitizenRoadGarden,
    Walls,
    NoncitizenLand,
    NoncitizenThroughBuilding(BuildingId),
    NoncitizenThroughEverything,
}

impl TravelPolicy {
    pub(crate) fn admits<M>(self, map: &M, fighting: &mut FightingCache, next: GridOffset) -> bool
    where
        M: RoutingMap + ?Sized,
    {
        match self {
            Self::CitizenLand => {
                map.citizen(next) >= CitizenTerrain::Road
                    && !fighting.has_fighting(next, CombatSide::Friendly, || {
                        map.has_fighting(next, CombatSide::Friendly)
                    })
            }
            Self::CitizenRoadGarden => is_road_or_garden(map.citizen(next)),
            Self::Walls => map.walls(next) >= WallTerrain::Passable,
            Self::NoncitizenLand => {
                !enemy_fighting(map, fighting, next)
                    && (NoncitizenTerrain::Passable..NoncitizenTerrain::Fort)
                        .contains(&map.noncitizen(next))
            }
            Self::NoncitizenThroughBuilding(building) => {
                !enemy_fighting(map, fighting, next)
                    && match map.noncitizen(next) {
                        NoncitizenTerrain::Passable | NoncitizenTerrain::Clearable => true,
                        NoncitizenTerrain::Building => map.building_at(next) == Some(building),
                        _ => false,
                    }
            }
            Self::NoncitizenThroughEverything => {
                map.noncitizen(next) >= NoncitizenTerrain::Passable
            }
        }
    }
}

/// Citizen tiers a road-or-garden walker may stand on.
pub(crate) fn is_road_or_garden(class: CitizenTerrain) -> bool {
    (CitizenTerrain::Road..=CitizenTerrain::PassableTerrain).contains(&class)
}

fn enemy_fighting<M>(map: &M, fighting: &mut FightingCache, next: GridOffset) -> bool
where
    M: RoutingMap + ?Sized,
{
    fighting.has_fighting(next, CombatSide::Enemy, || {
        map.has_fighting(next, CombatSide::Enemy)
    })
}
