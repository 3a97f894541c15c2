//! Derives the per-traveller terrain classification of a tile from its raw
//! terrain bits.

use civitas_core::{
    BuildingKind, CellCoord, CellRect, CitizenTerrain, NoncitizenTerrain, TerrainFlags,
    WallTerrain, WaterTerrain,
};

/// Classification of a tile for citizens.
///
/// `connector` marks the reservoir tiles aqueducts attach to.
pub(crate) fn citizen(
    terrain: TerrainFlags,
    building: Option<BuildingKind>,
    connector: bool,
) -> CitizenTerrain {
    if terrain.contains(TerrainFlags::ROAD) {
        return CitizenTerrain::Road;
    }
    let walkable = TerrainFlags::RUBBLE | TerrainFlags::ACCESS_RAMP | TerrainFlags::GARDEN;
    if terrain.intersects(walkable) {
        return CitizenTerrain::PassableTerrain;
    }
    if terrain.intersects(TerrainFlags::BUILDING | TerrainFlags::GATEHOUSE) {
        if terrain.contains(TerrainFlags::GATEHOUSE) {
            return CitizenTerrain::Road;
        }
        return match building {
            Some(BuildingKind::Reservoir) if connector => CitizenTerrain::ReservoirConnector,
            _ => CitizenTerrain::Blocked,
        };
    }
    if terrain.contains(TerrainFlags::AQUEDUCT) {
        return CitizenTerrain::Aqueduct;
    }
    if terrain.intersects(TerrainFlags::NOT_CLEAR) {
        return CitizenTerrain::Blocked;
    }
    CitizenTerrain::ClearTerrain
}

/// Reports whether `cell` is an aqueduct connection point of a reservoir
/// footprint: the middle tile of each edge, or the only tile of a 1x1 footprint.
pub(crate) fn is_reservoir_connector(region: CellRect, cell: CellCoord) -> bool {
    let size = region.size().width();
    if size <= 1 {
        return true;
    }
    let dx = cell.column().wrapping_sub(region.origin().column());
    let dy = cell.row().wrapping_sub(region.origin().row());
    let middle = size / 2;
    let last = size - 1;
    (dx == middle && (dy == 0 || dy == last)) || (dy == middle && (dx == 0 || dx == last))
}

/// Classification of a tile for noncitizens.
pub(crate) fn noncitizen(
    terrain: TerrainFlags,
    building: Option<BuildingKind>,
) -> NoncitizenTerrain {
    if terrain.contains(TerrainFlags::GATEHOUSE) {
        return NoncitizenTerrain::Gatehouse;
    }
    if terrain.contains(TerrainFlags::BUILDING) {
        return match building {
            Some(BuildingKind::Fort) => NoncitizenTerrain::Fort,
            Some(BuildingKind::Gatehouse) => NoncitizenTerrain::Gatehouse,
            _ => NoncitizenTerrain::Building,
        };
    }
    if terrain.contains(TerrainFlags::WALL) {
        return NoncitizenTerrain::Wall;
    }
    if terrain.intersects(TerrainFlags::ROAD | TerrainFlags::ACCESS_RAMP) {
        return NoncitizenTerrain::Passable;
    }
    if terrain.intersects(TerrainFlags::AQUEDUCT | TerrainFlags::GARDEN | TerrainFlags::RUBBLE) {
        return NoncitizenTerrain::Clearable;
    }
    if terrain.intersects(TerrainFlags::NOT_CLEAR) {
        return NoncitizenTerrain::Blocked;
    }
    NoncitizenTerrain::Passable
}

/// Classification of a tile for boats and flotsam.
pub(crate) fn water(terrain: TerrainFlags, on_map_edge: bool) -> WaterTerrain {
    if !terrain.contains(TerrainFlags::WATER) {
        return WaterTerrain::Blocked;
    }
    if terrain.contains(TerrainFlags::ROAD) {
        return WaterTerrain::LowBridge;
    }
    if on_map_edge {
        return WaterTerrain::MapEdge;
    }
    WaterTerrain::Passable
}

/// Classification of a tile for wall walkers.
pub(crate) fn walls(terrain: TerrainFlags, building: Option<BuildingKind>) -> WallTerrain {
    if terrain.contains(TerrainFlags::GATEHOUSE) {
        return WallTerrain::Gatehouse;
    }
    if terrain.contains(TerrainFlags::BUILDING) {
        return match building {
            Some(BuildingKind::Tower) => WallTerrain::Tower,
            Some(BuildingKind::Gatehouse) => WallTerrain::Gatehouse,
            _ => WallTerrain::Blocked,
        };
    }
    if terrain.contains(TerrainFlags::WALL) {
        return WallTerrain::Passable;
    }
    WallTerrain::Blocked
}
