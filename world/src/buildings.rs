//! Authoritative building state management utilities.

use std::collections::BTreeMap;

use civitas_core::{BuildingId, BuildingKind, CellRect};

/// Snapshot of a building stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct BuildingState {
    /// Identifier allocated by the world for the building.
    pub(crate) id: BuildingId,
    /// Kind of building that was constructed.
    pub(crate) kind: BuildingKind,
    /// Region of cells occupied by the building.
    pub(crate) region: CellRect,
}

/// Registry that stores buildings and manages identifier allocation.
///
/// Identifiers start at one so a zeroed save slot never aliases a live building.
#[derive(Debug)]
pub(crate) struct BuildingRegistry {
    entries: BTreeMap<BuildingId, BuildingState>,
    next_building_id: BuildingId,
}

impl BuildingRegistry {
    /// Creates an empty building registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_building_id: BuildingId::new(1),
        }
    }

    /// Stores a new building and returns its identifier.
    pub(crate) fn insert(&mut self, kind: BuildingKind, region: CellRect) -> BuildingId {
        let id = self.next_building_id;
        self.next_building_id = BuildingId::new(id.get() + 1);
        let _ = self.entries.insert(id, BuildingState { id, kind, region });
        id
    }

    /// Looks up a stored building.
    pub(crate) fn get(&self, id: BuildingId) -> Option<&BuildingState> {
        self.entries.get(&id)
    }

    /// Iterates over the stored buildings in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &BuildingState> {
        self.entries.values()
    }
}
