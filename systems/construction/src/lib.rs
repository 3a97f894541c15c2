#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure construction system turning road, aqueduct and wall drags into
//! construction commands.

use civitas_core::{CellCoord, Command, Event, RoutedBuilding, RoutingMap};
use civitas_system_routing::Router;

/// Declarative preview of the structure a drag would lay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Structure being dragged.
    pub kind: RoutedBuilding,
    /// Cell the drag started on.
    pub start: CellCoord,
    /// Cell currently under the cursor.
    pub end: CellCoord,
    /// Cells that would be covered, from `start` to `end`.
    pub cells: Vec<CellCoord>,
    /// Indicates whether the drag can be built as previewed.
    pub placeable: bool,
}

/// A drag in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstructionDrag {
    /// Structure being dragged.
    pub kind: RoutedBuilding,
    /// Cell the drag started on.
    pub start: CellCoord,
    /// Cell currently under the cursor.
    pub end: CellCoord,
}

impl ConstructionDrag {
    /// Creates a new drag descriptor.
    #[must_use]
    pub const fn new(kind: RoutedBuilding, start: CellCoord, end: CellCoord) -> Self {
        Self { kind, start, end }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConstructionInput {
    /// Drag being performed this frame, if any.
    pub drag: Option<ConstructionDrag>,
    /// Indicates whether the player released the drag to build it.
    pub confirm_action: bool,
}

/// Construction system that previews drags and emits `Construct` commands.
#[derive(Debug, Default)]
pub struct Construction {
    map_ready: bool,
    preview: Option<PlacementPreview>,
}

impl Construction {
    /// Creates a system that waits for a map before accepting input.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map_ready: false,
            preview: None,
        }
    }

    /// Preview computed by the latest call to [`Construction::handle`].
    #[must_use]
    pub fn preview(&self) -> Option<&PlacementPreview> {
        self.preview.as_ref()
    }

    /// Consumes world events and input, routes the drag and emits commands.
    pub fn handle<M>(
        &mut self,
        events: &[Event],
        input: ConstructionInput,
        router: &mut Router,
        map: &M,
        out: &mut Vec<Command>,
    ) where
        M: RoutingMap + ?Sized,
    {
        for event in events {
            match event {
                Event::MapConfigured { .. } => {
                    self.map_ready = true;
                    self.preview = None;
                }
                Event::TerrainChanged { .. } | Event::BuildingPlaced { .. } => {
                    self.preview = None;
                }
                _ => {}
            }
        }

        if !self.map_ready {
            return;
        }

        let Some(drag) = input.drag else {
            self.preview = None;
            return;
        };

        let preview = preview_drag(router, map, drag);
        if input.confirm_action && preview.placeable {
            tracing::debug!(
                kind = ?preview.kind,
                cells = preview.cells.len(),
                "construction confirmed"
            );
            out.push(Command::Construct {
                kind: preview.kind,
                cells: preview.cells,
            });
            self.preview = None;
        } else {
            self.preview = Some(preview);
        }
    }
}

fn preview_drag<M>(router: &mut Router, map: &M, drag: ConstructionDrag) -> PlacementPreview
where
    M: RoutingMap + ?Sized,
{
    let cells = if router.calculate_distances_for_building(map, drag.kind, drag.start) {
        router.path_to(drag.end).unwrap_or_default()
    } else {
        Vec::new()
    };
    PlacementPreview {
        kind: drag.kind,
        start: drag.start,
        end: drag.end,
        placeable: !cells.is_empty(),
        cells,
    }
}
