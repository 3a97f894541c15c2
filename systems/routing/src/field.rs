//! Distance field produced by the most recent route query.

use civitas_core::{CellRect, Grid, GridOffset, MapGeometry};

/// Marker stored in `possible` once best-first search has expanded a tile.
pub(crate) const CLOSED: i16 = 1;

/// Paired `determined`/`possible` grids reused by every query.
///
/// `determined` holds 1-based hop counts from the query source, `0` for tiles
/// the query never reached and `-1` for tiles a construction flood rejected
/// with a recorded conflict. `possible` is only meaningful while a best-first
/// search runs.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    pub(crate) determined: Grid<i16>,
    pub(crate) possible: Grid<i16>,
}

impl DistanceField {
    /// Creates an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance recorded for `offset`; `0` when unreached or off the grid.
    #[must_use]
    pub fn determined(&self, offset: GridOffset) -> i16 {
        self.determined.get(offset).unwrap_or(0)
    }

    /// Raw `determined` values in grid order.
    #[must_use]
    pub fn as_slice(&self) -> &[i16] {
        self.determined.as_slice()
    }

    pub(crate) fn clear(&mut self) {
        self.determined.clear();
        self.possible.clear();
    }

    pub(crate) fn close(&mut self, offset: GridOffset) {
        self.possible[offset] = CLOSED;
    }

    pub(crate) fn block(&mut self, geometry: &MapGeometry, region: CellRect) {
        for cell in region.cells() {
            if let Some(offset) = geometry.offset(cell) {
                self.determined[offset] = 0;
            }
        }
    }
}
