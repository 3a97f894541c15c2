//! Text rendering of router output.

use civitas_core::CellCoord;
use civitas_system_routing::Router;
use civitas_world::{layout, World};

/// Prints the distance field of the last query, one map row per line.
///
/// Unreached tiles print as `.`, construction conflicts as `x`.
pub(crate) fn field(router: &Router) -> String {
    let geometry = router.geometry();
    let cells = || {
        (0..geometry.height()).flat_map(move |row| {
            (0..geometry.width()).map(move |column| CellCoord::new(column, row))
        })
    };
    let width = cells()
        .map(|cell| label(router.distance_at(cell)).len())
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    for cell in cells() {
        let text = label(router.distance_at(cell));
        if cell.column() > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{text:>width$}"));
        if cell.column() + 1 == geometry.width() {
            out.push('\n');
        }
    }
    out
}

fn label(distance: i16) -> String {
    match distance {
        0 => ".".to_owned(),
        -1 => "x".to_owned(),
        distance => distance.to_string(),
    }
}

pub(crate) fn terrain(world: &World) -> String {
    layout::render(world)
}
