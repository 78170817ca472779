/*
 * Grid Bridge Module
 *
 * Lookup from a continuous agent position to a cell of an attached grid
 * model. The grid itself lives elsewhere; only its shape and wrap flags
 * matter here.
 */

use glam::DVec2;

use crate::geometry::Wrap;

pub trait GridModel {
    type CellRef;

    fn cols(&self) -> usize;
    fn rows(&self) -> usize;
    fn wrap(&self) -> Wrap;
    fn cell(&self, col: usize, row: usize) -> Option<Self::CellRef>;
}

fn fold(coord: f64, extent: usize, wraps: bool) -> Option<usize> {
    let extent = extent as i64;
    if extent == 0 || !coord.is_finite() {
        return None;
    }
    let floored = coord.floor() as i64;
    if (0..extent).contains(&floored) {
        Some(floored as usize)
    } else if wraps {
        Some(floored.rem_euclid(extent) as usize)
    } else {
        None
    }
}

/// Cell under `position`, or `None` off the grid on a non-wrapping axis
pub fn grid_cell_at<G: GridModel>(grid: &G, position: DVec2) -> Option<G::CellRef> {
    let wrap = grid.wrap();
    let col = fold(position.x, grid.cols(), wrap.x)?;
    let row = fold(position.y, grid.rows(), wrap.y)?;
    grid.cell(col, row)
}
