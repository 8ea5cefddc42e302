//! Collinearity pruning of grid paths.

use crate::models::GridCell;

/// Determinant threshold under which three points count as collinear.
pub const COLLINEARITY_EPSILON: f64 = 1e-6;

/// True when the three points lie on one line, judged by the determinant of
/// their homogeneous coordinates `(x, y, 1)` stacked as rows.
pub fn collinearity_check(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), epsilon: f64) -> bool {
    // Cofactor expansion along the column of ones.
    let det = p1.0 * (p2.1 - p3.1) - p1.1 * (p2.0 - p3.0) + (p2.0 * p3.1 - p3.0 * p2.1);
    det.abs() < epsilon
}

fn as_point(cell: GridCell) -> (f64, f64) {
    (cell.0 as f64, cell.1 as f64)
}

/// Remove every intermediate cell that sits on the line between its
/// neighbours. After a removal the same position is tested again, so runs of
/// collinear cells collapse to their two end points.
pub fn prune_path(path: &[GridCell]) -> Vec<GridCell> {
    let mut pruned = path.to_vec();
    let mut i = 0;
    while i + 2 < pruned.len() {
        let p1 = as_point(pruned[i]);
        let p2 = as_point(pruned[i + 1]);
        let p3 = as_point(pruned[i + 2]);
        if collinearity_check(p1, p2, p3, COLLINEARITY_EPSILON) {
            pruned.remove(i + 1);
        } else {
            i += 1;
        }
    }
    pruned
}
