//! 2.5D occupancy grid rasterized from an obstacle map at a fixed altitude.

use crate::colliders::Obstacle;
use crate::error::PlanningError;
use crate::models::GridCell;

/// Obstacle presence per 1 m cell, plus the translation from local north/east
/// to grid indices (`index = local - offset`).
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    rows: usize,
    cols: usize,
    north_offset: i64,
    east_offset: i64,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// An obstacle-free grid of `rows` (north) by `cols` (east) cells.
    pub fn empty(rows: usize, cols: usize, north_offset: i64, east_offset: i64) -> Self {
        Self {
            rows,
            cols,
            north_offset,
            east_offset,
            blocked: vec![false; rows * cols],
        }
    }

    /// Rasterize `obstacles` for a vehicle flying at `altitude`, inflating each
    /// footprint by `safety_distance`. Obstacles whose top (plus margin) is at
    /// or below `altitude` are ignored.
    pub fn from_obstacles(
        obstacles: &[Obstacle],
        altitude: f64,
        safety_distance: f64,
    ) -> Result<Self, PlanningError> {
        if obstacles.is_empty() {
            return Err(PlanningError::MapUnavailable(
                "obstacle map has no rows to size the grid".to_string(),
            ));
        }

        let fold_min = |f: fn(&Obstacle) -> f64| obstacles.iter().map(f).fold(f64::INFINITY, f64::min);
        let fold_max =
            |f: fn(&Obstacle) -> f64| obstacles.iter().map(f).fold(f64::NEG_INFINITY, f64::max);

        let north_min = fold_min(|o| o.north - o.half_north).floor();
        let north_max = fold_max(|o| o.north + o.half_north).ceil();
        let east_min = fold_min(|o| o.east - o.half_east).floor();
        let east_max = fold_max(|o| o.east + o.half_east).ceil();

        let rows = (north_max - north_min).ceil().max(1.0) as usize;
        let cols = (east_max - east_min).ceil().max(1.0) as usize;
        let mut grid = Self::empty(rows, cols, north_min as i64, east_min as i64);

        let clip = |value: f64, size: usize| value.clamp(0.0, (size - 1) as f64) as usize;

        for obstacle in obstacles {
            if obstacle.altitude + obstacle.half_altitude + safety_distance <= altitude {
                continue;
            }
            let n0 = clip(obstacle.north - obstacle.half_north - safety_distance - north_min, rows);
            let n1 = clip(obstacle.north + obstacle.half_north + safety_distance - north_min, rows);
            let e0 = clip(obstacle.east - obstacle.half_east - safety_distance - east_min, cols);
            let e1 = clip(obstacle.east + obstacle.half_east + safety_distance - east_min, cols);
            for row in n0..=n1 {
                for col in e0..=e1 {
                    grid.blocked[row * cols + col] = true;
                }
            }
        }

        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn north_offset(&self) -> i64 {
        self.north_offset
    }

    pub fn east_offset(&self) -> i64 {
        self.east_offset
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        cell.0 < self.rows && cell.1 < self.cols
    }

    /// Cells outside the grid count as blocked.
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        !self.contains(cell) || self.blocked[cell.0 * self.cols + cell.1]
    }

    pub fn set_blocked(&mut self, cell: GridCell, blocked: bool) {
        if self.contains(cell) {
            self.blocked[cell.0 * self.cols + cell.1] = blocked;
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    /// Grid cell holding a local north/east point, if it lies on the grid.
    pub fn cell_at(&self, north: f64, east: f64) -> Option<GridCell> {
        if !north.is_finite() || !east.is_finite() {
            return None;
        }
        let row = north.floor() as i64 - self.north_offset;
        let col = east.floor() as i64 - self.east_offset;
        if row < 0 || col < 0 {
            return None;
        }
        let cell = (row as usize, col as usize);
        self.contains(cell).then_some(cell)
    }

    /// Local north/east of a cell's corner (the inverse of `cell_at`).
    pub fn cell_to_local(&self, cell: GridCell) -> (f64, f64) {
        (
            (cell.0 as i64 + self.north_offset) as f64,
            (cell.1 as i64 + self.east_offset) as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(north: f64, east: f64, altitude: f64, half: f64, half_alt: f64) -> Obstacle {
        Obstacle {
            north,
            east,
            altitude,
            half_north: half,
            half_east: half,
            half_altitude: half_alt,
        }
    }

    #[test]
    fn offsets_are_map_minimum() {
        let obstacles = vec![
            obstacle(-10.0, -20.0, 2.0, 2.0, 2.0),
            obstacle(30.0, 40.0, 2.0, 2.0, 2.0),
        ];
        let grid = OccupancyGrid::from_obstacles(&obstacles, 5.0, 0.0).unwrap();
        assert_eq!(grid.north_offset(), -12);
        assert_eq!(grid.east_offset(), -22);
        assert_eq!(grid.rows(), 44);
        assert_eq!(grid.cols(), 64);
    }

    #[test]
    fn low_obstacles_are_ignored() {
        // Top at 4 m plus 0.5 m margin stays below a 5 m flight level.
        let obstacles = vec![obstacle(0.0, 0.0, 2.0, 3.0, 2.0), obstacle(20.0, 20.0, 1.0, 1.0, 1.0)];
        let grid = OccupancyGrid::from_obstacles(&obstacles, 5.0, 0.5).unwrap();
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn tall_obstacle_is_inflated_by_safety_margin() {
        let obstacles = vec![obstacle(0.0, 0.0, 20.0, 2.0, 20.0), obstacle(50.0, 50.0, 1.0, 1.0, 1.0)];
        let grid = OccupancyGrid::from_obstacles(&obstacles, 5.0, 3.0).unwrap();

        let center = grid.cell_at(0.0, 0.0).unwrap();
        assert!(grid.is_blocked(center));
        // 2 m half-size + 3 m margin reaches 5 m from the centre.
        assert!(grid.is_blocked(grid.cell_at(4.5, 0.0).unwrap()));
        assert!(!grid.is_blocked(grid.cell_at(6.5, 0.0).unwrap()));
    }

    #[test]
    fn cell_lookup_round_trips() {
        let grid = OccupancyGrid::empty(10, 10, -5, -5);
        let cell = grid.cell_at(2.7, -3.2).unwrap();
        assert_eq!(cell, (7, 1));
        assert_eq!(grid.cell_to_local(cell), (2.0, -4.0));
        assert!(grid.cell_at(5.0, 0.0).is_none());
        assert!(grid.cell_at(-5.5, 0.0).is_none());
    }

    #[test]
    fn outside_cells_are_blocked() {
        let grid = OccupancyGrid::empty(3, 3, 0, 0);
        assert!(!grid.is_blocked((2, 2)));
        assert!(grid.is_blocked((3, 0)));
    }

    #[test]
    fn empty_map_cannot_size_a_grid() {
        let err = OccupancyGrid::from_obstacles(&[], 5.0, 5.0).unwrap_err();
        assert!(matches!(err, PlanningError::MapUnavailable(_)));
    }
}
