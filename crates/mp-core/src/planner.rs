//! Mission planning: rasterize the map, sample a free goal, search, simplify.

use crate::colliders::ObstacleMap;
use crate::config::{PlannerConfig, QueuePath};
use crate::error::PlanningError;
use crate::frame::{global_to_local, local_to_global};
use crate::grid::OccupancyGrid;
use crate::models::{GlobalPosition, GridCell, LocalPosition, Waypoint};
use crate::prune::prune_path;
use crate::queue::WaypointQueue;
use crate::search::a_star;
use rand::Rng;
use serde::Serialize;

/// A searched and simplified route between two grid cells.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub grid_start: GridCell,
    pub grid_goal: GridCell,
    pub raw_path: Vec<GridCell>,
    pub pruned_path: Vec<GridCell>,
    pub cost: f64,
    /// Built from `raw_path` or `pruned_path` depending on `QueuePath`.
    pub waypoints: WaypointQueue,
}

/// Everything produced by one planning run.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub home: GlobalPosition,
    pub start: LocalPosition,
    pub goal: LocalPosition,
    pub target_altitude: f64,
    pub north_offset: i64,
    pub east_offset: i64,
    pub route: Route,
}

impl Plan {
    pub fn waypoints(&self) -> &WaypointQueue {
        &self.route.waypoints
    }
}

/// Plans routes across one rasterized obstacle map.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    home: GlobalPosition,
    grid: OccupancyGrid,
    config: PlannerConfig,
}

impl PathPlanner {
    /// Rasterize `map` at the configured altitude and safety margin.
    pub fn new(map: &ObstacleMap, config: PlannerConfig) -> Result<Self, PlanningError> {
        let grid =
            OccupancyGrid::from_obstacles(&map.obstacles, config.target_altitude, config.safety_distance)?;
        tracing::info!(
            north_offset = grid.north_offset(),
            east_offset = grid.east_offset(),
            rows = grid.rows(),
            cols = grid.cols(),
            blocked = grid.blocked_count(),
            "rasterized obstacle map"
        );
        Ok(Self {
            home: map.home(),
            grid,
            config,
        })
    }

    /// Plan over an already built grid.
    pub fn with_grid(home: GlobalPosition, grid: OccupancyGrid, config: PlannerConfig) -> Self {
        Self { home, grid, config }
    }

    pub fn home(&self) -> GlobalPosition {
        self.home
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan from the vehicle's `global_position` to a randomly drawn free goal.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        global_position: &GlobalPosition,
        rng: &mut R,
    ) -> Result<Plan, PlanningError> {
        let start = global_to_local(global_position, &self.home);
        tracing::info!(
            home = ?self.home,
            position = ?global_position,
            local = ?start,
            "searching for a path"
        );

        let grid_start = self
            .grid
            .cell_at(start.north, start.east)
            .ok_or(PlanningError::StartOutsideGrid {
                north: start.north,
                east: start.east,
            })?;
        if self.grid.is_blocked(grid_start) {
            return Err(PlanningError::StartBlocked(grid_start));
        }

        let (grid_goal, goal) = sample_goal(
            &self.grid,
            &self.home,
            &start,
            self.config.goal_sample_radius,
            self.config.max_goal_attempts,
            rng,
        )?;
        tracing::info!(?grid_start, ?grid_goal, ?goal, "local start and goal");

        let route = plan_route(&self.grid, grid_start, grid_goal, &self.config)?;

        Ok(Plan {
            home: self.home,
            start,
            goal,
            target_altitude: self.config.target_altitude,
            north_offset: self.grid.north_offset(),
            east_offset: self.grid.east_offset(),
            route,
        })
    }
}

/// Draw goal candidates uniformly from the square of half-width `radius`
/// around `start` until one lands on a free cell.
///
/// Each candidate goes through the global frame and back, as a goal given in
/// latitude/longitude would.
pub fn sample_goal<R: Rng + ?Sized>(
    grid: &OccupancyGrid,
    home: &GlobalPosition,
    start: &LocalPosition,
    radius: f64,
    max_attempts: usize,
    rng: &mut R,
) -> Result<(GridCell, LocalPosition), PlanningError> {
    let radius = radius.abs();
    for attempt in 1..=max_attempts {
        let candidate = LocalPosition::new(
            start.north + rng.random_range(-radius..=radius),
            start.east + rng.random_range(-radius..=radius),
            0.0,
        );
        let goal = global_to_local(&local_to_global(&candidate, home), home);
        match grid.cell_at(goal.north, goal.east) {
            Some(cell) if !grid.is_blocked(cell) => {
                tracing::debug!(attempt, ?cell, "accepted goal sample");
                return Ok((cell, goal));
            }
            _ => tracing::trace!(attempt, ?goal, "rejected goal sample"),
        }
    }
    Err(PlanningError::NoFreeGoal {
        attempts: max_attempts,
    })
}

/// Search from `grid_start` to `grid_goal` and turn the result into waypoints.
pub fn plan_route(
    grid: &OccupancyGrid,
    grid_start: GridCell,
    grid_goal: GridCell,
    config: &PlannerConfig,
) -> Result<Route, PlanningError> {
    let result = a_star(grid, grid_start, grid_goal, config.max_search_expansions)?;
    let pruned_path = prune_path(&result.path);
    tracing::info!(
        raw = result.path.len(),
        pruned = pruned_path.len(),
        cost = result.cost,
        queue = ?config.queue_path,
        "path found"
    );

    let queued = match config.queue_path {
        QueuePath::Raw => &result.path,
        QueuePath::Pruned => &pruned_path,
    };
    let waypoints = cells_to_waypoints(grid, queued, config.target_altitude);

    Ok(Route {
        grid_start,
        grid_goal,
        raw_path: result.path,
        pruned_path,
        cost: result.cost,
        waypoints,
    })
}

/// Local waypoints at `altitude` with zero heading, one per cell.
pub fn cells_to_waypoints(grid: &OccupancyGrid, cells: &[GridCell], altitude: f64) -> WaypointQueue {
    cells
        .iter()
        .map(|cell| {
            let (north, east) = grid.cell_to_local(*cell);
            Waypoint::new(north, east, altitude, 0.0)
        })
        .collect()
}
