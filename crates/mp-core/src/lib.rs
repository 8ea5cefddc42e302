pub mod colliders;
pub mod config;
pub mod error;
pub mod frame;
pub mod grid;
pub mod mission;
pub mod models;
pub mod planner;
pub mod prune;
pub mod queue;
pub mod search;

pub use colliders::{Obstacle, ObstacleMap};
pub use config::{MissionConfig, PlannerConfig, QueuePath};
pub use error::{MissionError, PlanningError, TransportError};
pub use frame::{global_to_local, local_to_global};
pub use grid::OccupancyGrid;
pub use mission::{
    MissionController, MissionEvent, MissionSnapshot, MissionState, Transition, VehicleLink,
};
pub use models::{GlobalPosition, GridCell, LocalPosition, LocalVelocity, VehicleStatus, Waypoint};
pub use planner::{cells_to_waypoints, plan_route, sample_goal, PathPlanner, Plan, Route};
pub use prune::{collinearity_check, prune_path};
pub use queue::WaypointQueue;
pub use search::{a_star, SearchResult};
