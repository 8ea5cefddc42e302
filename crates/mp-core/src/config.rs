//! Tunable thresholds for planning and for the mission state machine.

use crate::mission::MissionState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which path becomes the waypoint queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePath {
    /// Every cell returned by the search.
    #[default]
    Raw,
    /// The collinearity-pruned path.
    Pruned,
}

/// Configuration for mission planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Cruise altitude in meters; also the altitude the grid is rasterized at
    pub target_altitude: f64,
    /// Margin added around every obstacle in meters
    pub safety_distance: f64,
    /// Half-width of the square around the start position goals are drawn from
    pub goal_sample_radius: f64,
    /// Goal samples tried before giving up with `NoFreeGoal`
    pub max_goal_attempts: usize,
    /// Upper bound on cells expanded by the grid search
    pub max_search_expansions: usize,
    pub queue_path: QueuePath,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            target_altitude: 5.0,
            safety_distance: 5.0,
            goal_sample_radius: 300.0,
            max_goal_attempts: 1000,
            max_search_expansions: 2_000_000,
            queue_path: QueuePath::Raw,
        }
    }
}

/// Arrival and settling tolerances for the mission state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionConfig {
    /// Fraction of the target altitude that completes takeoff
    pub takeoff_altitude_ratio: f64,
    /// Horizontal distance (m) under which a waypoint counts as reached
    pub arrival_radius: f64,
    /// Horizontal speed (m/s) under which the final hover is settled
    pub landing_speed: f64,
    /// Altitude above home (m) under which the vehicle is on the ground
    pub landing_altitude: f64,
    /// Local down magnitude (m) under which the vehicle is on the ground
    pub landing_down: f64,
    pub arming_timeout_secs: u64,
    pub planning_timeout_secs: u64,
    pub takeoff_timeout_secs: u64,
    /// Applied per waypoint, restarted on every waypoint transition
    pub waypoint_timeout_secs: u64,
    pub landing_timeout_secs: u64,
    pub disarming_timeout_secs: u64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            takeoff_altitude_ratio: 0.95,
            arrival_radius: 1.0,
            landing_speed: 1.0,
            landing_altitude: 0.1,
            landing_down: 0.01,
            arming_timeout_secs: 30,
            planning_timeout_secs: 120,
            takeoff_timeout_secs: 60,
            waypoint_timeout_secs: 120,
            landing_timeout_secs: 120,
            disarming_timeout_secs: 30,
        }
    }
}

impl MissionConfig {
    /// How long `state` may wait for its guard. `Manual` waits forever.
    pub fn guard_timeout(&self, state: MissionState) -> Option<Duration> {
        let secs = match state {
            MissionState::Manual => return None,
            MissionState::Arming => self.arming_timeout_secs,
            MissionState::Planning => self.planning_timeout_secs,
            MissionState::Takeoff => self.takeoff_timeout_secs,
            MissionState::Waypoint => self.waypoint_timeout_secs,
            MissionState::Landing => self.landing_timeout_secs,
            MissionState::Disarming => self.disarming_timeout_secs,
        };
        Some(Duration::from_secs(secs))
    }
}
