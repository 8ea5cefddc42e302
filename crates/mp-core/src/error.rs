//! Error taxonomy for planning, the vehicle link, and the mission controller.

use crate::mission::MissionState;
use crate::models::GridCell;
use std::time::Duration;
use thiserror::Error;

/// Reasons a mission plan could not be produced. All are terminal for the
/// current mission attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("obstacle map unavailable: {0}")]
    MapUnavailable(String),
    #[error("start position ({north:.1}, {east:.1}) lies outside the occupancy grid")]
    StartOutsideGrid { north: f64, east: f64 },
    #[error("start cell {0:?} is inside an obstacle")]
    StartBlocked(GridCell),
    #[error("no free goal cell found after {attempts} samples")]
    NoFreeGoal { attempts: usize },
    #[error("no path from {start:?} to {goal:?}")]
    NoPath { start: GridCell, goal: GridCell },
    #[error("search gave up after expanding {expanded} cells")]
    SearchBudgetExhausted { expanded: usize },
}

/// Failures talking to the vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("vehicle link disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Planning(#[from] PlanningError),
    #[error("{state:?} guard not satisfied after {elapsed:?}")]
    GuardTimeout { state: MissionState, elapsed: Duration },
    #[error("plan result received while in {state:?}")]
    UnexpectedPlan { state: MissionState },
}
