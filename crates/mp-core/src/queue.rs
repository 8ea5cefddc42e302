//! Ordered queue of waypoints in flight order.

use crate::models::Waypoint;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Waypoints still to be flown. Popped waypoints are discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointQueue {
    waypoints: VecDeque<Waypoint>,
}

impl WaypointQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn pop_front(&mut self) -> Option<Waypoint> {
        self.waypoints.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn to_vec(&self) -> Vec<Waypoint> {
        self.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }
}

impl FromIterator<Waypoint> for WaypointQueue {
    fn from_iter<T: IntoIterator<Item = Waypoint>>(iter: T) -> Self {
        Self {
            waypoints: iter.into_iter().collect(),
        }
    }
}
