//! Core data models for the mission controller.

use serde::{Deserialize, Serialize};

/// Position in the local NED frame centred on the home reference.
///
/// `down` is negative when the vehicle is above home.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalPosition {
    pub north: f64,
    pub east: f64,
    pub down: f64,
}

impl LocalPosition {
    pub fn new(north: f64, east: f64, down: f64) -> Self {
        Self { north, east, down }
    }

    /// Height above home (positive up).
    pub fn altitude(&self) -> f64 {
        -self.down
    }

    /// Horizontal distance to a north/east point.
    pub fn horizontal_distance_to(&self, north: f64, east: f64) -> f64 {
        (self.north - north).hypot(self.east - east)
    }
}

/// Velocity in the local NED frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalVelocity {
    pub north: f64,
    pub east: f64,
    pub down: f64,
}

impl LocalVelocity {
    pub fn new(north: f64, east: f64, down: f64) -> Self {
        Self { north, east, down }
    }

    pub fn horizontal_speed(&self) -> f64 {
        self.north.hypot(self.east)
    }
}

/// Geodetic position. Altitude is metres above the reference ellipsoid
/// (or whatever datum the home position shares).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

impl GlobalPosition {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }
}

/// Armed/guided flags reported by the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub armed: bool,
    pub guided: bool,
}

/// A commanded position: north, east, altitude (positive up) and heading.
///
/// Serialized as a bare `[north, east, altitude, heading]` array, which is
/// what the visualisation peer expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Waypoint {
    pub north: f64,
    pub east: f64,
    pub altitude: f64,
    pub heading: f64,
}

impl Waypoint {
    pub fn new(north: f64, east: f64, altitude: f64, heading: f64) -> Self {
        Self {
            north,
            east,
            altitude,
            heading,
        }
    }
}

impl From<[f64; 4]> for Waypoint {
    fn from(value: [f64; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Waypoint> for [f64; 4] {
    fn from(value: Waypoint) -> Self {
        [value.north, value.east, value.altitude, value.heading]
    }
}

/// A cell in the occupancy grid, as `(north_index, east_index)`.
pub type GridCell = (usize, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waypoint_serializes_as_array() {
        let wp = Waypoint::new(10.0, -4.0, 5.0, 0.0);
        let json = serde_json::to_string(&wp).unwrap();
        assert_eq!(json, "[10.0,-4.0,5.0,0.0]");

        let back: Waypoint = serde_json::from_str("[1.0,2.0,3.0,0.5]").unwrap();
        assert_eq!(back, Waypoint::new(1.0, 2.0, 3.0, 0.5));
    }

    #[test]
    fn altitude_is_negated_down() {
        let pos = LocalPosition::new(0.0, 0.0, -4.5);
        assert_eq!(pos.altitude(), 4.5);
    }

    #[test]
    fn horizontal_measures_ignore_vertical() {
        let pos = LocalPosition::new(3.0, 4.0, -100.0);
        assert!((pos.horizontal_distance_to(0.0, 0.0) - 5.0).abs() < 1e-12);

        let vel = LocalVelocity::new(0.6, 0.8, 12.0);
        assert!((vel.horizontal_speed() - 1.0).abs() < 1e-12);
    }
}
