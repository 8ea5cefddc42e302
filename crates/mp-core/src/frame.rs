//! Conversion between geodetic coordinates and the local NED frame.
//!
//! The local frame is a tangent plane anchored at the home position. North and
//! east offsets are scaled with the latitude-aware WGS84 approximations below,
//! which keeps errors well under a metre across a city-sized obstacle map.

use crate::models::{GlobalPosition, LocalPosition};

// ==== ENU (East-North-Up) scaling ====

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a global position to local NED coordinates relative to `home`.
pub fn global_to_local(position: &GlobalPosition, home: &GlobalPosition) -> LocalPosition {
    let north = (position.latitude - home.latitude) * meters_per_deg_lat(home.latitude);
    let east = (position.longitude - home.longitude) * meters_per_deg_lon(home.latitude);
    LocalPosition {
        north,
        east,
        down: -(position.altitude - home.altitude),
    }
}

/// Convert local NED coordinates relative to `home` back to a global position.
pub fn local_to_global(position: &LocalPosition, home: &GlobalPosition) -> GlobalPosition {
    let lat_scale = meters_per_deg_lat(home.latitude).max(1e-9);
    let lon_scale = meters_per_deg_lon(home.latitude).max(1e-9);
    GlobalPosition {
        longitude: home.longitude + position.east / lon_scale,
        latitude: home.latitude + position.north / lat_scale,
        altitude: home.altitude - position.down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: GlobalPosition = GlobalPosition {
        longitude: -122.397450,
        latitude: 37.792480,
        altitude: 0.0,
    };

    #[test]
    fn home_maps_to_origin() {
        let local = global_to_local(&HOME, &HOME);
        assert_eq!(local, LocalPosition::default());
    }

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let north = GlobalPosition {
            latitude: HOME.latitude + 1.0,
            ..HOME
        };
        let local = global_to_local(&north, &HOME);
        assert!((local.north - 111_000.0).abs() < 1_000.0);
        assert!(local.east.abs() < 1e-9);
    }

    #[test]
    fn local_global_round_trip_is_stable() {
        let local = LocalPosition::new(-212.5, 187.25, -5.0);
        let global = local_to_global(&local, &HOME);
        let back = global_to_local(&global, &HOME);
        assert!((back.north - local.north).abs() < 1e-6);
        assert!((back.east - local.east).abs() < 1e-6);
        assert!((back.down - local.down).abs() < 1e-9);
        assert!((global.altitude - 5.0).abs() < 1e-9);
    }
}
