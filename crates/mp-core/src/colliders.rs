//! Obstacle map reader.
//!
//! The map is a CSV file whose first line carries the home anchor
//! (`lat0 37.792480, lon0 -122.397450`), followed by a column header and one
//! row per obstacle: `posX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ` (north,
//! east and altitude of the centre plus half extents, in meters).

use crate::error::PlanningError;
use crate::models::GlobalPosition;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An axis-aligned box obstacle in the local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub north: f64,
    pub east: f64,
    pub altitude: f64,
    pub half_north: f64,
    pub half_east: f64,
    pub half_altitude: f64,
}

/// The parsed obstacle dataset plus the anchor it is expressed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleMap {
    pub lat0: f64,
    pub lon0: f64,
    pub obstacles: Vec<Obstacle>,
}

impl ObstacleMap {
    /// Read and parse a map file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlanningError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PlanningError::MapUnavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, PlanningError> {
        let mut lines = text.lines();
        let anchor = lines
            .next()
            .ok_or_else(|| PlanningError::MapUnavailable("empty map".to_string()))?;
        let (lat0, lon0) = parse_anchor(anchor)?;

        // Column header.
        lines.next();

        let mut obstacles = Vec::new();
        for (idx, line) in lines.enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            obstacles.push(parse_obstacle(line).ok_or_else(|| {
                PlanningError::MapUnavailable(format!("malformed obstacle row {}: {line}", idx + 3))
            })?);
        }

        Ok(Self {
            lat0,
            lon0,
            obstacles,
        })
    }

    /// The home reference anchoring the local frame, at zero altitude.
    pub fn home(&self) -> GlobalPosition {
        GlobalPosition::new(self.lon0, self.lat0, 0.0)
    }
}

fn parse_anchor(line: &str) -> Result<(f64, f64), PlanningError> {
    let mut lat0 = None;
    let mut lon0 = None;
    for part in line.split(',') {
        let mut tokens = part.split_whitespace();
        let (Some(key), Some(value)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let value: f64 = match value.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        match key {
            "lat0" => lat0 = Some(value),
            "lon0" => lon0 = Some(value),
            _ => {}
        }
    }
    match (lat0, lon0) {
        (Some(lat0), Some(lon0)) => Ok((lat0, lon0)),
        _ => Err(PlanningError::MapUnavailable(format!(
            "missing lat0/lon0 anchor in '{line}'"
        ))),
    }
}

fn parse_obstacle(line: &str) -> Option<Obstacle> {
    let values: Vec<f64> = line
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if values.len() != 6 {
        return None;
    }
    Some(Obstacle {
        north: values[0],
        east: values[1],
        altitude: values[2],
        half_north: values[3],
        half_east: values[4],
        half_altitude: values[5],
    })
}
