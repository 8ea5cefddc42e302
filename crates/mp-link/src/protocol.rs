//! JSON wire protocol between the mission process and the vehicle.
//!
//! Every WebSocket text frame carries one message tagged by `type`.

use mp_core::{
    GlobalPosition, LocalPosition, LocalVelocity, MissionEvent, VehicleStatus, Waypoint,
};
use serde::{Deserialize, Serialize};

/// Commands sent to the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VehicleCommand {
    Arm,
    Disarm,
    TakeControl,
    ReleaseControl,
    SetHome {
        home: GlobalPosition,
    },
    Takeoff {
        altitude: f64,
    },
    Land,
    Position {
        north: f64,
        east: f64,
        altitude: f64,
        heading: f64,
    },
    /// Planned route for display only; the vehicle does not fly it.
    Waypoints {
        waypoints: Vec<Waypoint>,
    },
    Stop,
}

/// Telemetry received from the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VehicleMessage {
    LocalPosition(LocalPosition),
    LocalVelocity(LocalVelocity),
    GlobalPosition(GlobalPosition),
    State(VehicleStatus),
}

impl From<VehicleMessage> for MissionEvent {
    fn from(message: VehicleMessage) -> Self {
        match message {
            VehicleMessage::LocalPosition(p) => MissionEvent::LocalPosition(p),
            VehicleMessage::LocalVelocity(v) => MissionEvent::LocalVelocity(v),
            VehicleMessage::GlobalPosition(p) => MissionEvent::GlobalPosition(p),
            VehicleMessage::State(s) => MissionEvent::State(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_wire_shape() {
        let cmd = VehicleCommand::Position {
            north: 10.0,
            east: -3.0,
            altitude: 5.0,
            heading: 0.0,
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"type": "position", "north": 10.0, "east": -3.0, "altitude": 5.0, "heading": 0.0})
        );
        assert_eq!(
            serde_json::to_value(VehicleCommand::TakeControl).unwrap(),
            json!({"type": "take_control"})
        );
    }

    #[test]
    fn published_waypoints_are_arrays() {
        let cmd = VehicleCommand::Waypoints {
            waypoints: vec![Waypoint::new(1.0, 2.0, 5.0, 0.0)],
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"type": "waypoints", "waypoints": [[1.0, 2.0, 5.0, 0.0]]})
        );
    }

    #[test]
    fn telemetry_parses_into_events() {
        let msg: VehicleMessage =
            serde_json::from_str(r#"{"type":"state","armed":true,"guided":false}"#).unwrap();
        assert_eq!(
            msg,
            VehicleMessage::State(VehicleStatus {
                armed: true,
                guided: false
            })
        );
        assert!(matches!(MissionEvent::from(msg), MissionEvent::State(s) if s.armed));

        let msg: VehicleMessage = serde_json::from_str(
            r#"{"type":"local_position","north":1.5,"east":-2.0,"down":-5.0}"#,
        )
        .unwrap();
        assert_eq!(msg, VehicleMessage::LocalPosition(LocalPosition::new(1.5, -2.0, -5.0)));
    }
}
