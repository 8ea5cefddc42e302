//! Non-blocking command sender implementing the controller's vehicle seam.

use crate::protocol::VehicleCommand;
use mp_core::{GlobalPosition, TransportError, VehicleLink, Waypoint};
use tokio::sync::mpsc;

/// Queues commands for the link writer task. Sending never blocks, so it is
/// safe to call from the controller's event handlers.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<VehicleCommand>,
}

impl CommandSender {
    pub fn new(tx: mpsc::UnboundedSender<VehicleCommand>) -> Self {
        Self { tx }
    }

    /// A sender plus the receiving end, for in-process vehicles and tests.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<VehicleCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, command: VehicleCommand) -> Result<(), TransportError> {
        tracing::debug!(?command, "sending command");
        self.tx
            .send(command)
            .map_err(|_| TransportError::Disconnected)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl VehicleLink for CommandSender {
    fn arm(&mut self) -> Result<(), TransportError> {
        self.send(VehicleCommand::Arm)
    }

    fn disarm(&mut self) -> Result<(), TransportError> {
        self.send(VehicleCommand::Disarm)
    }

    fn take_control(&mut self) -> Result<(), TransportError> {
        self.send(VehicleCommand::TakeControl)
    }

    fn release_control(&mut self) -> Result<(), TransportError> {
        self.send(VehicleCommand::ReleaseControl)
    }

    fn set_home_position(&mut self, home: GlobalPosition) -> Result<(), TransportError> {
        self.send(VehicleCommand::SetHome { home })
    }

    fn takeoff(&mut self, altitude: f64) -> Result<(), TransportError> {
        self.send(VehicleCommand::Takeoff { altitude })
    }

    fn land(&mut self) -> Result<(), TransportError> {
        self.send(VehicleCommand::Land)
    }

    fn cmd_position(&mut self, target: Waypoint) -> Result<(), TransportError> {
        self.send(VehicleCommand::Position {
            north: target.north,
            east: target.east,
            altitude: target.altitude,
            heading: target.heading,
        })
    }

    fn send_waypoints(&mut self, waypoints: &[Waypoint]) -> Result<(), TransportError> {
        tracing::info!(count = waypoints.len(), "sending waypoints to simulator");
        self.send(VehicleCommand::Waypoints {
            waypoints: waypoints.to_vec(),
        })
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        self.send(VehicleCommand::Stop)
    }
}
