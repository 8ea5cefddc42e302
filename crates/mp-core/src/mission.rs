//! Event-driven mission state machine.
//!
//! The controller owns the flight state, the waypoint queue and the latest
//! telemetry snapshot. Telemetry arrives as [`MissionEvent`]s; each event is
//! matched against the current state and fires at most one transition. On
//! entry to a state the controller issues the matching commands through the
//! [`VehicleLink`] seam.
//!
//! Planning is not run inline: entering [`MissionState::Planning`] is reported
//! to the caller, which runs the planner wherever it likes and posts the result
//! back as [`MissionEvent::PlanCompleted`]. No takeoff is commanded before a
//! successful plan has been stored.

use crate::config::MissionConfig;
use crate::error::{MissionError, PlanningError, TransportError};
use crate::models::{GlobalPosition, LocalPosition, LocalVelocity, VehicleStatus, Waypoint};
use crate::planner::Plan;
use crate::queue::WaypointQueue;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionState {
    #[default]
    Manual,
    Arming,
    Planning,
    Takeoff,
    Waypoint,
    Landing,
    Disarming,
}

/// Everything the controller reacts to.
#[derive(Debug, Clone)]
pub enum MissionEvent {
    LocalPosition(LocalPosition),
    LocalVelocity(LocalVelocity),
    GlobalPosition(GlobalPosition),
    /// Armed/guided update; doubles as the mission-active notification.
    State(VehicleStatus),
    PlanCompleted(Result<Plan, PlanningError>),
}

/// Commands the controller can issue to the vehicle.
///
/// Implementations must not block: the controller calls these from the single
/// event-dispatch path.
pub trait VehicleLink {
    fn arm(&mut self) -> Result<(), TransportError>;
    fn disarm(&mut self) -> Result<(), TransportError>;
    fn take_control(&mut self) -> Result<(), TransportError>;
    fn release_control(&mut self) -> Result<(), TransportError>;
    fn set_home_position(&mut self, home: GlobalPosition) -> Result<(), TransportError>;
    fn takeoff(&mut self, altitude: f64) -> Result<(), TransportError>;
    fn land(&mut self) -> Result<(), TransportError>;
    fn cmd_position(&mut self, target: Waypoint) -> Result<(), TransportError>;
    /// Publish the planned route for visualisation.
    fn send_waypoints(&mut self, waypoints: &[Waypoint]) -> Result<(), TransportError>;
    /// End the session with the vehicle.
    fn stop(&mut self) -> Result<(), TransportError>;
}

/// Read-only view of the controller for diagnostics and tests.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSnapshot {
    pub state: MissionState,
    pub in_mission: bool,
    pub plan_ready: bool,
    pub target: Waypoint,
    pub remaining_waypoints: usize,
    pub waypoints_flown: usize,
    pub status: VehicleStatus,
    pub local_position: LocalPosition,
    pub local_velocity: LocalVelocity,
    pub global_position: GlobalPosition,
    pub home: GlobalPosition,
    pub failure: Option<String>,
}

/// Outcome of feeding one event: the state entered, if any.
pub type Transition = Option<MissionState>;

pub struct MissionController<L: VehicleLink> {
    link: L,
    config: MissionConfig,
    state: MissionState,
    state_entered_at: Instant,
    in_mission: bool,
    plan_ready: bool,
    target: Waypoint,
    waypoints: WaypointQueue,
    waypoints_flown: usize,
    status: VehicleStatus,
    local_position: LocalPosition,
    local_velocity: LocalVelocity,
    global_position: GlobalPosition,
    home: GlobalPosition,
    failure: Option<String>,
}

impl<L: VehicleLink> MissionController<L> {
    pub fn new(link: L, config: MissionConfig) -> Self {
        Self {
            link,
            config,
            state: MissionState::Manual,
            state_entered_at: Instant::now(),
            in_mission: true,
            plan_ready: false,
            target: Waypoint::default(),
            waypoints: WaypointQueue::new(),
            waypoints_flown: 0,
            status: VehicleStatus::default(),
            local_position: LocalPosition::default(),
            local_velocity: LocalVelocity::default(),
            global_position: GlobalPosition::default(),
            home: GlobalPosition::default(),
            failure: None,
        }
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn in_mission(&self) -> bool {
        self.in_mission
    }

    /// True once the controller is back in `Manual` with the mission flag cleared.
    pub fn is_finished(&self) -> bool {
        self.state == MissionState::Manual && !self.in_mission
    }

    pub fn global_position(&self) -> GlobalPosition {
        self.global_position
    }

    pub fn waypoints(&self) -> &WaypointQueue {
        &self.waypoints
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            state: self.state,
            in_mission: self.in_mission,
            plan_ready: self.plan_ready,
            target: self.target,
            remaining_waypoints: self.waypoints.len(),
            waypoints_flown: self.waypoints_flown,
            status: self.status,
            local_position: self.local_position,
            local_velocity: self.local_velocity,
            global_position: self.global_position,
            home: self.home,
            failure: self.failure.clone(),
        }
    }

    /// Feed one event. Fires at most one transition.
    pub fn handle(&mut self, event: MissionEvent) -> Result<Transition, MissionError> {
        match event {
            MissionEvent::LocalPosition(position) => {
                self.local_position = position;
                self.on_local_position()
            }
            MissionEvent::LocalVelocity(velocity) => {
                self.local_velocity = velocity;
                self.on_local_velocity()
            }
            MissionEvent::GlobalPosition(position) => {
                self.global_position = position;
                Ok(None)
            }
            MissionEvent::State(status) => {
                self.status = status;
                self.on_state()
            }
            MissionEvent::PlanCompleted(result) => self.on_plan(result),
        }
    }

    fn on_local_position(&mut self) -> Result<Transition, MissionError> {
        match self.state {
            MissionState::Takeoff => {
                let reached = self.config.takeoff_altitude_ratio * self.target.altitude;
                if self.local_position.altitude() >= reached {
                    return self.waypoint_transition().map(Some);
                }
            }
            MissionState::Waypoint => {
                let distance = self
                    .local_position
                    .horizontal_distance_to(self.target.north, self.target.east);
                if distance < self.config.arrival_radius {
                    if !self.waypoints.is_empty() {
                        return self.waypoint_transition().map(Some);
                    }
                    if self.local_velocity.horizontal_speed() < self.config.landing_speed {
                        return self.landing_transition().map(Some);
                    }
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn on_local_velocity(&mut self) -> Result<Transition, MissionError> {
        if self.state == MissionState::Landing {
            let above_home = self.global_position.altitude - self.home.altitude;
            if above_home < self.config.landing_altitude
                && self.local_position.down.abs() < self.config.landing_down
            {
                return self.disarming_transition().map(Some);
            }
        }
        Ok(None)
    }

    fn on_state(&mut self) -> Result<Transition, MissionError> {
        if !self.in_mission {
            return Ok(None);
        }
        match self.state {
            MissionState::Manual => self.arming_transition().map(Some),
            MissionState::Arming if self.status.armed => Ok(Some(self.planning_transition())),
            MissionState::Planning if self.plan_ready => self.takeoff_transition().map(Some),
            MissionState::Disarming if !self.status.armed && !self.status.guided => {
                self.manual_transition().map(Some)
            }
            _ => Ok(None),
        }
    }

    fn on_plan(&mut self, result: Result<Plan, PlanningError>) -> Result<Transition, MissionError> {
        if self.state != MissionState::Planning || self.plan_ready {
            return Err(MissionError::UnexpectedPlan { state: self.state });
        }
        let plan = match result {
            Ok(plan) => plan,
            Err(err) => {
                tracing::error!(error = %err, "planning failed");
                self.failure = Some(err.to_string());
                self.abort("planning failed")?;
                return Err(err.into());
            }
        };

        self.home = plan.home;
        self.target = Waypoint::new(
            self.local_position.north,
            self.local_position.east,
            plan.target_altitude,
            0.0,
        );
        self.waypoints = plan.route.waypoints;
        self.plan_ready = true;
        tracing::info!(
            waypoints = self.waypoints.len(),
            target_altitude = plan.target_altitude,
            "plan stored"
        );

        self.link.set_home_position(plan.home)?;
        if let Err(err) = self.link.send_waypoints(&self.waypoints.to_vec()) {
            tracing::warn!(error = %err, "failed to publish waypoints");
        }
        Ok(None)
    }

    /// Steer the mission toward a safe state. Airborne states land; ground
    /// states before takeoff disarm directly. Returns `None` from `Landing`
    /// and `Disarming`, which have nothing safer to fall back to.
    pub fn abort(&mut self, reason: &str) -> Result<Transition, MissionError> {
        tracing::warn!(state = ?self.state, reason, "aborting mission");
        if self.failure.is_none() {
            self.failure = Some(reason.to_string());
        }
        match self.state {
            MissionState::Takeoff | MissionState::Waypoint => {
                self.waypoints.clear();
                self.landing_transition().map(Some)
            }
            MissionState::Arming | MissionState::Planning => {
                self.waypoints.clear();
                self.disarming_transition().map(Some)
            }
            MissionState::Manual => {
                self.in_mission = false;
                Ok(None)
            }
            MissionState::Landing | MissionState::Disarming => Ok(None),
        }
    }

    /// Fails when the current state has waited for its guard longer than the
    /// configured bound.
    pub fn check_guard_timeout(&self, now: Instant) -> Result<(), MissionError> {
        if self.is_finished() {
            return Ok(());
        }
        let Some(limit) = self.config.guard_timeout(self.state) else {
            return Ok(());
        };
        let elapsed = now.saturating_duration_since(self.state_entered_at);
        if elapsed > limit {
            return Err(MissionError::GuardTimeout {
                state: self.state,
                elapsed,
            });
        }
        Ok(())
    }

    fn enter(&mut self, state: MissionState) {
        self.state = state;
        self.state_entered_at = Instant::now();
    }

    fn arming_transition(&mut self) -> Result<MissionState, MissionError> {
        self.enter(MissionState::Arming);
        self.plan_ready = false;
        self.waypoints_flown = 0;
        tracing::info!("arming transition");
        self.link.arm()?;
        self.link.take_control()?;
        Ok(self.state)
    }

    fn planning_transition(&mut self) -> MissionState {
        self.enter(MissionState::Planning);
        tracing::info!("planning transition");
        self.state
    }

    fn takeoff_transition(&mut self) -> Result<MissionState, MissionError> {
        self.enter(MissionState::Takeoff);
        tracing::info!(altitude = self.target.altitude, "takeoff transition");
        self.link.takeoff(self.target.altitude)?;
        Ok(self.state)
    }

    fn waypoint_transition(&mut self) -> Result<MissionState, MissionError> {
        let Some(target) = self.waypoints.pop_front() else {
            return self.landing_transition();
        };
        self.enter(MissionState::Waypoint);
        self.target = target;
        self.waypoints_flown += 1;
        tracing::info!(
            ?target,
            remaining = self.waypoints.len(),
            "waypoint transition"
        );
        self.link.cmd_position(target)?;
        Ok(self.state)
    }

    fn landing_transition(&mut self) -> Result<MissionState, MissionError> {
        self.enter(MissionState::Landing);
        tracing::info!("landing transition");
        self.link.land()?;
        Ok(self.state)
    }

    fn disarming_transition(&mut self) -> Result<MissionState, MissionError> {
        self.enter(MissionState::Disarming);
        tracing::info!("disarm transition");
        self.link.disarm()?;
        self.link.release_control()?;
        Ok(self.state)
    }

    fn manual_transition(&mut self) -> Result<MissionState, MissionError> {
        self.enter(MissionState::Manual);
        self.in_mission = false;
        tracing::info!("manual transition");
        self.link.stop()?;
        Ok(self.state)
    }
}
