//! First-order kinematic vehicle for simulation and tests.

use mp_core::{
    global_to_local, local_to_global, GlobalPosition, LocalPosition, LocalVelocity, VehicleStatus,
    Waypoint,
};
use mp_link::{VehicleCommand, VehicleMessage};

/// Motion limits for the simulated vehicle.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Horizontal speed in m/s
    pub cruise_speed: f64,
    /// Climb rate in m/s
    pub climb_rate: f64,
    /// Descent rate in m/s
    pub descent_rate: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cruise_speed: 5.0,
            climb_rate: 2.0,
            descent_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Goal {
    Hold,
    Climb(f64),
    Goto(Waypoint),
    Land,
}

/// A vehicle on flat ground at altitude zero. Position truth is kept in the
/// global frame so moving the home reference does not move the vehicle.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    config: SimConfig,
    home: GlobalPosition,
    global: GlobalPosition,
    velocity: LocalVelocity,
    status: VehicleStatus,
    goal: Goal,
    published: Vec<Waypoint>,
    commands: Vec<VehicleCommand>,
}

impl SimVehicle {
    /// Park the vehicle on the ground at `start`, which also becomes home.
    pub fn new(start: GlobalPosition, config: SimConfig) -> Self {
        let ground = GlobalPosition {
            altitude: 0.0,
            ..start
        };
        Self {
            config,
            home: ground,
            global: ground,
            velocity: LocalVelocity::default(),
            status: VehicleStatus::default(),
            goal: Goal::Hold,
            published: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn home(&self) -> GlobalPosition {
        self.home
    }

    pub fn global_position(&self) -> GlobalPosition {
        self.global
    }

    pub fn local_position(&self) -> LocalPosition {
        global_to_local(&self.global, &self.home)
    }

    pub fn on_ground(&self) -> bool {
        self.global.altitude <= 0.0
    }

    /// The last route published for display.
    pub fn published_waypoints(&self) -> &[Waypoint] {
        &self.published
    }

    /// Every command received, in order.
    pub fn commands(&self) -> &[VehicleCommand] {
        &self.commands
    }

    /// Apply one command. Returns `false` once the session is over.
    pub fn apply(&mut self, command: &VehicleCommand) -> bool {
        self.commands.push(command.clone());
        match command {
            VehicleCommand::Arm => {
                if self.on_ground() {
                    self.status.armed = true;
                }
            }
            VehicleCommand::Disarm => {
                if self.on_ground() {
                    self.status.armed = false;
                    self.goal = Goal::Hold;
                } else {
                    tracing::warn!("refusing to disarm in flight");
                }
            }
            VehicleCommand::TakeControl => self.status.guided = true,
            VehicleCommand::ReleaseControl => self.status.guided = false,
            VehicleCommand::SetHome { home } => {
                tracing::info!(?home, "home position set");
                self.home = *home;
            }
            VehicleCommand::Takeoff { altitude } => {
                if self.controllable() {
                    self.goal = Goal::Climb(*altitude);
                }
            }
            VehicleCommand::Land => {
                if self.controllable() {
                    self.goal = Goal::Land;
                }
            }
            VehicleCommand::Position {
                north,
                east,
                altitude,
                heading,
            } => {
                if self.controllable() {
                    self.goal = Goal::Goto(Waypoint::new(*north, *east, *altitude, *heading));
                }
            }
            VehicleCommand::Waypoints { waypoints } => self.published = waypoints.clone(),
            VehicleCommand::Stop => return false,
        }
        true
    }

    fn controllable(&self) -> bool {
        self.status.armed && self.status.guided
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let mut local = self.local_position();
        let start = local;
        let ground_down = self.home.altitude;

        if self.status.armed {
            match self.goal {
                Goal::Hold => {}
                Goal::Climb(altitude) => {
                    local.down = approach(local.down, -altitude, self.config.climb_rate * dt);
                }
                Goal::Goto(target) => {
                    let dn = target.north - local.north;
                    let de = target.east - local.east;
                    let distance = dn.hypot(de);
                    let travel = (self.config.cruise_speed * dt).min(distance);
                    if distance > f64::EPSILON {
                        local.north += dn / distance * travel;
                        local.east += de / distance * travel;
                    }
                    let rate = if -target.altitude < local.down {
                        self.config.climb_rate
                    } else {
                        self.config.descent_rate
                    };
                    local.down = approach(local.down, -target.altitude, rate * dt);
                }
                Goal::Land => {
                    local.down = approach(local.down, ground_down, self.config.descent_rate * dt);
                }
            }
        }

        // Ground sits at global altitude zero.
        local.down = local.down.min(ground_down);
        self.velocity = LocalVelocity::new(
            (local.north - start.north) / dt,
            (local.east - start.east) / dt,
            (local.down - start.down) / dt,
        );
        self.global = local_to_global(&local, &self.home);
        if self.global.altitude < 1e-9 {
            self.global.altitude = 0.0;
        }
    }

    /// One telemetry frame, in the order the controller expects to see it.
    pub fn telemetry(&self) -> Vec<VehicleMessage> {
        vec![
            VehicleMessage::GlobalPosition(self.global),
            VehicleMessage::LocalPosition(self.local_position()),
            VehicleMessage::LocalVelocity(self.velocity),
            VehicleMessage::State(self.status),
        ]
    }
}

fn approach(current: f64, target: f64, max_step: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step * delta.signum()
    }
}
