//! Async mission session: the single thread of control for one vehicle.
//!
//! Telemetry, plan results, guard-timeout ticks and the operator interrupt
//! are multiplexed into one loop that owns the [`MissionController`]. Planning
//! runs on a blocking worker and its result is posted back into the loop.

use crate::link::CommandSender;
use crate::navlog::NavLog;
use crate::protocol::VehicleMessage;
use anyhow::Result;
use mp_core::{
    MissionConfig, MissionController, MissionError, MissionEvent, MissionState, PathPlanner, Plan,
    PlanningError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::interval;

const GUARD_CHECK_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub mission: MissionConfig,
    /// Seed for goal sampling; drawn from the OS when unset.
    pub seed: Option<u64>,
}

/// How a session ended.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub completed: bool,
    pub final_state: MissionState,
    pub waypoints_flown: usize,
    pub failure: Option<String>,
}

pub struct MissionSession {
    controller: MissionController<CommandSender>,
    planner: Arc<PathPlanner>,
    telemetry: mpsc::UnboundedReceiver<VehicleMessage>,
    plan_tx: mpsc::UnboundedSender<Result<Plan, PlanningError>>,
    plan_rx: mpsc::UnboundedReceiver<Result<Plan, PlanningError>>,
    navlog: Option<NavLog>,
    seed: Option<u64>,
}

impl MissionSession {
    pub fn new(
        commands: CommandSender,
        telemetry: mpsc::UnboundedReceiver<VehicleMessage>,
        planner: PathPlanner,
        config: SessionConfig,
    ) -> Self {
        let (plan_tx, plan_rx) = mpsc::unbounded_channel();
        Self {
            controller: MissionController::new(commands, config.mission),
            planner: Arc::new(planner),
            telemetry,
            plan_tx,
            plan_rx,
            navlog: None,
            seed: config.seed,
        }
    }

    pub fn with_navlog(mut self, navlog: NavLog) -> Self {
        self.navlog = Some(navlog);
        self
    }

    /// Run until the controller returns to `Manual` or the link closes.
    /// `shutdown` resolving aborts the mission; the loop keeps running so
    /// the vehicle can be brought down.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<MissionReport> {
        tokio::pin!(shutdown);
        let mut interrupted = false;
        let mut ticker = interval(Duration::from_millis(GUARD_CHECK_INTERVAL_MS));

        tracing::info!("mission session started");
        while !self.controller.is_finished() {
            tokio::select! {
                message = self.telemetry.recv() => {
                    let Some(message) = message else {
                        tracing::warn!(state = ?self.controller.state(), "vehicle link closed");
                        self.abort("vehicle link closed");
                        break;
                    };
                    if let Some(log) = self.navlog.as_mut() {
                        if let Err(e) = log.record_message(&message) {
                            tracing::warn!(error = %e, "failed to write navigation log");
                        }
                    }
                    self.dispatch(message.into());
                }
                Some(result) = self.plan_rx.recv() => {
                    self.dispatch(MissionEvent::PlanCompleted(result));
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.controller.check_guard_timeout(Instant::now()) {
                        tracing::error!(error = %err, "guard timed out");
                        if !self.abort(&err.to_string()) {
                            tracing::error!(
                                state = ?self.controller.state(),
                                "no recovery from stalled state, ending session"
                            );
                            break;
                        }
                    }
                }
                _ = &mut shutdown, if !interrupted => {
                    interrupted = true;
                    tracing::warn!("interrupt received");
                    self.abort("operator interrupt");
                }
            }
        }

        let snapshot = self.controller.snapshot();
        if let Some(log) = self.navlog.take() {
            if let Err(e) = log.finish() {
                tracing::warn!(error = %e, "failed to close navigation log");
            }
        }

        let report = MissionReport {
            completed: self.controller.is_finished() && snapshot.failure.is_none(),
            final_state: snapshot.state,
            waypoints_flown: snapshot.waypoints_flown,
            failure: snapshot.failure,
        };
        tracing::info!(?report, "mission session finished");
        Ok(report)
    }

    fn dispatch(&mut self, event: MissionEvent) {
        match self.controller.handle(event) {
            Ok(Some(state)) => {
                self.log_transition();
                if state == MissionState::Planning {
                    self.spawn_planner();
                }
            }
            Ok(None) => {}
            Err(MissionError::UnexpectedPlan { state }) => {
                tracing::warn!(?state, "discarding late plan result");
            }
            Err(MissionError::Planning(err)) => {
                tracing::error!(error = %err, "mission planning failed");
                self.log_transition();
            }
            Err(err) => {
                tracing::error!(error = %err, "mission event failed");
                self.abort(&err.to_string());
            }
        }
    }

    /// Returns `false` when the abort left the mission stuck where it was.
    fn abort(&mut self, reason: &str) -> bool {
        match self.controller.abort(reason) {
            Ok(Some(_)) => {
                self.log_transition();
                true
            }
            Ok(None) => self.controller.is_finished(),
            Err(err) => {
                tracing::error!(error = %err, "abort failed");
                false
            }
        }
    }

    fn log_transition(&mut self) {
        if let Some(log) = self.navlog.as_mut() {
            if let Err(e) = log.record_transition(&self.controller.snapshot()) {
                tracing::warn!(error = %e, "failed to write navigation log");
            }
        }
    }

    fn spawn_planner(&self) {
        let planner = Arc::clone(&self.planner);
        let position = self.controller.global_position();
        let seed = self.seed;
        let tx = self.plan_tx.clone();
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let result = match seed {
                Some(seed) => planner.plan(&position, &mut StdRng::seed_from_u64(seed)),
                None => planner.plan(&position, &mut rand::rng()),
            };
            tracing::info!(elapsed = ?started.elapsed(), ok = result.is_ok(), "planning finished");
            let _ = tx.send(result);
        });
    }
}
