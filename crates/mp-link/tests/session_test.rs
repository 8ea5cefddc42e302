//! Session loop tests against a scripted ground-only vehicle.

use mp_core::{
    GlobalPosition, MissionConfig, MissionState, OccupancyGrid, PathPlanner, PlannerConfig,
    VehicleStatus,
};
use mp_link::{CommandSender, MissionSession, SessionConfig, VehicleCommand, VehicleMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn planner_with_grid(grid: OccupancyGrid) -> PathPlanner {
    PathPlanner::with_grid(GlobalPosition::default(), grid, PlannerConfig::default())
}

/// Answers every arm/disarm/control command with the resulting state flags.
/// With `refuse_disarm` the vehicle stays armed no matter what it is told.
fn spawn_ground_vehicle(
    mut commands: mpsc::UnboundedReceiver<VehicleCommand>,
    telemetry: mpsc::UnboundedSender<VehicleMessage>,
    refuse_disarm: bool,
) -> tokio::task::JoinHandle<Vec<VehicleCommand>> {
    tokio::spawn(async move {
        let mut status = VehicleStatus::default();
        let mut seen = Vec::new();
        while let Some(cmd) = commands.recv().await {
            seen.push(cmd.clone());
            match cmd {
                VehicleCommand::Arm => status.armed = true,
                VehicleCommand::Disarm => status.armed = refuse_disarm,
                VehicleCommand::TakeControl => status.guided = true,
                VehicleCommand::ReleaseControl => status.guided = false,
                VehicleCommand::Stop => break,
                _ => continue,
            }
            if telemetry.send(VehicleMessage::State(status)).is_err() {
                break;
            }
        }
        seen
    })
}

#[tokio::test]
async fn planning_failure_disarms_and_finishes() {
    let (commands, command_rx) = CommandSender::channel();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();

    // The vehicle sits at home, which is off this grid.
    let planner = planner_with_grid(OccupancyGrid::empty(10, 10, 100, 100));
    let session = MissionSession::new(commands, telemetry_rx, planner, SessionConfig::default());

    let vehicle = spawn_ground_vehicle(command_rx, telemetry_tx.clone(), false);
    telemetry_tx
        .send(VehicleMessage::GlobalPosition(GlobalPosition::default()))
        .unwrap();
    telemetry_tx
        .send(VehicleMessage::State(VehicleStatus::default()))
        .unwrap();

    let report = timeout(Duration::from_secs(10), session.run(std::future::pending::<()>()))
        .await
        .expect("session should finish")
        .unwrap();

    assert!(!report.completed);
    assert_eq!(report.final_state, MissionState::Manual);
    assert_eq!(report.waypoints_flown, 0);
    assert!(report.failure.unwrap().contains("outside"));

    let seen = vehicle.await.unwrap();
    assert!(!seen.iter().any(|c| matches!(c, VehicleCommand::Takeoff { .. })));
    assert!(seen.contains(&VehicleCommand::Disarm));
    assert_eq!(seen.last(), Some(&VehicleCommand::Stop));
}

#[tokio::test]
async fn interrupt_before_start_ends_session() {
    let (commands, mut command_rx) = CommandSender::channel();
    let (_telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();
    let planner = planner_with_grid(OccupancyGrid::empty(10, 10, 0, 0));
    let session = MissionSession::new(commands, telemetry_rx, planner, SessionConfig::default());

    let report = timeout(Duration::from_secs(5), session.run(std::future::ready(())))
        .await
        .expect("session should finish")
        .unwrap();

    assert!(!report.completed);
    assert_eq!(report.failure.as_deref(), Some("operator interrupt"));
    assert!(command_rx.try_recv().is_err());
}

#[tokio::test]
async fn closed_link_ends_session() {
    let (commands, _command_rx) = CommandSender::channel();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();
    let planner = planner_with_grid(OccupancyGrid::empty(10, 10, 0, 0));
    let session = MissionSession::new(commands, telemetry_rx, planner, SessionConfig::default());

    telemetry_tx
        .send(VehicleMessage::State(VehicleStatus::default()))
        .unwrap();
    drop(telemetry_tx);

    let report = timeout(Duration::from_secs(5), session.run(std::future::pending::<()>()))
        .await
        .expect("session should finish")
        .unwrap();

    assert!(!report.completed);
    assert_eq!(report.final_state, MissionState::Disarming);
    assert_eq!(report.failure.as_deref(), Some("vehicle link closed"));
}

#[tokio::test(start_paused = true)]
async fn stalled_arming_times_out() {
    let (commands, mut command_rx) = CommandSender::channel();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();
    let planner = planner_with_grid(OccupancyGrid::empty(10, 10, 0, 0));
    let config = SessionConfig {
        mission: MissionConfig {
            arming_timeout_secs: 0,
            ..MissionConfig::default()
        },
        seed: Some(1),
    };
    let session = MissionSession::new(commands, telemetry_rx, planner, config);

    // The vehicle never reports armed.
    telemetry_tx
        .send(VehicleMessage::State(VehicleStatus::default()))
        .unwrap();

    let handle = tokio::spawn(session.run(std::future::pending::<()>()));

    let mut seen = Vec::new();
    while !seen.contains(&VehicleCommand::ReleaseControl) {
        let cmd = timeout(Duration::from_secs(5), command_rx.recv())
            .await
            .expect("abort should disarm")
            .expect("command channel open");
        seen.push(cmd);
    }
    assert_eq!(
        seen,
        vec![
            VehicleCommand::Arm,
            VehicleCommand::TakeControl,
            VehicleCommand::Disarm,
            VehicleCommand::ReleaseControl,
        ]
    );

    telemetry_tx
        .send(VehicleMessage::State(VehicleStatus::default()))
        .unwrap();
    let report = handle.await.unwrap().unwrap();
    assert_eq!(report.final_state, MissionState::Manual);
    assert!(report.failure.unwrap().contains("guard not satisfied"));
}

#[tokio::test]
async fn stuck_disarm_times_out_and_ends_session() {
    let (commands, command_rx) = CommandSender::channel();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();

    // Planning fails, the abort lands in Disarming and the vehicle never
    // disarms, so the disarming guard can only time out.
    let planner = planner_with_grid(OccupancyGrid::empty(10, 10, 100, 100));
    let config = SessionConfig {
        mission: MissionConfig {
            disarming_timeout_secs: 0,
            ..MissionConfig::default()
        },
        seed: Some(3),
    };
    let session = MissionSession::new(commands, telemetry_rx, planner, config);

    let vehicle = spawn_ground_vehicle(command_rx, telemetry_tx.clone(), true);
    telemetry_tx
        .send(VehicleMessage::GlobalPosition(GlobalPosition::default()))
        .unwrap();
    telemetry_tx
        .send(VehicleMessage::State(VehicleStatus::default()))
        .unwrap();

    let report = timeout(Duration::from_secs(5), session.run(std::future::pending::<()>()))
        .await
        .expect("stalled disarm should end the session")
        .unwrap();

    assert!(!report.completed);
    assert_eq!(report.final_state, MissionState::Disarming);
    assert!(report.failure.unwrap().contains("outside"));

    // The session dropped its sender, so the vehicle task winds down.
    let seen = vehicle.await.unwrap();
    assert!(seen.contains(&VehicleCommand::Disarm));
    assert!(!seen.contains(&VehicleCommand::Stop));
}
