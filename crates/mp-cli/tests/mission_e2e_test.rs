//! Full missions against the simulated vehicle.

use mp_cli::sim::{drive, serve_connection, SimConfig, SimVehicle};
use mp_core::{MissionState, ObstacleMap, PathPlanner, PlannerConfig, QueuePath};
use mp_link::{
    connect, link_url, Backoff, CommandSender, MissionReport, MissionSession, SessionConfig,
    VehicleCommand,
};
use std::time::Duration;
use tokio::sync::mpsc;

const MAP: &str = "lat0 37.792480, lon0 -122.397450\n\
    posX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ\n\
    -30,-30,0,0.5,0.5,0\n\
    30,30,0,0.5,0.5,0\n\
    15,0,10,5,5,10\n";

fn planner(queue_path: QueuePath) -> (ObstacleMap, PathPlanner) {
    let map = ObstacleMap::parse(MAP).unwrap();
    let config = PlannerConfig {
        goal_sample_radius: 25.0,
        queue_path,
        ..PlannerConfig::default()
    };
    let planner = PathPlanner::new(&map, config).unwrap();
    (map, planner)
}

fn session_config() -> SessionConfig {
    SessionConfig {
        seed: Some(7),
        ..SessionConfig::default()
    }
}

fn assert_flown(map: &ObstacleMap, report: &MissionReport, vehicle: &SimVehicle) {
    assert!(report.completed, "mission failed: {:?}", report.failure);
    assert_eq!(report.final_state, MissionState::Manual);
    assert_eq!(report.failure, None);

    let published = vehicle.published_waypoints();
    assert!(!published.is_empty());
    assert_eq!(report.waypoints_flown, published.len());

    assert_eq!(vehicle.home(), map.home());
    assert!(vehicle.on_ground());
    assert!(!vehicle.status().armed);
    assert!(!vehicle.status().guided);

    let last = published[published.len() - 1];
    let landed = vehicle.local_position();
    assert!(landed.horizontal_distance_to(last.north, last.east) < 1e-3);

    let commands = vehicle.commands();
    assert_eq!(commands[0], VehicleCommand::Arm);
    assert_eq!(commands[1], VehicleCommand::TakeControl);
    assert!(commands
        .iter()
        .any(|c| matches!(c, VehicleCommand::SetHome { .. })));
    assert!(commands.contains(&VehicleCommand::Land));
    assert_eq!(commands.last(), Some(&VehicleCommand::Stop));

    let positions = commands
        .iter()
        .filter(|c| matches!(c, VehicleCommand::Position { .. }))
        .count();
    assert_eq!(positions, published.len());
}

#[tokio::test(start_paused = true)]
async fn in_process_mission_lands_at_goal() {
    let (map, planner) = planner(QueuePath::Raw);
    let vehicle = SimVehicle::new(map.home(), SimConfig::default());

    let (commands, command_rx) = CommandSender::channel();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();
    let session = MissionSession::new(commands, telemetry_rx, planner, session_config());

    let (report, vehicle) = tokio::time::timeout(Duration::from_secs(600), async {
        tokio::join!(
            session.run(std::future::pending()),
            drive(vehicle, command_rx, telemetry_tx, Duration::from_millis(100)),
        )
    })
    .await
    .expect("mission did not finish");

    assert_flown(&map, &report.unwrap(), &vehicle);
}

#[tokio::test]
async fn websocket_mission_lands_at_goal() {
    let (map, planner) = planner(QueuePath::Pruned);
    let vehicle = SimVehicle::new(
        map.home(),
        SimConfig {
            cruise_speed: 20.0,
            climb_rate: 10.0,
            descent_rate: 10.0,
        },
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        serve_connection(stream, vehicle, Duration::from_millis(20)).await
    });

    let backoff = Backoff::new(Duration::from_millis(50), Duration::from_millis(200)).with_max_attempts(5);
    let link = connect(&link_url("127.0.0.1", port), backoff).await.unwrap();
    let session = MissionSession::new(link.commands, link.telemetry, planner, session_config());

    let report = tokio::time::timeout(Duration::from_secs(60), session.run(std::future::pending()))
        .await
        .expect("mission did not finish")
        .unwrap();
    let vehicle = tokio::time::timeout(Duration::from_secs(10), server)
        .await
        .expect("simulator did not stop")
        .unwrap()
        .unwrap();

    assert_flown(&map, &report, &vehicle);
}
