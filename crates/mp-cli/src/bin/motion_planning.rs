//! Fly one planned mission against a vehicle link.
//!
//! Loads the obstacle map, connects to the vehicle, plans a route to a
//! random free goal once the vehicle is armed, flies it and lands.
//!
//! Usage:
//!   cargo run -p mp-cli --bin motion_planning -- --host 127.0.0.1 --port 5760

use anyhow::{Context, Result};
use clap::Parser;
use mp_cli::config::AppConfig;
use mp_core::{ObstacleMap, PathPlanner};
use mp_link::{connect, link_url, Backoff, MissionSession, NavLog};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan and fly a mission through an obstacle map")]
struct Args {
    /// Vehicle host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Vehicle port
    #[arg(long, default_value_t = 5760)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("motion_planning=debug".parse()?)
                .add_directive("mp_link=info".parse()?)
                .add_directive("mp_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env();

    let map = ObstacleMap::from_path(&config.colliders)
        .with_context(|| format!("loading {}", config.colliders.display()))?;
    tracing::info!(
        obstacles = map.obstacles.len(),
        lat0 = map.lat0,
        lon0 = map.lon0,
        "obstacle map loaded"
    );
    let planner = PathPlanner::new(&map, config.planner.clone())?;

    let url = link_url(&args.host, args.port);
    let backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(5)).with_max_attempts(10);
    let link = connect(&url, backoff).await?;

    let navlog = NavLog::open(&config.navlog_dir)
        .with_context(|| format!("opening navigation log in {}", config.navlog_dir.display()))?;
    tracing::info!(path = %navlog.path().display(), "navigation log opened");

    let session = MissionSession::new(link.commands, link.telemetry, planner, config.session())
        .with_navlog(navlog);
    let report = session
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Mission finished: {}", serde_json::to_string(&report)?);
    if let Some(failure) = &report.failure {
        anyhow::bail!("mission did not complete: {}", failure);
    }
    Ok(())
}
