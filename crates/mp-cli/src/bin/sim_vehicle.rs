//! Simulated vehicle speaking the JSON link protocol over WebSocket.
//!
//! Usage:
//!   cargo run -p mp-cli --bin sim_vehicle -- --port 5760

use anyhow::Result;
use clap::Parser;
use mp_cli::sim::{serve, SimConfig};
use mp_core::GlobalPosition;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Matches the anchor of data/colliders.csv
const DEFAULT_LAT: f64 = 37.792480;
const DEFAULT_LON: f64 = -122.397450;

#[derive(Parser, Debug)]
#[command(author, version, about = "Kinematic vehicle simulator")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 5760)]
    port: u16,

    /// Starting latitude
    #[arg(long, default_value_t = DEFAULT_LAT)]
    lat: f64,

    /// Starting longitude
    #[arg(long, default_value_t = DEFAULT_LON)]
    lon: f64,

    /// Horizontal speed (m/s)
    #[arg(long, default_value_t = 5.0)]
    speed: f64,

    /// Telemetry rate (Hz)
    #[arg(long, default_value_t = 10.0)]
    rate: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sim_vehicle=debug".parse()?)
                .add_directive("mp_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.rate > 0.0, "--rate must be positive");

    let config = SimConfig {
        cruise_speed: args.speed,
        ..SimConfig::default()
    };
    let start = GlobalPosition::new(args.lon, args.lat, 0.0);
    let tick = Duration::from_secs_f64(1.0 / args.rate);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    tokio::select! {
        result = serve(listener, start, config, tick) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
