//! Runs a [`SimVehicle`] against a command stream, in process or over
//! WebSocket.

use super::vehicle::{SimConfig, SimVehicle};
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use mp_core::GlobalPosition;
use mp_link::{VehicleCommand, VehicleMessage};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Step the vehicle every `tick` and publish telemetry until `Stop` arrives
/// or either channel closes. Returns the vehicle in its final state.
pub async fn drive(
    mut vehicle: SimVehicle,
    mut commands: mpsc::UnboundedReceiver<VehicleCommand>,
    telemetry: mpsc::UnboundedSender<VehicleMessage>,
    tick: Duration,
) -> SimVehicle {
    let dt = tick.as_secs_f64();
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    tracing::info!("command channel closed");
                    break;
                };
                tracing::debug!(?command, "command received");
                if !vehicle.apply(&command) {
                    tracing::info!("stop received");
                    break;
                }
            }
            _ = ticker.tick() => {
                vehicle.step(dt);
                for message in vehicle.telemetry() {
                    if telemetry.send(message).is_err() {
                        tracing::info!("telemetry receiver dropped");
                        return vehicle;
                    }
                }
            }
        }
    }
    vehicle
}

/// Serve one WebSocket client with `vehicle`.
pub async fn serve_connection(
    stream: TcpStream,
    vehicle: SimVehicle,
    tick: Duration,
) -> Result<SimVehicle> {
    let socket = accept_async(stream)
        .await
        .context("websocket handshake failed")?;
    let (mut sink, mut frames) = socket.split();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (telemetry_tx, mut telemetry_rx) = mpsc::unbounded_channel::<VehicleMessage>();

    let reader = tokio::spawn(async move {
        while let Some(frame) = frames.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "client read failed");
                    break;
                }
            };
            match serde_json::from_str::<VehicleCommand>(&text) {
                Ok(command) => {
                    if cmd_tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, %text, "ignoring malformed command"),
            }
        }
    });

    let writer = tokio::spawn(async move {
        while let Some(message) = telemetry_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode telemetry");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let vehicle = drive(vehicle, cmd_rx, telemetry_tx, tick).await;
    reader.abort();
    let _ = writer.await;
    Ok(vehicle)
}

/// Accept clients one at a time, each flying a fresh vehicle parked at
/// `start`.
pub async fn serve(
    listener: TcpListener,
    start: GlobalPosition,
    config: SimConfig,
    tick: Duration,
) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        tracing::info!(%peer, "client connected");
        let vehicle = SimVehicle::new(start, config.clone());
        match serve_connection(stream, vehicle, tick).await {
            Ok(vehicle) => tracing::info!(
                %peer,
                position = ?vehicle.local_position(),
                armed = vehicle.status().armed,
                "client session ended"
            ),
            Err(e) => tracing::warn!(%peer, error = %e, "client session failed"),
        }
    }
}
