//! WebSocket client for the vehicle link.

use crate::backoff::Backoff;
use crate::link::CommandSender;
use crate::protocol::{VehicleCommand, VehicleMessage};
use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// An open link: commands go out through `commands`, telemetry arrives on
/// `telemetry`. The telemetry channel closes when the vehicle hangs up.
pub struct LinkHandle {
    pub commands: CommandSender,
    pub telemetry: mpsc::UnboundedReceiver<VehicleMessage>,
}

/// `ws://host:port` for a vehicle endpoint.
pub fn link_url(host: &str, port: u16) -> String {
    format!("ws://{}:{}", host, port)
}

/// Connect to the vehicle at `url`, retrying according to `backoff`.
pub async fn connect(url: &str, mut backoff: Backoff) -> Result<LinkHandle> {
    let socket = loop {
        match connect_async(url).await {
            Ok((socket, _)) => break socket,
            Err(e) => {
                let Some(delay) = backoff.fail() else {
                    return Err(e).with_context(|| {
                        format!("failed to connect to {} after {} attempts", url, backoff.attempts())
                    });
                };
                tracing::warn!(%url, error = %e, ?delay, "connection failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    };
    tracing::info!(%url, "connected to vehicle");

    let (mut sink, mut stream) = socket.split();
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<VehicleCommand>();
    let (telemetry_tx, telemetry_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            let text = match serde_json::to_string(&command) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode command");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                tracing::error!(error = %e, "failed to write command");
                break;
            }
            if command == VehicleCommand::Stop {
                let _ = sink.close().await;
                break;
            }
        }
        tracing::debug!("command writer finished");
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "link read failed");
                    break;
                }
            };
            match serde_json::from_str::<VehicleMessage>(&text) {
                Ok(message) => {
                    if telemetry_tx.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, %text, "ignoring malformed telemetry"),
            }
        }
        tracing::debug!("telemetry reader finished");
    });

    Ok(LinkHandle {
        commands: CommandSender::new(cmd_tx),
        telemetry: telemetry_rx,
    })
}
