//! Vehicle link and mission session.
//!
//! Connects the synchronous mission controller in `mp-core` to a vehicle
//! speaking the JSON protocol over WebSocket.

pub mod backoff;
pub mod client;
pub mod link;
pub mod navlog;
pub mod protocol;
pub mod session;

pub use backoff::Backoff;
pub use client::{connect, link_url, LinkHandle};
pub use link::CommandSender;
pub use navlog::NavLog;
pub use protocol::{VehicleCommand, VehicleMessage};
pub use session::{MissionReport, MissionSession, SessionConfig};
