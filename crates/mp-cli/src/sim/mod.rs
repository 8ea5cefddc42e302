//! Simulated vehicle for local runs and end-to-end tests.

pub mod server;
pub mod vehicle;

pub use server::{drive, serve, serve_connection};
pub use vehicle::{SimConfig, SimVehicle};
