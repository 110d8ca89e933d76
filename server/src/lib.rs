//! # Race Server Library
//!
//! Hosts a tick-synchronized driving simulation for remote controllers. Every
//! connected controller drives one vehicle; on each tick the server performs
//! exactly one request/response exchange with every controller and only
//! advances to the next tick once all of them have answered or dropped out.
//!
//! ## Core Responsibilities
//!
//! ### Roster Management
//! The server waits for a fixed number of controllers, reads each one's
//! session id, refuses duplicate ids, and releases everyone at once with a
//! `go` token after a short countdown.
//!
//! ### Lock-Step Simulation
//! Sessions are stepped concurrently, one task per session per tick. A slow
//! controller only delays its own slot; the tick barrier still waits for it.
//! Disconnected sessions are removed after the barrier, never during it.
//!
//! ### Reporting
//! After every tick the best reward seen so far is updated and a read-only
//! [`render::TickFrame`] is handed to the configured [`render::Renderer`].
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! The per-connection state machine: reset and action requests, malformed
//! requests skipped in place, zero-byte reads closing the session.
//!
//! ### Simulation Module (`simulation`)
//! The accept phase, start signal and tick loop.
//!
//! ### Render Module (`render`)
//! Tick snapshots and the headless log renderer.
//!
//! ### Config and Error Modules (`config`, `error`)
//! JSON/CLI configuration, track loading and the typed error taxonomy.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::{load_track, ServerConfig};
//! use server::simulation::SimulationServer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         vehicles: 2,
//!         ..ServerConfig::default()
//!     };
//!     let track = load_track(None, 1, &config.vehicle)?;
//!
//!     let mut server = SimulationServer::bind(config, Arc::new(track)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod simulation;
