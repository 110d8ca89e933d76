//! Simulation core shared by the race server and its remote controllers.
//!
//! Nothing in this crate performs I/O. The server drives [`vehicle::VehicleState`]
//! against a [`track::TrackSurface`] and speaks [`protocol`] frames; controllers
//! only need the protocol half.

pub mod config;
pub mod protocol;
pub mod track;
pub mod vehicle;

pub use config::VehicleConfig;
pub use protocol::{ClientMessage, ProtocolError, ServerMessage, GO_TOKEN, RESET_TOKEN};
pub use track::{Category, GridTrack, TrackError, TrackSurface, MAX_TRACK_PIXELS};
pub use vehicle::{RadarReading, VehicleState};

pub const PLAYFIELD_WIDTH: f64 = 1920.0;
pub const PLAYFIELD_HEIGHT: f64 = 1080.0;
pub const CAR_SIZE: f64 = 60.0;

pub const MIN_SPEED: f64 = 10.0;
pub const MAX_SPEED: f64 = 40.0;
pub const MAX_THROTTLE: f64 = 15.0;
pub const MAX_STEERING: f64 = 8.0;

pub const RADAR_MAX_LENGTH: u32 = 300;
pub const RADAR_COUNT: usize = 5;
pub const RADAR_ANGLES: [f64; RADAR_COUNT] = [-90.0, -45.0, 0.0, 45.0, 90.0];

pub const SPAWN_X: f64 = 830.0;
pub const SPAWN_Y: f64 = 920.0;

/// Closest the body origin may get to the top/left playfield edge.
pub const EDGE_MARGIN_MIN: f64 = 20.0;
/// Offset from the bottom/right playfield edge the body origin may not pass.
pub const EDGE_MARGIN_MAX: f64 = 120.0;

/// Largest frame either side is expected to send in one write.
pub const MAX_FRAME_LEN: usize = 1024;
