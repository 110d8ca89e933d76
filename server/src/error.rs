//! Error types for the race server.
//!
//! Protocol errors never show up here: a malformed request only skips that
//! session's exchange for the tick and is logged where it happens.

use shared::TrackError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A session's transport failed; the session is finished.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Peer closed the connection")]
    Closed,

    #[error("Socket error: {0}")]
    Io(#[from] io::Error),
}

/// The roster could not be assembled, so the race must not start.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Connection {index} closed during the handshake")]
    ClosedDuringHandshake { index: usize },

    #[error("Connection {index} sent an empty or non UTF-8 session id")]
    InvalidSessionId { index: usize },

    #[error("Session id {0:?} is already taken")]
    DuplicateSession(String),

    #[error("Accepting connections failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid track map: {0}")]
    Track(#[from] TrackError),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Server socket error: {0}")]
    Io(#[from] io::Error),
}
