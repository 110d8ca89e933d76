//! Controller side of the race protocol.

use log::{debug, info};
use shared::{
    ClientMessage, ProtocolError, ServerMessage, GO_TOKEN, MAX_FRAME_LEN, RADAR_COUNT,
    RADAR_MAX_LENGTH,
};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub type Observation = [f64; RADAR_COUNT];

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Server closed the connection")]
    Closed,

    #[error("Server not ready, got {0:?}")]
    NotReady(String),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Socket error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
}

/// One vehicle's connection to a race server.
pub struct RaceClient {
    stream: TcpStream,
    session_id: String,
    radar_max_length: u32,
    buffer: [u8; MAX_FRAME_LEN],
}

impl RaceClient {
    /// Connects, identifies as `session_id` and waits for the start signal.
    pub async fn connect(addr: &str, session_id: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        let mut client = Self {
            stream,
            session_id: session_id.to_string(),
            radar_max_length: RADAR_MAX_LENGTH,
            buffer: [0; MAX_FRAME_LEN],
        };

        client.write_frame(session_id.as_bytes()).await?;
        info!("Vehicle {} connected to {}, waiting for start", session_id, addr);

        let ready = client.read_frame().await?;
        let ready = String::from_utf8_lossy(ready).trim().to_string();
        if ready != GO_TOKEN {
            return Err(ClientError::NotReady(ready));
        }

        info!("Vehicle {} started", session_id);
        Ok(client)
    }

    /// Scale used to normalise radar distances; must match the server's radar length.
    pub fn with_radar_max_length(mut self, radar_max_length: u32) -> Self {
        self.radar_max_length = radar_max_length.max(1);
        self
    }

    pub async fn reset(&mut self) -> Result<Observation, ClientError> {
        debug!("Vehicle {} reset", self.session_id);
        match self.exchange(ClientMessage::Reset).await? {
            ServerMessage::Observation { radar } => Ok(self.normalize(&radar)),
            other => Err(ClientError::UnexpectedReply(other.to_string())),
        }
    }

    /// Sends one action; both axes are clamped to `[-1, 1]`.
    pub async fn step(&mut self, steering: f64, throttle: f64) -> Result<StepResult, ClientError> {
        let action = ClientMessage::Action {
            steering: steering.max(-1.0).min(1.0),
            throttle: throttle.max(-1.0).min(1.0),
        };

        match self.exchange(action).await? {
            ServerMessage::Step {
                radar,
                reward,
                terminated,
            } => Ok(StepResult {
                observation: self.normalize(&radar),
                reward,
                terminated,
            }),
            other => Err(ClientError::UnexpectedReply(other.to_string())),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn exchange(&mut self, request: ClientMessage) -> Result<ServerMessage, ClientError> {
        self.write_frame(&request.encode()).await?;
        let reply = self.read_frame().await?;
        Ok(ServerMessage::decode(reply)?)
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<&[u8], ClientError> {
        let len = self.stream.read(&mut self.buffer).await?;
        if len == 0 {
            return Err(ClientError::Closed);
        }
        Ok(&self.buffer[..len])
    }

    fn normalize(&self, radar: &[u32; RADAR_COUNT]) -> Observation {
        let max_length = self.radar_max_length as f64;
        radar.map(|distance| (distance as f64 / max_length).min(1.0))
    }
}
