//! One vehicle paired with one controller connection.
//!
//! A session performs exactly one request/response exchange per call to
//! [`VehicleSession::step`]. It owns its [`VehicleState`] outright, so a step
//! can run on its own task without any locking.

use crate::error::ConnectionError;
use log::{debug, info, warn};
use shared::{
    ClientMessage, ProtocolError, ServerMessage, TrackSurface, VehicleConfig, VehicleState,
    GO_TOKEN, MAX_FRAME_LEN,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingAction,
    Closed,
}

/// What a single exchange did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Vehicle reset and observation sent.
    Reset,
    /// Action applied and full reply sent.
    Stepped { reward: f64, terminated: bool },
    /// Request did not parse; nothing changed and nothing was sent.
    Skipped(ProtocolError),
    /// Connection is gone.
    Closed,
}

pub struct VehicleSession<S> {
    session_id: String,
    stream: S,
    vehicle: VehicleState,
    state: SessionState,
    last_reward: f64,
    buffer: [u8; MAX_FRAME_LEN],
}

impl<S> VehicleSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(session_id: String, stream: S, config: VehicleConfig) -> Self {
        Self {
            session_id,
            stream,
            vehicle: VehicleState::new(config),
            state: SessionState::AwaitingAction,
            last_reward: 0.0,
            buffer: [0; MAX_FRAME_LEN],
        }
    }

    /// Waits for this session's next request and answers it.
    pub async fn step(&mut self, track: &dyn TrackSurface) -> StepOutcome {
        if self.state == SessionState::Closed {
            return StepOutcome::Closed;
        }

        let message = match self.stream.read(&mut self.buffer).await {
            Ok(0) => return self.fail(ConnectionError::Closed).await,
            Ok(len) => ClientMessage::decode(&self.buffer[..len]),
            Err(e) => return self.fail(e.into()).await,
        };

        match message {
            Ok(ClientMessage::Reset) => {
                self.vehicle.reset();
                self.vehicle.advance(track);
                self.last_reward = 0.0;

                let reply = ServerMessage::Observation {
                    radar: self.vehicle.radar_distances(),
                };
                if let Err(e) = self.send(&reply).await {
                    return self.fail(e).await;
                }
                debug!("Session {} reset", self.session_id);
                StepOutcome::Reset
            }
            Ok(ClientMessage::Action { steering, throttle }) => {
                self.vehicle.apply_action(steering, throttle);
                self.vehicle.advance(track);
                let reward = self.compute_reward();
                let terminated = !self.vehicle.is_alive();

                let reply = ServerMessage::Step {
                    radar: self.vehicle.radar_distances(),
                    reward,
                    terminated,
                };
                if let Err(e) = self.send(&reply).await {
                    return self.fail(e).await;
                }
                StepOutcome::Stepped { reward, terminated }
            }
            Err(e) => {
                warn!(
                    "Session {}: invalid request skipped: {}",
                    self.session_id, e
                );
                StepOutcome::Skipped(e)
            }
        }
    }

    /// Releases the controller once the roster is complete.
    pub async fn send_go(&mut self) -> Result<(), ConnectionError> {
        self.write_frame(GO_TOKEN.as_bytes()).await
    }

    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        // The peer may already be gone
        let _ = self.stream.shutdown().await;
    }

    /// Recomputes the shaped reward and remembers it for reporting.
    pub fn compute_reward(&mut self) -> f64 {
        self.last_reward = self.vehicle.compute_reward();
        self.last_reward
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Closed
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<(), ConnectionError> {
        self.write_frame(&message.encode()).await
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn fail(&mut self, error: ConnectionError) -> StepOutcome {
        match error {
            ConnectionError::Closed => info!("Session {} disconnected", self.session_id),
            other => warn!("Session {} connection lost: {}", self.session_id, other),
        }
        self.close().await;
        StepOutcome::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::GridTrack;
    use std::io;
    use tokio_test::io::Builder;

    fn ring() -> GridTrack {
        GridTrack::ring(1920, 1080)
    }

    fn reset_reply(track: &GridTrack) -> (VehicleState, Vec<u8>) {
        let mut vehicle = VehicleState::new(VehicleConfig::default());
        vehicle.advance(track);
        let reply = ServerMessage::Observation {
            radar: vehicle.radar_distances(),
        };
        (vehicle, reply.encode())
    }

    #[tokio::test]
    async fn test_reset_replies_with_observation() {
        let track = ring();
        let (_, reply) = reset_reply(&track);
        assert!(!reply.contains(&b'r'));
        assert!(!reply.contains(&b't'));

        let stream = Builder::new().read(b"r").write(&reply).build();
        let mut session = VehicleSession::new("0".to_string(), stream, VehicleConfig::default());

        assert_eq!(session.step(&track).await, StepOutcome::Reset);
        assert!(session.is_connected());
        assert_eq!(session.state(), SessionState::AwaitingAction);
        assert_eq!(session.vehicle().tick_count(), 1);
    }

    #[tokio::test]
    async fn test_action_replies_with_full_message() {
        let track = ring();
        let (mut expected, observation) = reset_reply(&track);
        expected.apply_action(-0.5, 1.0);
        expected.advance(&track);
        let reward = expected.compute_reward();
        let step_reply = ServerMessage::Step {
            radar: expected.radar_distances(),
            reward,
            terminated: !expected.is_alive(),
        }
        .encode();

        let stream = Builder::new()
            .read(b"r")
            .write(&observation)
            .read(b"s-0.50t1.00")
            .write(&step_reply)
            .build();
        let mut session = VehicleSession::new("7".to_string(), stream, VehicleConfig::default());

        assert_eq!(session.step(&track).await, StepOutcome::Reset);
        match session.step(&track).await {
            StepOutcome::Stepped {
                reward: got,
                terminated,
            } => {
                assert_approx_eq!(got, reward);
                assert!(!terminated);
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
        assert_eq!(session.vehicle(), &expected);
        assert_approx_eq!(session.last_reward(), reward);
    }

    #[tokio::test]
    async fn test_malformed_request_is_skipped() {
        let track = ring();
        let stream = Builder::new().read(b"s0.50").build();
        let mut session = VehicleSession::new("0".to_string(), stream, VehicleConfig::default());
        let before = session.vehicle().clone();

        let outcome = session.step(&track).await;
        assert_eq!(
            outcome,
            StepOutcome::Skipped(ProtocolError::MissingSegment('t'))
        );
        assert_eq!(session.vehicle(), &before);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_zero_byte_read_closes_session() {
        let track = ring();
        let stream = Builder::new().build();
        let mut session = VehicleSession::new("0".to_string(), stream, VehicleConfig::default());

        assert_eq!(session.step(&track).await, StepOutcome::Closed);
        assert!(!session.is_connected());
        assert_eq!(session.state(), SessionState::Closed);

        // No further reads once closed
        assert_eq!(session.step(&track).await, StepOutcome::Closed);
    }

    #[tokio::test]
    async fn test_read_error_closes_session() {
        let track = ring();
        let stream = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let mut session = VehicleSession::new("0".to_string(), stream, VehicleConfig::default());

        assert_eq!(session.step(&track).await, StepOutcome::Closed);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_send_go() {
        let stream = Builder::new().write(b"go").build();
        let mut session = VehicleSession::new("0".to_string(), stream, VehicleConfig::default());
        session.send_go().await.unwrap();
    }

    #[tokio::test]
    async fn test_dead_vehicle_reports_terminated() {
        let mut track = GridTrack::filled(1920, 1080, shared::Category::Track);
        // Wall just ahead of the spawn corners
        track.fill_rect(895, 0, 40, 1080, shared::Category::Border);

        let mut expected = VehicleState::new(VehicleConfig::default());
        expected.apply_action(0.0, 0.0);
        expected.advance(&track);
        assert!(!expected.is_alive());
        let reply = ServerMessage::Step {
            radar: expected.radar_distances(),
            reward: expected.compute_reward(),
            terminated: true,
        }
        .encode();

        let stream = Builder::new().read(b"s0.00t0.00").write(&reply).build();
        let mut session = VehicleSession::new("0".to_string(), stream, VehicleConfig::default());

        match session.step(&track).await {
            StepOutcome::Stepped { terminated, .. } => assert!(terminated),
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }
}
