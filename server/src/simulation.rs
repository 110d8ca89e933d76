//! Multi-client tick-synchronized race coordinator.
//!
//! A race runs in three phases:
//! 1. **Accept**: wait for the configured number of controllers, each sending
//!    its session id.
//! 2. **Start**: after a short countdown every controller receives `go`.
//! 3. **Tick loop**: every active session performs one exchange on its own
//!    task; the tick ends when all tasks have joined. Only then are closed
//!    sessions dropped, the best reward updated and the frame rendered.
//!
//! Sessions are moved into their tasks for the fan-out and handed back at
//! the barrier, so the coordinator never touches a vehicle while its step is
//! in flight.

use crate::config::ServerConfig;
use crate::error::{RosterError, ServerError};
use crate::render::{LogRenderer, Renderer, TickFrame, VehicleSnapshot};
use crate::session::VehicleSession;
use log::{error, info, trace, warn};
use shared::{TrackSurface, MAX_FRAME_LEN};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

pub struct SimulationServer {
    listener: TcpListener,
    config: ServerConfig,
    track: Arc<dyn TrackSurface>,
    sessions: Vec<VehicleSession<TcpStream>>,
    tick_index: u64,
    best_reward: f64,
    renderer: Box<dyn Renderer>,
}

impl SimulationServer {
    pub async fn bind(
        config: ServerConfig,
        track: Arc<dyn TrackSurface>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Race server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            renderer: Box::new(LogRenderer::new(config.summary_every)),
            config,
            track,
            sessions: Vec::new(),
            tick_index: 0,
            best_reward: 0.0,
        })
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs a full race: accept the roster, start it, tick until everyone leaves.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.accept_phase(self.config.vehicles).await?;
        self.start_signal().await;
        self.tick_loop().await;
        Ok(())
    }

    /// Blocks until `expected` controllers have connected and identified themselves.
    pub async fn accept_phase(&mut self, expected: usize) -> Result<(), RosterError> {
        info!("Waiting for {} vehicles", expected);
        let mut taken: HashSet<String> = self
            .sessions
            .iter()
            .map(|session| session.session_id().to_string())
            .collect();

        while self.sessions.len() < expected {
            let (mut stream, addr) = self.listener.accept().await?;
            let index = self.sessions.len();
            let session_id = read_session_id(&mut stream, index).await?;

            if !taken.insert(session_id.clone()) {
                return Err(RosterError::DuplicateSession(session_id));
            }

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }
            info!(
                "Vehicle {} connected from {} ({}/{})",
                session_id,
                addr,
                index + 1,
                expected
            );
            self.sessions
                .push(VehicleSession::new(session_id, stream, self.config.vehicle));
        }

        info!("All {} vehicles connected", expected);
        Ok(())
    }

    /// Counts down, then releases every controller with the `go` token.
    pub async fn start_signal(&mut self) {
        for remaining in (1..=self.config.countdown_secs).rev() {
            info!("Race starts in {}", remaining);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        info!("GO!");
        for session in &mut self.sessions {
            if let Err(e) = session.send_go().await {
                warn!(
                    "Failed to start vehicle {}: {}",
                    session.session_id(),
                    e
                );
                session.close().await;
            }
        }
    }

    /// Ticks until no session is left.
    pub async fn tick_loop(&mut self) {
        while !self.sessions.is_empty() {
            self.tick().await;
        }
        info!(
            "All vehicles gone after {} ticks, best reward {:.2}",
            self.tick_index, self.best_reward
        );
    }

    /// One tick: fan out, join, compact, report, render.
    pub async fn tick(&mut self) {
        let sessions = std::mem::take(&mut self.sessions);
        let mut sessions = step_all(sessions, &self.track).await;

        sessions.retain(|session| {
            if !session.is_connected() {
                info!(
                    "Removing vehicle {} at tick {}",
                    session.session_id(),
                    self.tick_index
                );
            }
            session.is_connected()
        });
        self.sessions = sessions;
        self.tick_index += 1;

        self.report_best_reward();
        let frame = self.frame();
        self.renderer.render(&frame);
    }

    /// Folds every session's current reward into the running maximum.
    pub fn report_best_reward(&mut self) -> f64 {
        for session in &mut self.sessions {
            let reward = session.compute_reward();
            if reward > self.best_reward {
                self.best_reward = reward;
            }
        }
        self.best_reward
    }

    pub fn frame(&self) -> TickFrame {
        TickFrame {
            tick: self.tick_index,
            best_reward: self.best_reward,
            vehicles: self.sessions.iter().map(VehicleSnapshot::capture).collect(),
        }
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn best_reward(&self) -> f64 {
        self.best_reward
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .iter()
            .map(|session| session.session_id().to_string())
            .collect()
    }
}

/// Runs one exchange per session, each on its own task, and waits for all of them.
///
/// Sessions come back in their original order. A session whose task panicked
/// is dropped.
pub async fn step_all<S>(
    sessions: Vec<VehicleSession<S>>,
    track: &Arc<dyn TrackSurface>,
) -> Vec<VehicleSession<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, mut session) in sessions.into_iter().enumerate() {
        let track = Arc::clone(track);
        tasks.spawn(async move {
            let outcome = session.step(track.as_ref()).await;
            trace!("Vehicle {}: {:?}", session.session_id(), outcome);
            (index, session)
        });
    }

    let mut finished = Vec::with_capacity(tasks.len());
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(entry) => finished.push(entry),
            Err(e) => error!("Vehicle task failed: {}", e),
        }
    }

    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, session)| session).collect()
}

async fn read_session_id<S>(stream: &mut S, index: usize) -> Result<String, RosterError>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = [0u8; MAX_FRAME_LEN];
    let len = stream.read(&mut buffer).await?;
    if len == 0 {
        return Err(RosterError::ClosedDuringHandshake { index });
    }

    let session_id = std::str::from_utf8(&buffer[..len])
        .map_err(|_| RosterError::InvalidSessionId { index })?
        .trim();
    if session_id.is_empty() {
        return Err(RosterError::InvalidSessionId { index });
    }
    Ok(session_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{GridTrack, VehicleConfig};
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_session_id() {
        let mut stream = Builder::new().read(b"car-3\n").build();
        assert_eq!(read_session_id(&mut stream, 0).await.unwrap(), "car-3");
    }

    #[tokio::test]
    async fn test_read_session_id_closed() {
        let mut stream = Builder::new().build();
        assert!(matches!(
            read_session_id(&mut stream, 2).await,
            Err(RosterError::ClosedDuringHandshake { index: 2 })
        ));
    }

    #[tokio::test]
    async fn test_read_session_id_blank() {
        let mut stream = Builder::new().read(b"  \r\n").build();
        assert!(matches!(
            read_session_id(&mut stream, 1).await,
            Err(RosterError::InvalidSessionId { index: 1 })
        ));
    }

    #[tokio::test]
    async fn test_step_all_drops_nothing_and_keeps_order() {
        let track: Arc<dyn TrackSurface> = Arc::new(GridTrack::ring(1920, 1080));
        let mut vehicle = shared::VehicleState::new(VehicleConfig::default());
        vehicle.advance(track.as_ref());
        let reply = shared::ServerMessage::Observation {
            radar: vehicle.radar_distances(),
        }
        .encode();

        let sessions = vec![
            VehicleSession::new(
                "a".to_string(),
                Builder::new().read(b"r").write(&reply).build(),
                VehicleConfig::default(),
            ),
            VehicleSession::new("b".to_string(), Builder::new().build(), VehicleConfig::default()),
            VehicleSession::new(
                "c".to_string(),
                Builder::new().read(b"bogus").build(),
                VehicleConfig::default(),
            ),
        ];

        let sessions = step_all(sessions, &track).await;
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(sessions[0].is_connected());
        assert!(!sessions[1].is_connected());
        assert!(sessions[2].is_connected());
        assert_eq!(sessions[0].vehicle().tick_count(), 1);
        assert_eq!(sessions[2].vehicle().tick_count(), 0);
    }
}
