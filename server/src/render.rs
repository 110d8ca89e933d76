//! Read-only hand-off of each completed tick to a display.
//!
//! Renderers receive snapshots, never sessions, so nothing they do can reach
//! back into the simulation.

use crate::session::VehicleSession;
use log::{debug, info, log_enabled, trace, warn, Level};
use serde::Serialize;
use shared::RadarReading;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub session_id: String,
    pub position: (f64, f64),
    pub center: (f64, f64),
    pub heading: f64,
    pub speed: f64,
    pub alive: bool,
    pub current_sector: u8,
    pub lap_count: u32,
    pub reward: f64,
    pub radar: Vec<RadarReading>,
}

impl VehicleSnapshot {
    pub fn capture<S>(session: &VehicleSession<S>) -> Self
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let vehicle = session.vehicle();
        Self {
            session_id: session.session_id().to_string(),
            position: vehicle.position(),
            center: vehicle.center(),
            heading: vehicle.heading(),
            speed: vehicle.speed(),
            alive: vehicle.is_alive(),
            current_sector: vehicle.current_sector(),
            lap_count: vehicle.lap_count(),
            reward: session.last_reward(),
            radar: vehicle.radar().to_vec(),
        }
    }
}

/// State of the race after one tick barrier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickFrame {
    pub tick: u64,
    pub best_reward: f64,
    pub vehicles: Vec<VehicleSnapshot>,
}

pub trait Renderer: Send {
    fn render(&mut self, frame: &TickFrame);
}

impl<F> Renderer for F
where
    F: FnMut(&TickFrame) + Send,
{
    fn render(&mut self, frame: &TickFrame) {
        self(frame)
    }
}

/// Headless renderer that reports progress through the log.
pub struct LogRenderer {
    summary_every: u64,
}

impl LogRenderer {
    pub fn new(summary_every: u64) -> Self {
        Self {
            summary_every: summary_every.max(1),
        }
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &TickFrame) {
        let alive = frame.vehicles.iter().filter(|v| v.alive).count();
        if frame.tick % self.summary_every == 0 {
            info!(
                "Tick {}: {} vehicles ({} alive), best reward {:.2}",
                frame.tick,
                frame.vehicles.len(),
                alive,
                frame.best_reward
            );
        } else {
            debug!(
                "Tick {}: {} vehicles ({} alive)",
                frame.tick,
                frame.vehicles.len(),
                alive
            );
        }

        if log_enabled!(Level::Trace) {
            match serde_json::to_string(frame) {
                Ok(json) => trace!("{}", json),
                Err(e) => warn!("Failed to serialize tick frame: {}", e),
            }
        }
    }
}
