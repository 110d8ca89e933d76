//! # Race Controller Library
//!
//! A simple controller for the race server. It connects, identifies itself
//! with a session id, waits for the `go` signal and then drives one vehicle
//! through reset and action requests, one exchange per server tick.
//!
//! ## Module Organization
//!
//! ### Connection Module (`connection`)
//! [`connection::RaceClient`] wraps the TCP stream and the textual protocol,
//! turning raw radar distances into normalised observations.
//!
//! ### Policy Module (`policy`)
//! Small stand-ins for a trained model: a wall follower and a seeded random
//! driver. Anything that implements [`policy::Policy`] can drive.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::connection::RaceClient;
//! use client::policy::{Policy, WallFollower};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RaceClient::connect("127.0.0.1:1234", "0").await?;
//!     let mut policy = WallFollower::default();
//!
//!     let mut observation = client.reset().await?;
//!     loop {
//!         let (steering, throttle) = policy.act(&observation);
//!         let result = client.step(steering, throttle).await?;
//!         if result.terminated {
//!             break;
//!         }
//!         observation = result.observation;
//!     }
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod policy;

use connection::{ClientError, RaceClient};
use log::info;
use policy::Policy;

/// Summary of one reset-to-termination run.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeReport {
    pub steps: u32,
    pub reward: f64,
    pub terminated: bool,
}

/// Resets the vehicle and drives until it crashes or `max_steps` actions were sent.
pub async fn run_episode(
    client: &mut RaceClient,
    policy: &mut dyn Policy,
    max_steps: u32,
) -> Result<EpisodeReport, ClientError> {
    let mut observation = client.reset().await?;
    let mut report = EpisodeReport {
        steps: 0,
        reward: 0.0,
        terminated: false,
    };

    while report.steps < max_steps {
        let (steering, throttle) = policy.act(&observation);
        let result = client.step(steering, throttle).await?;
        report.steps += 1;
        report.reward = result.reward;
        observation = result.observation;

        if result.terminated {
            report.terminated = true;
            break;
        }
    }

    info!(
        "Vehicle {}: episode finished after {} steps, reward {:.2}{}",
        client.session_id(),
        report.steps,
        report.reward,
        if report.terminated { " (crashed)" } else { "" }
    );
    Ok(report)
}
