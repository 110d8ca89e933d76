//! Simple driving policies for exercising a race server.
//!
//! Observations are the five normalised radar distances in cast order
//! `-90, -45, 0, 45, 90` relative to the heading; `-90` looks to the vehicle's
//! right and `90` to its left. Positive steering turns left.

use crate::connection::Observation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait Policy: Send {
    /// Returns `(steering, throttle)`, each in `[-1, 1]`.
    fn act(&mut self, observation: &Observation) -> (f64, f64);
}

/// Steers towards the more open side and slows down when the road ahead closes in.
#[derive(Debug, Clone)]
pub struct WallFollower {
    pub steering_gain: f64,
    /// Front clearance below which the policy brakes.
    pub brake_distance: f64,
}

impl Default for WallFollower {
    fn default() -> Self {
        Self {
            steering_gain: 2.0,
            brake_distance: 0.4,
        }
    }
}

impl Policy for WallFollower {
    fn act(&mut self, observation: &Observation) -> (f64, f64) {
        let right = observation[0] + observation[1];
        let left = observation[3] + observation[4];
        let steering = ((left - right) * self.steering_gain).clamp(-1.0, 1.0);

        let throttle = if observation[2] < self.brake_distance {
            -1.0
        } else {
            observation[2].clamp(0.0, 1.0)
        };
        (steering, throttle)
    }
}

/// Uniformly random actions from a seeded generator.
pub struct RandomDriver {
    rng: StdRng,
}

impl RandomDriver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomDriver {
    fn act(&mut self, _observation: &Observation) -> (f64, f64) {
        (self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_follower_turns_towards_open_side() {
        let mut policy = WallFollower::default();

        // Wall close on the right
        let (steering, _) = policy.act(&[0.1, 0.2, 1.0, 0.8, 0.9]);
        assert!(steering > 0.0);

        // Wall close on the left
        let (steering, _) = policy.act(&[0.9, 0.8, 1.0, 0.2, 0.1]);
        assert!(steering < 0.0);

        // Centered
        let (steering, throttle) = policy.act(&[0.5, 0.5, 1.0, 0.5, 0.5]);
        assert_eq!(steering, 0.0);
        assert_eq!(throttle, 1.0);
    }

    #[test]
    fn test_wall_follower_brakes() {
        let mut policy = WallFollower::default();
        let (_, throttle) = policy.act(&[0.5, 0.5, 0.1, 0.5, 0.5]);
        assert_eq!(throttle, -1.0);
    }

    #[test]
    fn test_random_driver_is_bounded_and_seeded() {
        let mut first = RandomDriver::new(7);
        let mut second = RandomDriver::new(7);
        let observation = [0.0; 5];

        for _ in 0..100 {
            let action = first.act(&observation);
            assert_eq!(action, second.act(&observation));
            assert!((-1.0..=1.0).contains(&action.0));
            assert!((-1.0..=1.0).contains(&action.1));
        }
    }
}
