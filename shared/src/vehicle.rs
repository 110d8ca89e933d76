//! Vehicle kinematics, collision and radar model.
//!
//! Angles are in degrees with the screen's Y axis pointing down: a heading of
//! `h` moves along `(cos(360 - h), sin(360 - h))`, so increasing the heading
//! turns the vehicle counter-clockwise on screen.

use crate::config::VehicleConfig;
use crate::track::{Category, TrackSurface};
use crate::RADAR_COUNT;
use serde::{Deserialize, Serialize};

/// Corner angles of the body relative to the heading.
const CORNER_ANGLES: [f64; 4] = [30.0, 150.0, 210.0, 330.0];

/// Result of one radar ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarReading {
    /// Pixel where the ray stopped.
    pub endpoint: (i64, i64),
    /// Whole-pixel distance from the vehicle center, capped at the radar length.
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    config: VehicleConfig,
    /// Body origin (top-left of the unrotated body).
    position: (f64, f64),
    heading: f64,
    speed: f64,
    speed_initialized: bool,
    distance_traveled: f64,
    tick_count: u64,
    alive: bool,
    current_sector: u8,
    lap_count: u32,
    sector_reward: f64,
    distance_reward: f64,
    radar: Vec<RadarReading>,
}

impl VehicleState {
    pub fn new(config: VehicleConfig) -> Self {
        Self {
            config,
            position: (config.spawn_x, config.spawn_y),
            heading: config.spawn_heading,
            speed: 0.0,
            speed_initialized: false,
            distance_traveled: 0.0,
            tick_count: 0,
            alive: true,
            current_sector: 0,
            lap_count: 0,
            sector_reward: 0.0,
            distance_reward: 0.0,
            radar: Vec::with_capacity(RADAR_COUNT),
        }
    }

    /// Puts the vehicle back on the spawn pose with every accumulator cleared.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Moves the body origin and heading without touching any accumulator.
    pub fn place(&mut self, x: f64, y: f64, heading: f64) {
        self.position = (x, y);
        self.heading = heading.rem_euclid(360.0);
    }

    /// Applies one control input. Both axes are clamped to `[-1, 1]`.
    pub fn apply_action(&mut self, steering: f64, throttle: f64) {
        let steering = steering.max(-1.0).min(1.0);
        let throttle = throttle.max(-1.0).min(1.0);

        self.heading = (self.heading + steering * self.config.max_steering).rem_euclid(360.0);
        self.speed = self.config.clamp_speed(self.speed + throttle * self.config.max_throttle);
    }

    /// Integrates one tick, then recomputes aliveness and every radar reading.
    pub fn advance(&mut self, track: &dyn TrackSurface) {
        // The first tick always starts at minimum speed
        if !self.speed_initialized {
            self.speed = self.config.min_speed;
            self.speed_initialized = true;
        }

        let (dx, dy) = unit_vector(self.heading);
        let (min_x, max_x, min_y, max_y) = self.config.clamp_bounds();
        self.position.0 = (self.position.0 + dx * self.speed).max(min_x).min(max_x);
        self.position.1 = (self.position.1 + dy * self.speed).max(min_y).min(max_y);

        self.distance_traveled += self.speed;
        self.tick_count += 1;

        self.alive = !self
            .corners()
            .iter()
            .any(|&(x, y)| track.sample(x.floor() as i64, y.floor() as i64) == Category::Border);

        self.radar.clear();
        for angle in self.config.radar_angles {
            let reading = self.cast_ray(track, angle);
            self.radar.push(reading);
        }
    }

    /// Steps a ray outward one pixel at a time from the vehicle center.
    ///
    /// The ray stops on border or sector pixels, when it leaves the surface,
    /// or once it reaches the radar length. Sector pixels seen along the way
    /// feed lap tracking.
    pub fn cast_ray(&mut self, track: &dyn TrackSurface, relative_angle: f64) -> RadarReading {
        let (cx, cy) = self.center();
        let (dx, dy) = unit_vector(self.heading + relative_angle);
        let max_length = self.config.radar_max_length;

        let mut length = 0u32;
        let endpoint = loop {
            let x = (cx + dx * length as f64).floor() as i64;
            let y = (cy + dy * length as f64).floor() as i64;
            let category = track.sample(x, y);

            if let Some(sector) = category.sector() {
                self.cross_sector(sector);
            }
            if category.blocks_radar() || length >= max_length {
                break (x, y);
            }
            length += 1;
        };

        // Capped at the steps taken; only an unobstructed ray reads full length
        let distance = (endpoint.0 as f64 - cx).hypot(endpoint.1 as f64 - cy) as u32;
        RadarReading {
            endpoint,
            distance: distance.min(length),
        }
    }

    /// Records a sighting of `sector`; only the next sector in `1 -> 2 -> 3 -> 1` counts.
    fn cross_sector(&mut self, sector: u8) {
        let expected = match self.current_sector {
            1 => 2,
            2 => 3,
            // Before any sighting the vehicle counts as being in sector 3
            _ => 1,
        };
        if sector != expected {
            return;
        }

        self.current_sector = sector;
        if sector == 1 {
            self.lap_count += 1;
        }

        let ticks_per_lap = self.tick_count.max(1) as f64 / self.lap_count.max(1) as f64;
        self.sector_reward += sector as f64 * 1000.0 / ticks_per_lap;
    }

    /// Total shaped reward; also records the distance component.
    pub fn compute_reward(&mut self) -> f64 {
        let ticks = self.tick_count.max(1) as f64;
        self.distance_reward =
            self.distance_traveled / 1000.0 + self.distance_traveled / (50.0 * ticks);
        self.distance_reward - self.sector_reward
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Radar distances scaled into `[0, 1]`; zeros before the first tick.
    pub fn normalized_observation(&self) -> [f64; RADAR_COUNT] {
        let max_length = self.config.radar_max_length.max(1) as f64;
        let mut observation = [0.0; RADAR_COUNT];
        for (slot, reading) in observation.iter_mut().zip(&self.radar) {
            *slot = reading.distance as f64 / max_length;
        }
        observation
    }

    /// Raw radar distances as sent on the wire; zeros before the first tick.
    pub fn radar_distances(&self) -> [u32; RADAR_COUNT] {
        let mut distances = [0; RADAR_COUNT];
        for (slot, reading) in distances.iter_mut().zip(&self.radar) {
            *slot = reading.distance;
        }
        distances
    }

    pub fn center(&self) -> (f64, f64) {
        let half = self.config.half_size();
        (self.position.0.floor() + half, self.position.1.floor() + half)
    }

    /// The four body corners used for collision checks.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (cx, cy) = self.center();
        let half = self.config.half_size();
        CORNER_ANGLES.map(|angle| {
            let (dx, dy) = unit_vector(self.heading + angle);
            (cx + dx * half, cy + dy * half)
        })
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn current_sector(&self) -> u8 {
        self.current_sector
    }

    pub fn lap_count(&self) -> u32 {
        self.lap_count
    }

    pub fn sector_reward(&self) -> f64 {
        self.sector_reward
    }

    pub fn distance_reward(&self) -> f64 {
        self.distance_reward
    }

    pub fn radar(&self) -> &[RadarReading] {
        &self.radar
    }
}

/// Screen-space direction for an angle in degrees.
fn unit_vector(degrees: f64) -> (f64, f64) {
    let radians = (360.0 - degrees).rem_euclid(360.0).to_radians();
    // Keep axis-aligned rays on their pixel row/column
    let snap = |value: f64| if value.abs() < 1e-9 { 0.0 } else { value };
    (snap(radians.cos()), snap(radians.sin()))
}
