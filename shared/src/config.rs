use crate::{
    CAR_SIZE, EDGE_MARGIN_MAX, EDGE_MARGIN_MIN, MAX_SPEED, MAX_STEERING, MAX_THROTTLE, MIN_SPEED,
    PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH, RADAR_ANGLES, RADAR_COUNT, RADAR_MAX_LENGTH, SPAWN_X,
    SPAWN_Y,
};
use serde::{Deserialize, Serialize};

/// Tuning for a single race.
///
/// Every [`crate::VehicleState`] carries its own copy, so races with different
/// tuning can run side by side in one process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub playfield_width: f64,
    pub playfield_height: f64,
    /// Side length of the square body; corners sit at half this from the center.
    pub car_size: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Speed change for a full-throttle action.
    pub max_throttle: f64,
    /// Heading change in degrees for a full-lock action.
    pub max_steering: f64,
    pub radar_max_length: u32,
    /// Cast angles relative to the heading, in observation order.
    pub radar_angles: [f64; RADAR_COUNT],
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub spawn_heading: f64,
    pub edge_margin_min: f64,
    pub edge_margin_max: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            playfield_width: PLAYFIELD_WIDTH,
            playfield_height: PLAYFIELD_HEIGHT,
            car_size: CAR_SIZE,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            max_throttle: MAX_THROTTLE,
            max_steering: MAX_STEERING,
            radar_max_length: RADAR_MAX_LENGTH,
            radar_angles: RADAR_ANGLES,
            spawn_x: SPAWN_X,
            spawn_y: SPAWN_Y,
            spawn_heading: 0.0,
            edge_margin_min: EDGE_MARGIN_MIN,
            edge_margin_max: EDGE_MARGIN_MAX,
        }
    }
}

impl VehicleConfig {
    pub fn half_size(&self) -> f64 {
        self.car_size / 2.0
    }

    /// Interior rectangle `(min_x, max_x, min_y, max_y)` the body origin is clamped to.
    pub fn clamp_bounds(&self) -> (f64, f64, f64, f64) {
        let min_x = self.edge_margin_min;
        let min_y = self.edge_margin_min;
        // Degenerate playfields collapse to the margin instead of inverting the range.
        let max_x = (self.playfield_width - self.edge_margin_max).max(min_x);
        let max_y = (self.playfield_height - self.edge_margin_max).max(min_y);
        (min_x, max_x, min_y, max_y)
    }

    pub fn clamp_speed(&self, speed: f64) -> f64 {
        speed.max(self.min_speed).min(self.max_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let config = VehicleConfig::default();
        assert_eq!(config.min_speed, 10.0);
        assert_eq!(config.max_speed, 40.0);
        assert_eq!(config.radar_max_length, 300);
        assert_eq!(config.radar_angles, [-90.0, -45.0, 0.0, 45.0, 90.0]);
        assert_eq!(config.half_size(), 30.0);
    }

    #[test]
    fn test_clamp_bounds() {
        let config = VehicleConfig::default();
        let (min_x, max_x, min_y, max_y) = config.clamp_bounds();
        assert_eq!(min_x, 20.0);
        assert_eq!(max_x, 1800.0);
        assert_eq!(min_y, 20.0);
        assert_eq!(max_y, 960.0);
    }

    #[test]
    fn test_clamp_bounds_tiny_playfield() {
        let config = VehicleConfig {
            playfield_width: 50.0,
            playfield_height: 50.0,
            ..VehicleConfig::default()
        };
        let (min_x, max_x, min_y, max_y) = config.clamp_bounds();
        assert_eq!(min_x, max_x);
        assert_eq!(min_y, max_y);
    }

    #[test]
    fn test_clamp_speed() {
        let config = VehicleConfig::default();
        assert_eq!(config.clamp_speed(-100.0), 10.0);
        assert_eq!(config.clamp_speed(25.0), 25.0);
        assert_eq!(config.clamp_speed(1000.0), 40.0);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config: VehicleConfig =
            serde_json::from_str(r#"{ "max_speed": 60.0, "spawn_x": 100.0 }"#).unwrap();
        assert_eq!(config.max_speed, 60.0);
        assert_eq!(config.spawn_x, 100.0);
        assert_eq!(config.min_speed, 10.0);
    }
}
