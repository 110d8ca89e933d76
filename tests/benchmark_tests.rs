//! Performance benchmarks for the per-tick simulation work

use shared::{
    ClientMessage, GridTrack, ServerMessage, TrackSurface, VehicleConfig, VehicleState,
    RADAR_MAX_LENGTH,
};
use std::time::Instant;

/// Benchmarks a single full-length ray on an open surface
#[test]
fn benchmark_ray_casting() {
    let track = GridTrack::ring(1920, 1080);
    let mut vehicle = VehicleState::new(VehicleConfig::default());
    // Middle of the top lane, looking along it
    vehicle.place(1300.0, 110.0, 0.0);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let reading = vehicle.cast_ray(&track, 0.0);
        assert!(reading.distance <= RADAR_MAX_LENGTH);
    }

    let duration = start.elapsed();
    println!(
        "Ray casting: {} rays in {:?} ({:.2} μs/ray)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks full vehicle ticks, five rays each
#[test]
fn benchmark_vehicle_advance() {
    let track = GridTrack::ring(1920, 1080);
    let iterations = 2_000;
    let start = Instant::now();

    let mut vehicle = VehicleState::new(VehicleConfig::default());
    for tick in 0..iterations {
        if !vehicle.is_alive() {
            vehicle.reset();
        }
        let steering = if tick % 20 < 10 { 0.3 } else { -0.3 };
        vehicle.apply_action(steering, 0.2);
        vehicle.advance(&track);
        let _ = vehicle.compute_reward();
    }

    let duration = start.elapsed();
    println!(
        "Vehicle advance: {} ticks in {:?} ({:.2} μs/tick)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks encoding and decoding of the wire messages
#[test]
fn benchmark_protocol_codec() {
    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let request = ClientMessage::Action {
            steering: (i % 200) as f64 / 100.0 - 1.0,
            throttle: 0.5,
        };
        let decoded = ClientMessage::decode(&request.encode()).unwrap();
        assert!(matches!(decoded, ClientMessage::Action { .. }));

        let reply = ServerMessage::Step {
            radar: [10, 20, (i % 300) as u32, 300, 300],
            reward: 1.25,
            terminated: false,
        };
        let _ = ServerMessage::decode(&reply.encode()).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Protocol codec: {} round trips in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Stress test: building and sampling a large track
#[test]
fn stress_test_track_sampling() {
    let start = Instant::now();
    let track = GridTrack::ring(1920, 1080);

    let mut track_pixels = 0u64;
    for y in (0..track.height() as i64).step_by(4) {
        for x in (0..track.width() as i64).step_by(4) {
            if track.sample(x, y) == shared::Category::Track {
                track_pixels += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Track sampling: {} track pixels found in {:?}",
        track_pixels, duration
    );

    assert!(track_pixels > 0);
    assert!(duration.as_millis() < 2000);
}
