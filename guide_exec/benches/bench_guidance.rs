//! # Guidance Cycle Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::nav::{
    GlobalPosition, LocalPosition, MissionResult, NavState, PositionSetpoint,
    PositionSetpointTriplet
};
use guide_lib::{
    guidance::{DiffGuidance, GuidanceParams, UpstreamSamples},
    pursuit::PurePursuit
};

const LAT: f64 = 47.397742;
const LON: f64 = 8.545594;

fn guidance_benchmark(c: &mut Criterion) {
    // ---- Build a guidance instance on a 100 m leg ----

    let params = GuidanceParams::default();
    let mut guidance = DiffGuidance::new(PurePursuit::new(), &params);

    let samples = UpstreamSamples {
        global_pos: Some(GlobalPosition {
            lat_deg: LAT + 0.0001,
            lon_deg: LON + 0.00002,
            ..Default::default()
        }),
        local_pos: Some(LocalPosition {
            xy_global: true,
            ref_lat_deg: LAT,
            ref_lon_deg: LON,
            ref_timestamp_us: 1,
            heading_rad: 0.05,
            vel_north_ms: 1.0,
            ..Default::default()
        }),
        triplet: Some(PositionSetpointTriplet {
            timestamp_us: 0,
            previous: PositionSetpoint::new(LAT, LON),
            current: PositionSetpoint::new(LAT + 0.0009, LON),
            next: PositionSetpoint::new(LAT + 0.0009, LON + 0.001),
        }),
        mission_result: Some(MissionResult {
            valid: true,
            seq_total: 2,
            ..Default::default()
        }),
        nav_state: Some(NavState::Mission),
        ..Default::default()
    };

    // ---- Benchmarks ----

    c.bench_function("waypoint update", |b| b.iter(|| {
        guidance.update_waypoints(black_box(&samples), &params)
    }));

    c.bench_function("compute guidance", |b| b.iter(|| {
        guidance.compute_guidance(
            black_box(0.05),
            black_box(1.0),
            NavState::Mission,
            0.02,
            &params
        )
    }));
}

criterion_group!(benches, guidance_benchmark);
criterion_main!(benches);
