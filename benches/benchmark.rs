use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand::rngs::StdRng;

use bevy::math::Vec2;
use sidestep::camera::{ScenePanning, smooth_damp};
use sidestep::path::{ColliderShape, EnemyPath, PathContext, PathSectionConfig, PointSourceConfig};
use sidestep::player::{Body2d, Dash, DashInput, physics_step};
use sidestep::settings::DashSettings;

/// Walk a mixed linear/random path forward to the end and back again.
fn bench_path_ping_pong(c: &mut Criterion) {
    let configs = vec![
        PathSectionConfig::Linear((0..32).map(|i| Vec2::new(i as f32, 0.0)).collect()),
        PathSectionConfig::Random {
            origin: Vec2::new(40.0, 0.0),
            points_range: 6.0,
            source: PointSourceConfig::Range { count: 32, collider: ColliderShape::Box { size: Vec2::ONE } },
        },
        PathSectionConfig::Random {
            origin: Vec2::new(60.0, 0.0),
            points_range: 6.0,
            source: PointSourceConfig::Manual((0..32).map(|i| Vec2::new(60.0 + i as f32, 3.0)).collect()),
        },
    ];
    let ctx = PathContext { enemy: Vec2::new(40.0, 0.0), target: Vec2::new(30.0, -5.0) };

    c.bench_function("path_ping_pong", |b| {
        b.iter(|| {
            let mut path = EnemyPath::from_configs(&configs).unwrap();
            let mut rng = StdRng::seed_from_u64(7);
            let mut visited = 0usize;
            while let Ok(Some(point)) = path.next_point(&ctx, &mut rng) {
                black_box(point.position);
                visited += 1;
            }
            while let Some(point) = path.previous_point() {
                black_box(point.position);
                visited += 1;
            }
            black_box(visited);
        })
    });
}

/// Follow + lock over a zig-zag panning chain with a target sweeping along it.
fn bench_panning_sweep(c: &mut Criterion) {
    let points: Vec<Vec2> = (0..16)
        .map(|i| if i % 2 == 0 { Vec2::new(i as f32 * 10.0, i as f32 * 5.0) } else { Vec2::new((i - 1) as f32 * 10.0 + 10.0, (i - 1) as f32 * 5.0) })
        .collect();

    c.bench_function("panning_sweep", |b| {
        b.iter(|| {
            let mut panning = ScenePanning::from_positions(&points).unwrap();
            let mut camera = panning.start_position();
            for step in 0..2_000usize {
                let t = step as f32 * 0.08;
                let target = Vec2::new(t, t * 0.5);
                camera = panning.follow(camera, black_box(target), 1.0 / 60.0);
                camera = panning.lock(camera, target);
            }
            black_box(camera);
        })
    });
}

fn bench_smooth_damp(c: &mut Criterion) {
    c.bench_function("smooth_damp", |b| {
        b.iter(|| {
            let mut velocity = 0.0;
            let mut x = 0.0;
            for i in 0..10_000usize {
                let target = if (i / 500) % 2 == 0 { 100.0 } else { -100.0 };
                x = smooth_damp(x, black_box(target), &mut velocity, 0.1, 1.0 / 60.0);
            }
            black_box(x);
        })
    });
}

/// Player body falling, dashing and holding for a few seconds of frames.
fn bench_player_frames(c: &mut Criterion) {
    c.bench_function("player_frames", |b| {
        b.iter(|| {
            let mut dash = Dash::new(DashSettings::default());
            let mut body = Body2d::default();
            let mut position = Vec2::new(0.0, 10.0);
            for frame in 0..600usize {
                dash.tick(&DashInput {
                    dash: frame % 90 == 0,
                    jump: frame % 90 == 45,
                    aim: Some(Vec2::new(1.0, 1.0).normalize()),
                    grounded: body.grounded,
                    mass: body.mass,
                    gravity_scale: body.initial_gravity_scale,
                    dt: 1.0 / 60.0,
                });
                for effect in dash.drain_effects() {
                    match effect {
                        sidestep::player::DashEffect::Impulse(dv) => body.apply_impulse(dv),
                        sidestep::player::DashEffect::Freeze => body.freeze(),
                        sidestep::player::DashEffect::Restore => body.restore(),
                        sidestep::player::DashEffect::Halt => body.velocity = Vec2::ZERO,
                        _ => {}
                    }
                }
                physics_step(&mut position, &mut body, 0.0, 30.0, 1.0 / 60.0);
            }
            black_box(position);
        })
    });
}

criterion_group!(benches, bench_path_ping_pong, bench_panning_sweep, bench_smooth_damp, bench_player_frames);
criterion_main!(benches);
