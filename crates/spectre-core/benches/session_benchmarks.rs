//! Frame throughput benchmark.
//!
//! Measures one full frame (physics, contact dispatch, player, AI, hit-boxes
//! and fades) for levels with a growing number of phantoms. A frame must
//! stay well inside the 16.67ms budget of a 60 Hz host.
//!
//! Run with: `cargo bench --bench session_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use spectre_core::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn level_with_enemies(count: usize) -> LevelDescriptor {
    let kinds = ["purple", "green", "red"];
    let enemies: Vec<String> = (0..count)
        .map(|i| {
            let (x, y) = ((i % 16) as f64 * 48.0 - 360.0, (i / 16) as f64 * 48.0 - 200.0);
            format!(r#"{{ "kind": "{}", "position": [{x}, {y}] }}"#, kinds[i % 3])
        })
        .collect();
    let json = format!(
        r#"{{
            "spawn_point": [0, 0],
            "shapes": {{
                "player": {{ "type": "circle", "radius": 8 }},
                "phantom": {{ "type": "circle", "radius": 8 }},
                "wall": {{ "type": "box", "half_width": 400, "half_height": 8 }}
            }},
            "walls": [
                {{ "position": [0, -300], "shape": "wall" }},
                {{ "position": [0, 300], "shape": "wall" }}
            ],
            "enemies": [{}]
        }}"#,
        enemies.join(",")
    );
    LevelDescriptor::from_json_str(&json).expect("benchmark level parses")
}

fn warmed_loop(enemies: usize) -> FrameLoop {
    let config = GameConfig {
        fade_in_ticks: 1,
        ..Default::default()
    };
    let session = Session::build(&level_with_enemies(enemies), config, SessionEntry::new(1))
        .expect("benchmark session builds");
    let mut frames = FrameLoop::new(session);
    // Past the idle delay so everything is patrolling or chasing.
    for _ in 0..90 {
        frames.tick(Some(&InputState::default()));
    }
    frames
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    let walk = InputState {
        right: true,
        down: true,
        ..Default::default()
    };
    for enemies in [0usize, 16, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(enemies), &enemies, |b, &n| {
            let mut frames = warmed_loop(n);
            b.iter(|| black_box(frames.tick(Some(&walk))));
        });
    }
    group.finish();
}

fn bench_render_order(c: &mut Criterion) {
    let frames = warmed_loop(256);
    c.bench_function("render_order_256", |b| {
        b.iter(|| black_box(frames.session().render_order()))
    });
}

criterion_group!(benches, bench_frame, bench_render_order);
criterion_main!(benches);
