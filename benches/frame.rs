//! Frame-cost benchmarks for Bot Arena
//!
//! Covers the two per-frame hot paths: the raycast renderer and the
//! authoritative simulation tick, plus host snapshot construction.
//!
//! Run with: cargo bench --bench frame

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use bot_arena::config::Settings;
use bot_arena::game::map::TileMap;
use bot_arena::game::progression::Profile;
use bot_arena::game::simulation::Simulation;
use bot_arena::game::state::{Bot, BotKind, Human};
use bot_arena::net::sync::build_snapshots;
use bot_arena::render::raycast;
use bot_arena::render::Renderer;
use bot_arena::util::vec2::Vec2;

/// Simulation with `bots` grunts spread over the floor cells
fn crowded_sim(bots: usize) -> Simulation {
    let mut sim = Simulation::new("Bench", Profile::default(), Some(42));
    let cells: Vec<Vec2> = sim
        .map()
        .floor_cells()
        .iter()
        .map(|&(cx, cy)| Vec2::cell_center(cx, cy))
        .collect();

    let state = sim.state_mut();
    state.bots.clear();
    for i in 0..bots {
        let id = state.alloc_bot_id();
        let at = cells[(i * 7 + 11) % cells.len()];
        state.bots.push(Bot::spawn(id, BotKind::Grunt, at, 3));
    }
    sim
}

/// Benchmark the parallel column cast at various ray counts
fn bench_raycast(c: &mut Criterion) {
    let mut group = c.benchmark_group("raycast");
    group.sample_size(50);
    let map = TileMap::arena();

    for rays in [160, 220, 300] {
        group.throughput(Throughput::Elements(rays as u64));
        group.bench_with_input(BenchmarkId::new("columns", rays), &rays, |b, &rays| {
            b.iter(|| black_box(raycast::cast_columns(&map, Vec2::new(2.6, 2.6), 0.15, 1.05, rays)))
        });
    }
    group.finish();
}

/// Benchmark a complete frame: walls, sprite collection and compositing
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(50);

    for bots in [8, 24] {
        let sim = crowded_sim(bots);
        let mut renderer = Renderer::new(&Settings::default());

        group.bench_with_input(BenchmarkId::new("frame", bots), &bots, |b, _| {
            b.iter(|| black_box(renderer.render_state(sim.map(), sim.state(), 0)))
        });
    }
    group.finish();
}

/// Benchmark one simulation tick at various bot counts
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("sim_tick");
    group.sample_size(30);

    for bots in [8, 24, 64] {
        let mut sim = crowded_sim(bots);

        group.throughput(Throughput::Elements(bots as u64));
        group.bench_with_input(BenchmarkId::new("playing", bots), &bots, |b, _| {
            b.iter(|| black_box(sim.tick(black_box(1.0 / 60.0))))
        });
    }
    group.finish();
}

/// Benchmark per-peer snapshot construction
fn bench_snapshots(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshots");
    group.sample_size(50);

    for peers in [1, 3] {
        let mut sim = crowded_sim(24);
        for i in 0..peers {
            let id = format!("p{}", i + 1);
            let state = sim.state_mut();
            state.humans.push(Human::new(id.clone(), id, Vec2::new(6.5, 2.5), 0.0));
        }

        group.bench_with_input(BenchmarkId::new("build", peers), &peers, |b, _| {
            b.iter(|| black_box(build_snapshots(sim.state())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_raycast, bench_render, bench_tick, bench_snapshots);
criterion_main!(benches);
