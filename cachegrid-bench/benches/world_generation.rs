//! cachegrid Benchmark Suite
//!
//! Per-interaction performance targets:
//!   oracle_luck_single ............... < 100ns
//!   regenerate_radius_8_fresh ........ < 100μs
//!   regenerate_radius_8_revisit ...... < 50μs
//!   snapshot_save_load_1000_caches ... < 5ms
//!   controller_move_step ............. < 200μs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cachegrid_core::config::GridConfig;
use cachegrid_core::grid::GridMapper;
use cachegrid_core::oracle::{self, SpawnRule};
use cachegrid_core::persistence::{MemoryStore, PersistenceGateway};
use cachegrid_core::state::WorldState;
use cachegrid_core::types::{Cell, LatLng};
use cachegrid_core::viewport::{self, Materializer};
use cachegrid_session::{Command, Controller, Direction, RecordingSurface};

fn origin_state() -> WorldState {
    WorldState::fresh(&GridMapper::default(), SpawnRule::default(), LatLng::NULL_ISLAND)
}

/// Benchmark: one oracle draw (target: < 100ns).
fn bench_oracle(c: &mut Criterion) {
    c.bench_function("oracle_luck_single", |b| {
        b.iter(|| black_box(oracle::luck(black_box("369894,-1220628"))));
    });
}

/// Benchmark: materializer pass over never-seen cells (target: < 100μs).
fn bench_regenerate_fresh(c: &mut Criterion) {
    let grid = GridMapper::default();
    let rule = SpawnRule::default();
    let mut step = 0;
    let mut state = origin_state();
    let mut materializer = Materializer::new(8, rule);

    c.bench_function("regenerate_radius_8_fresh", |b| {
        b.iter(|| {
            // Jump a full window each time so every spawn is a first visit.
            step += 16;
            let n = materializer
                .regenerate(Cell::new(step, 0), &mut state.world, &grid)
                .len();
            black_box(n);
        });
    });
}

/// Benchmark: materializer pass over remembered cells (target: < 50μs).
fn bench_regenerate_revisit(c: &mut Criterion) {
    let grid = GridMapper::default();
    let mut state = origin_state();
    let mut materializer = Materializer::new(8, SpawnRule::default());
    materializer.regenerate(Cell::new(0, 0), &mut state.world, &grid);

    c.bench_function("regenerate_radius_8_revisit", |b| {
        b.iter(|| {
            let n = materializer
                .regenerate(black_box(Cell::new(0, 0)), &mut state.world, &grid)
                .len();
            black_box(n);
        });
    });
}

/// Benchmark: whole-world save then load with ~1000 caches (target: < 5ms).
fn bench_snapshot_round_trip(c: &mut Criterion) {
    let rule = SpawnRule::default();
    let mut state = origin_state();
    for cell in viewport::spawned_cells(Cell::new(0, 0), 50, &rule) {
        state.world.get_or_create(cell);
    }
    let mut gateway = PersistenceGateway::new(MemoryStore::new(), "bench.snapshot");

    c.bench_function("snapshot_save_load_1000_caches", |b| {
        b.iter(|| {
            gateway.save(&state).expect("save");
            black_box(gateway.load(rule).expect("load"));
        });
    });
}

/// Benchmark: one controller move including surface redraw (target: < 200μs).
fn bench_controller_move(c: &mut Criterion) {
    let mut controller = Controller::start(
        GridConfig::default(),
        MemoryStore::new(),
        RecordingSurface::new(),
        false,
    );
    let mut north = true;

    c.bench_function("controller_move_step", |b| {
        b.iter(|| {
            let direction = if north { Direction::North } else { Direction::South };
            north = !north;
            black_box(controller.dispatch(Command::Move(direction)));
        });
    });
}

criterion_group!(
    benches,
    bench_oracle,
    bench_regenerate_fresh,
    bench_regenerate_revisit,
    bench_snapshot_round_trip,
    bench_controller_move,
);
criterion_main!(benches);
