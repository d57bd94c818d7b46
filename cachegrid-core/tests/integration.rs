//! Integration Tests — End-to-End World Flows
//!
//! Complete scenarios across oracle, world memory, viewport and persistence:
//! fresh-world generation, collect/deposit, save/load round trips, and the
//! full session lifecycle.

use cachegrid_core::cache::Cache;
use cachegrid_core::config::{GridConfig, PersistenceConfig};
use cachegrid_core::grid::GridMapper;
use cachegrid_core::oracle::{self, SpawnRule};
use cachegrid_core::persistence::{DurableStore, MemoryStore, PersistenceGateway, SqliteStore};
use cachegrid_core::player::{Inventory, PlayerState};
use cachegrid_core::snapshot::PersistedSnapshot;
use cachegrid_core::state::WorldState;
use cachegrid_core::types::{Cell, LatLng, Token};
use cachegrid_core::viewport::{self, Materializer};
use cachegrid_core::world::WorldMemory;

const KEY: &str = "cachegrid.snapshot";

fn serials(cache: &Cache) -> Vec<u32> {
    cache.tokens().iter().map(|t| t.serial).collect()
}

// ---------------------------------------------------------------------------
// Fresh world: R = 8 around (0, 0), p = 0.1
// ---------------------------------------------------------------------------

#[test]
fn fresh_world_spawns_exactly_the_oracle_cells() {
    let rule = SpawnRule::new(0.1, 5);
    let grid = GridMapper::default();
    let mut world = WorldMemory::new(rule);
    let mut materializer = Materializer::new(8, rule);

    let spawned: Vec<Cell> = materializer
        .regenerate(Cell::new(0, 0), &mut world, &grid)
        .iter()
        .map(|m| m.cell)
        .collect();

    let mut expected = Vec::new();
    for i in -8..8 {
        for j in -8..8 {
            if oracle::luck(&format!("{i},{j}")) < 0.1 {
                expected.push(Cell::new(i, j));
            }
        }
    }

    assert_eq!(spawned, expected);
    assert_eq!(spawned.len(), 27);
    for cell in &spawned {
        let count = world.get(*cell).expect("generated").len();
        let drawn = oracle::luck(&format!("{},{},initialCoins", cell.i, cell.j));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let reference = (drawn * 5.0 + 1.0).floor() as usize;
        assert_eq!(count, reference, "token count at {cell}");
    }
}

// ---------------------------------------------------------------------------
// Collect / deposit on a three-token cache
// ---------------------------------------------------------------------------

#[test]
fn collect_then_deposit_scenario() {
    let home = Cell::new(3, 3);
    let mut cache = Cache::new(home, 3);
    let mut inventory = Inventory::new();

    assert_eq!(serials(&cache), vec![0, 1, 2]);

    assert!(cache.collect(&mut inventory));
    assert_eq!(serials(&cache), vec![0, 1]);
    assert_eq!(inventory.tokens(), &[Token::new(home, 2)]);

    assert!(cache.deposit(&mut inventory));
    assert_eq!(serials(&cache), vec![0, 1, 2]);
    assert!(inventory.is_empty());
}

#[test]
fn deposited_tokens_keep_their_home_cell() {
    let mut world = WorldMemory::new(SpawnRule::default());
    let a = Cell::new(-8, -1);
    let b = Cell::new(-8, 7);
    world.get_or_create(a);
    world.get_or_create(b);

    let mut inventory = Inventory::new();
    assert!(world.get_mut(a).expect("a").collect(&mut inventory));
    assert!(world.get_mut(b).expect("b").deposit(&mut inventory));

    let top = *world.get(b).expect("b").tokens().last().expect("non-empty");
    assert_eq!(top.home_cell, a);
    assert_eq!(top.to_string(), format!("{a}#{}", top.serial));
}

// ---------------------------------------------------------------------------
// Save / load: player at (5, -3), one held token, one two-token cache
// ---------------------------------------------------------------------------

#[test]
fn save_load_round_trip_scenario() {
    let rule = SpawnRule::default();
    let visited = Cell::new(5, -3);

    let mut world = WorldMemory::new(rule);
    world
        .get_or_create(visited)
        .restore(&Cache::new(visited, 2).capture());
    let mut player = PlayerState::start(visited, GridMapper::default().cell_center(visited));
    player.inventory.push(Token::new(Cell::new(9, 9), 0));
    let state = WorldState { player, world };

    let mut gateway = PersistenceGateway::new(
        SqliteStore::open_in_memory(&PersistenceConfig::default()).expect("open"),
        KEY,
    );
    gateway.save(&state).expect("save");
    let loaded = gateway.load(rule).expect("load").expect("Some");

    assert_eq!(loaded.player.cell, visited);
    assert_eq!(loaded.player.inventory.tokens(), &[Token::new(Cell::new(9, 9), 0)]);
    assert_eq!(loaded.world.len(), 1);
    assert_eq!(
        loaded.world.get(visited).expect("cache").tokens(),
        &[Token::new(visited, 0), Token::new(visited, 1)]
    );
    assert_eq!(loaded, state);
}

#[test]
fn snapshot_written_elsewhere_restores_here() {
    // A snapshot produced by another process is just text in the store.
    let json = r#"{
        "playerCell": {"i": 5, "j": -3},
        "playerInventory": [{"serial": 2, "homeCell": {"i": 5, "j": -3}}],
        "worldMemoryStore": {
            "5:-3": [
                {"serial": 0, "homeCell": {"i": 5, "j": -3}},
                {"serial": 1, "homeCell": {"i": 5, "j": -3}}
            ]
        },
        "movementTrail": [{"lat": 0.00055, "lng": -0.00025}]
    }"#;
    let mut store = MemoryStore::new();
    store.set_item(KEY, json).expect("seed");
    let gateway = PersistenceGateway::new(store, KEY);

    let state = gateway.load(SpawnRule::default()).expect("load").expect("Some");
    assert_eq!(state.player.cell, Cell::new(5, -3));
    assert_eq!(state.total_tokens(), 3);
    assert_eq!(state.player.position(), Some(LatLng::new(0.000_55, -0.000_25)));
}

// ---------------------------------------------------------------------------
// Full lifecycle: generate → mutate → move away → persist → restart → return
// ---------------------------------------------------------------------------

#[test]
fn full_session_lifecycle() {
    let config = GridConfig::default();
    let rule = config.world.spawn_rule();
    let grid = GridMapper::from_config(&config.world);
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("session.db");

    // 1. First session: generate around the start and collect everything
    //    from the first cache.
    let mut state = WorldState::from_config(&config);
    let mut materializer = Materializer::new(config.world.neighborhood_radius, rule);
    let home = state.player_cell();
    let first = materializer
        .regenerate(home, &mut state.world, &grid)
        .first()
        .map(|m| m.cell)
        .expect("at least one cache near the start");
    while state.collect(first) {}
    assert!(state.world.get(first).expect("first").is_empty());

    // 2. Walk far away; the emptied cache leaves the viewport.
    let far = home.offset(1_000, 0);
    state.player.relocate(far, grid.cell_center(far));
    materializer.regenerate(far, &mut state.world, &grid);
    assert!(!materializer.is_materialized(first));
    // The far pass generated new caches; count everything now known.
    let total = state.total_tokens();

    // 3. Persist and drop everything.
    {
        let store = SqliteStore::open(&db_path, &config.persistence).expect("open");
        PersistenceGateway::new(store, KEY).save(&state).expect("save");
    }

    // 4. Second session: restore and walk back.
    let store = SqliteStore::open(&db_path, &config.persistence).expect("reopen");
    let mut restored = PersistenceGateway::new(store, KEY)
        .load(rule)
        .expect("load")
        .expect("Some");
    assert_eq!(restored.player.cell, far);
    assert_eq!(restored.player.trail.len(), 2);

    let mut materializer = Materializer::new(config.world.neighborhood_radius, rule);
    materializer.regenerate(home, &mut restored.world, &grid);
    assert!(materializer.is_materialized(first));
    assert!(restored.world.get(first).expect("first").is_empty());
    assert_eq!(restored.total_tokens(), total);
}

#[test]
fn snapshot_token_count_matches_state() {
    let mut state = WorldState::from_config(&GridConfig::default());
    let rule = SpawnRule::default();
    for cell in viewport::spawned_cells(state.player_cell(), 8, &rule) {
        state.world.get_or_create(cell);
    }
    let snapshot = PersistedSnapshot::capture(&state);
    assert_eq!(snapshot.total_tokens(), state.total_tokens());
}
