//! Property-Based Tests for cachegrid-core
//!
//! Uses `proptest` to check the world invariants under random inputs: the
//! oracle is a pure function, mementos restore exactly, collect/deposit
//! conserve tokens, and a cache's contents survive leaving and re-entering
//! the viewport.

use proptest::prelude::*;

use cachegrid_core::cache::{Cache, Memento};
use cachegrid_core::grid::GridMapper;
use cachegrid_core::oracle::{self, SpawnRule};
use cachegrid_core::persistence::{MemoryStore, PersistenceGateway};
use cachegrid_core::player::Inventory;
use cachegrid_core::state::WorldState;
use cachegrid_core::types::{Cell, LatLng, Token};
use cachegrid_core::viewport::Materializer;
use cachegrid_core::world::WorldMemory;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_cell() -> impl Strategy<Value = Cell> {
    (-2_000_000..2_000_000i32, -2_000_000..2_000_000i32).prop_map(|(i, j)| Cell::new(i, j))
}

fn arb_token() -> impl Strategy<Value = Token> {
    (arb_cell(), 0..16u32).prop_map(|(home, serial)| Token::new(home, serial))
}

/// A player action at a cell near the origin.
#[derive(Debug, Clone, Copy)]
enum Action {
    Collect(Cell),
    Deposit(Cell),
}

fn arb_actions() -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(
        (any::<bool>(), -8..8i32, -8..8i32).prop_map(|(collect, i, j)| {
            if collect {
                Action::Collect(Cell::new(i, j))
            } else {
                Action::Deposit(Cell::new(i, j))
            }
        }),
        0..200,
    )
}

fn origin_state() -> WorldState {
    WorldState::fresh(&GridMapper::default(), SpawnRule::default(), LatLng::NULL_ISLAND)
}

// ---------------------------------------------------------------------------
// Property: the oracle is a pure function of its key
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn luck_is_deterministic_and_in_range(key in ".{0,40}") {
        let a = oracle::luck(&key);
        let b = oracle::luck(&key);
        prop_assert_eq!(a.to_bits(), b.to_bits());
        prop_assert!((0.0..1.0).contains(&a));
    }

    #[test]
    fn spawn_and_count_depend_only_on_cell(cell in arb_cell()) {
        let rule = SpawnRule::default();
        prop_assert_eq!(rule.spawns(cell), rule.spawns(cell));
        let n = rule.initial_tokens(cell);
        prop_assert!((1..=5).contains(&n));
        prop_assert_eq!(n, rule.initial_tokens(cell));
    }
}

// ---------------------------------------------------------------------------
// Property: first generation yields serials 0..n homed at the cell
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn generated_cache_has_sequential_serials(cell in arb_cell()) {
        let mut world = WorldMemory::new(SpawnRule::default());
        let cache = world.get_or_create(cell);
        let expected: Vec<Token> = (0..SpawnRule::default().initial_tokens(cell))
            .map(|s| Token::new(cell, s))
            .collect();
        prop_assert_eq!(cache.tokens(), expected.as_slice());
    }
}

// ---------------------------------------------------------------------------
// Property: restore(capture()) is identity, and mementos are values
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn memento_restores_exact_sequence(
        cell in arb_cell(),
        tokens in prop::collection::vec(arb_token(), 0..20),
    ) {
        let mut source = Cache::empty(cell);
        source.restore(&Memento::from_tokens(tokens.clone()));
        let memento = source.capture();

        let mut target = Cache::new(cell, 3);
        target.restore(&memento);
        prop_assert_eq!(target.tokens(), tokens.as_slice());

        // Mutating the source after capture leaves the memento alone.
        let mut inv = Inventory::new();
        source.collect(&mut inv);
        prop_assert_eq!(memento.tokens(), tokens.as_slice());

        let decoded = Memento::from_json(&memento.to_json().expect("encode")).expect("decode");
        prop_assert_eq!(decoded, memento);
    }
}

// ---------------------------------------------------------------------------
// Property: collect/deposit conserve the token total
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn actions_conserve_tokens(actions in arb_actions()) {
        let mut state = origin_state();
        let mut materializer = Materializer::new(8, SpawnRule::default());
        materializer.regenerate(state.player_cell(), &mut state.world, &GridMapper::default());
        let total = state.total_tokens();

        for action in actions {
            match action {
                Action::Collect(cell) => { state.collect(cell); }
                Action::Deposit(cell) => { state.deposit(cell); }
            }
            prop_assert_eq!(state.total_tokens(), total);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: leaving and re-entering the viewport preserves contents
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rematerialize_preserves_contents(
        actions in arb_actions(),
        detour in 17..10_000i32,
    ) {
        let grid = GridMapper::default();
        let mut state = origin_state();
        let mut materializer = Materializer::new(8, SpawnRule::default());
        let home = state.player_cell();
        materializer.regenerate(home, &mut state.world, &grid);

        for action in actions {
            match action {
                Action::Collect(cell) => { state.collect(cell); }
                Action::Deposit(cell) => { state.deposit(cell); }
            }
        }
        let before = state.world.capture_all();

        materializer.regenerate(home.offset(detour, -detour), &mut state.world, &grid);
        materializer.dematerialize_all();
        let cells: Vec<Cell> = materializer
            .regenerate(home, &mut state.world, &grid)
            .iter()
            .map(|m| m.cell)
            .collect();

        for cell in cells {
            prop_assert_eq!(
                state.world.get(cell).expect("materialized").capture(),
                before[&cell].clone()
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property: save → load reproduces the state
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn save_load_round_trip(actions in arb_actions(), steps in 0..20i32) {
        let grid = GridMapper::default();
        let mut state = origin_state();
        let mut materializer = Materializer::new(8, SpawnRule::default());
        materializer.regenerate(state.player_cell(), &mut state.world, &grid);
        for action in actions {
            match action {
                Action::Collect(cell) => { state.collect(cell); }
                Action::Deposit(cell) => { state.deposit(cell); }
            }
        }
        for step in 0..steps {
            let cell = Cell::new(step, -step);
            state.player.relocate(cell, grid.cell_center(cell));
        }

        let mut gateway = PersistenceGateway::new(MemoryStore::new(), "snapshot");
        gateway.save(&state).expect("save");
        let loaded = gateway.load(SpawnRule::default()).expect("load");
        prop_assert_eq!(loaded, Some(state));
    }
}

// ---------------------------------------------------------------------------
// Property: position → cell is a left inverse of cell → position
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn grid_left_inverse(cell in arb_cell()) {
        let grid = GridMapper::default();
        prop_assert_eq!(grid.to_cell(grid.to_position(cell)), cell);
        prop_assert_eq!(grid.to_cell(grid.cell_center(cell)), cell);
        prop_assert!(grid.cell_bounds(cell).contains(grid.cell_center(cell)));
    }
}
