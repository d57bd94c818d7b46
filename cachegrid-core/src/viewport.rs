//! Viewport materializer — which caches are currently "on the map".
//!
//! After every movement (or load, or reset) the neighborhood window around
//! the player is recomputed:
//!
//! ```text
//!   i ∈ [ci - R, ci + R)    j ∈ [cj - R, cj + R)
//! ```
//!
//! a `2R × 2R` square, one row and column short on the positive side because
//! of the half-open bounds. The asymmetry is part of the world's shape and is
//! reproduced exactly.
//!
//! Each pass tears down every materialized cache unconditionally, then asks
//! the oracle about each window cell in row-major order and materializes the
//! spawning ones through [`WorldMemory::get_or_create`]. A materialized cache
//! holds only its cell; contents are always read live from world memory, so
//! collect/deposit are visible immediately and teardown can never lose state.
//!
//! Passes take `&mut self` and `&mut WorldMemory`, so two can never overlap.

use std::time::Instant;

use tracing::debug;

use crate::grid::GridMapper;
use crate::oracle::SpawnRule;
use crate::types::{Cell, CellBounds};
use crate::world::WorldMemory;

/// Cells of the neighborhood window around `center`, row-major.
pub fn window(center: Cell, radius: u32) -> impl Iterator<Item = Cell> {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    let (i0, i1) = (center.i.saturating_sub(r), center.i.saturating_add(r));
    let (j0, j1) = (center.j.saturating_sub(r), center.j.saturating_add(r));
    (i0..i1).flat_map(move |i| (j0..j1).map(move |j| Cell::new(i, j)))
}

/// Window cells that hold a cache under `rule`, row-major.
#[must_use]
pub fn spawned_cells(center: Cell, radius: u32, rule: &SpawnRule) -> Vec<Cell> {
    window(center, radius).filter(|cell| rule.spawns(*cell)).collect()
}

/// A cache currently drawn in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterializedCache {
    /// The cache's cell; contents are looked up in world memory.
    pub cell: Cell,
    /// The rectangle the cache occupies.
    pub bounds: CellBounds,
}

/// Tracks the set of materialized caches.
#[derive(Debug, Clone)]
pub struct Materializer {
    radius: u32,
    rule: SpawnRule,
    materialized: Vec<MaterializedCache>,
    center: Option<Cell>,
    passes: u64,
}

impl Materializer {
    /// A materializer with nothing drawn yet.
    #[must_use]
    pub const fn new(radius: u32, rule: SpawnRule) -> Self {
        Self {
            radius,
            rule,
            materialized: Vec::new(),
            center: None,
            passes: 0,
        }
    }

    /// The neighborhood radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Recompute the window around `center` and materialize its caches.
    ///
    /// Caches seen for the first time are generated in `world`; caches seen
    /// before come back with whatever contents world memory holds.
    pub fn regenerate(
        &mut self,
        center: Cell,
        world: &mut WorldMemory,
        grid: &GridMapper,
    ) -> &[MaterializedCache] {
        let start = Instant::now();
        let known_before = world.len();

        self.dematerialize_all();
        for cell in window(center, self.radius) {
            if self.rule.spawns(cell) {
                world.get_or_create(cell);
                self.materialized.push(MaterializedCache {
                    cell,
                    bounds: grid.cell_bounds(cell),
                });
            }
        }
        self.center = Some(center);
        self.passes += 1;

        debug!(
            center = %center,
            radius = self.radius,
            materialized = self.materialized.len(),
            generated = world.len() - known_before,
            elapsed_us = start.elapsed().as_micros(),
            "Viewport regenerated"
        );
        &self.materialized
    }

    /// Drop every materialized cache. World memory is untouched.
    pub fn dematerialize_all(&mut self) {
        self.materialized.clear();
        self.center = None;
    }

    /// Currently materialized caches, row-major.
    #[must_use]
    pub fn materialized(&self) -> &[MaterializedCache] {
        &self.materialized
    }

    /// Whether the cache at `cell` is currently materialized.
    #[must_use]
    pub fn is_materialized(&self, cell: Cell) -> bool {
        self.materialized.iter().any(|m| m.cell == cell)
    }

    /// The center of the last pass, if anything is materialized.
    #[must_use]
    pub const fn center(&self) -> Option<Cell> {
        self.center
    }

    /// Number of passes run so far.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }
}
