//! The explicit world state object.
//!
//! Everything that changes during a session lives here and is passed by
//! `&mut` to whatever mutates it; there is no module-level shared state.

use crate::config::GridConfig;
use crate::grid::GridMapper;
use crate::oracle::SpawnRule;
use crate::player::PlayerState;
use crate::types::{Cell, LatLng};
use crate::world::WorldMemory;

/// Player plus world memory.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    /// The player.
    pub player: PlayerState,
    /// Every cache generated so far.
    pub world: WorldMemory,
}

impl WorldState {
    /// A clean implicit world with the player at `start`.
    #[must_use]
    pub fn fresh(grid: &GridMapper, rule: SpawnRule, start: LatLng) -> Self {
        Self {
            player: PlayerState::start(grid.to_cell(start), start),
            world: WorldMemory::new(rule),
        }
    }

    /// A clean world as described by `config`.
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        Self::fresh(
            &GridMapper::from_config(&config.world),
            config.world.spawn_rule(),
            config.player.start_position(),
        )
    }

    /// The player's current cell.
    #[must_use]
    pub const fn player_cell(&self) -> Cell {
        self.player.cell
    }

    /// Tokens across every cache and the inventory. Collect and deposit never
    /// change this.
    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.world.total_tokens() + self.player.inventory.len()
    }

    /// Collect the top token of the cache at `cell` into the inventory.
    ///
    /// Returns `false` when no cache exists there or it is empty.
    pub fn collect(&mut self, cell: Cell) -> bool {
        self.world
            .get_mut(cell)
            .is_some_and(|cache| cache.collect(&mut self.player.inventory))
    }

    /// Deposit the inventory's top token into the cache at `cell`.
    ///
    /// Returns `false` when no cache exists there or the inventory is empty.
    pub fn deposit(&mut self, cell: Cell) -> bool {
        self.world
            .get_mut(cell)
            .is_some_and(|cache| cache.deposit(&mut self.player.inventory))
    }
}
