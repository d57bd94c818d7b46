//! Persisted snapshot format.
//!
//! The durable form of a session is one JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "playerCell": { "i": 5, "j": -3 },
//!   "playerInventory": [ { "serial": 2, "homeCell": { "i": 5, "j": -3 } } ],
//!   "worldMemoryStore": { "5:-3": [ { "serial": 0, "homeCell": { "i": 5, "j": -3 } } ] },
//!   "movementTrail": [ { "lat": 0.00055, "lng": -0.00025 } ],
//!   "savedAt": "2026-10-16T12:00:00Z"
//! }
//! ```
//!
//! Dedicated serde structs keep the on-disk shape independent of the
//! in-memory types. Decoding never yields a partially typed state:
//! [`PersistedSnapshot::into_state`] checks the shape explicitly and fails
//! with [`GridError::MalformedSnapshot`] on anything it cannot vouch for.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Memento;
use crate::error::{GridError, Result};
use crate::oracle::SpawnRule;
use crate::player::{Inventory, PlayerState};
use crate::state::WorldState;
use crate::types::{Cell, LatLng, Token};
use crate::world::WorldMemory;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Whole-session durable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    /// Format version; absent in the oldest saves.
    #[serde(default = "default_version")]
    pub version: u32,
    /// The player's cell.
    pub player_cell: Cell,
    /// Held tokens, bottom first.
    pub player_inventory: Vec<Token>,
    /// `"<i>:<j>"` → memento, for every cache ever generated.
    pub world_memory_store: BTreeMap<String, Memento>,
    /// Visited positions, oldest first.
    pub movement_trail: Vec<LatLng>,
    /// Wall-clock time of the save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl PersistedSnapshot {
    /// Capture `state`.
    #[must_use]
    pub fn capture(state: &WorldState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            player_cell: state.player.cell,
            player_inventory: state.player.inventory.tokens().to_vec(),
            world_memory_store: state
                .world
                .capture_all()
                .into_iter()
                .map(|(cell, memento)| (cell.key(), memento))
                .collect(),
            movement_trail: state.player.trail.clone(),
            saved_at: Some(Utc::now()),
        }
    }

    /// Encode as JSON.
    ///
    /// # Errors
    /// Returns [`GridError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GridError::Serialization(e.to_string()))
    }

    /// Decode from JSON.
    ///
    /// # Errors
    /// Returns [`GridError::MalformedSnapshot`] for truncated or foreign data.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GridError::MalformedSnapshot(e.to_string()))
    }

    /// Number of tokens recorded across the store and the inventory.
    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.player_inventory.len()
            + self
                .world_memory_store
                .values()
                .map(Memento::len)
                .sum::<usize>()
    }

    /// Validate and rebuild the world state this snapshot describes.
    ///
    /// # Errors
    /// Returns [`GridError::MalformedSnapshot`] if the version is unknown, a
    /// store key is not a canonical `"<i>:<j>"` cell key, a token identity
    /// appears twice, or a trail point is not finite.
    pub fn into_state(self, rule: SpawnRule) -> Result<WorldState> {
        if self.version == 0 || self.version > SNAPSHOT_VERSION {
            return Err(GridError::MalformedSnapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        if let Some(bad) = self.movement_trail.iter().find(|p| !p.is_finite()) {
            return Err(GridError::MalformedSnapshot(format!(
                "non-finite trail point {bad}"
            )));
        }

        let mut seen: HashSet<Token> = HashSet::with_capacity(self.total_tokens());
        let mut check_unique = |token: &Token| {
            if seen.insert(*token) {
                Ok(())
            } else {
                Err(GridError::MalformedSnapshot(format!(
                    "token {token} appears more than once"
                )))
            }
        };

        self.player_inventory.iter().try_for_each(&mut check_unique)?;

        let mut mementos = Vec::with_capacity(self.world_memory_store.len());
        for (key, memento) in self.world_memory_store {
            let cell: Cell = key
                .parse()
                .map_err(|e: GridError| GridError::MalformedSnapshot(e.to_string()))?;
            // Only the canonical spelling is accepted, so no two keys can
            // name the same cell.
            if cell.key() != key {
                return Err(GridError::MalformedSnapshot(format!(
                    "non-canonical cell key {key:?} (expected {:?})",
                    cell.key()
                )));
            }
            memento.tokens().iter().try_for_each(&mut check_unique)?;
            mementos.push((cell, memento));
        }

        Ok(WorldState {
            player: PlayerState {
                cell: self.player_cell,
                inventory: Inventory::from_tokens(self.player_inventory),
                trail: self.movement_trail,
            },
            world: WorldMemory::from_mementos(rule, mementos),
        })
    }
}
