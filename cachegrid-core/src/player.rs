//! Player state: current cell, token inventory and movement trail.

use serde::{Deserialize, Serialize};

use crate::types::{Cell, LatLng, Token};

/// The player's held tokens. Stack discipline: last collected is first
/// deposited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    tokens: Vec<Token>,
}

impl Inventory {
    /// An empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An inventory holding `tokens`, bottom first.
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Push a token on top.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Pop the top token, if any.
    pub fn pop(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    /// Number of held tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Held tokens, bottom first.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Status-line rendering: `"5:-3#0, 5:-3#1"`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Where the player is, what they carry, and where they have been.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Current cell.
    pub cell: Cell,
    /// Held tokens.
    pub inventory: Inventory,
    /// Visited positions, oldest first. Append-only outside of reset.
    pub trail: Vec<LatLng>,
}

impl PlayerState {
    /// A player standing at `position` (inside `cell`) with nothing in hand
    /// and a single-point trail.
    #[must_use]
    pub fn start(cell: Cell, position: LatLng) -> Self {
        Self {
            cell,
            inventory: Inventory::new(),
            trail: vec![position],
        }
    }

    /// Move to `cell`, recording `position` on the trail.
    pub fn relocate(&mut self, cell: Cell, position: LatLng) {
        self.cell = cell;
        self.trail.push(position);
    }

    /// The most recent trail point, if any.
    #[must_use]
    pub fn position(&self) -> Option<LatLng> {
        self.trail.last().copied()
    }
}
