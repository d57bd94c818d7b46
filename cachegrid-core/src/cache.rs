//! Cache entity and its memento.
//!
//! A [`Cache`] is bound to exactly one cell and owns an ordered stack of
//! tokens. Its existence is logical: it lives in world memory whether or
//! not anything is currently drawing it.
//!
//! A [`Memento`] is the serializable capture of a cache's token stack.
//! `restore(capture())` leaves the stack observably unchanged, which is what
//! lets a cache leave the viewport and come back with identical contents.
//! The memento's serde shape (an ordered JSON list of tokens) is also the
//! persisted format, so a memento written by one process restores in another.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::player::Inventory;
use crate::types::{Cell, Token};

/// A token stack bound to a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    cell: Cell,
    tokens: Vec<Token>,
}

impl Cache {
    /// A fresh cache at `cell` holding serials `0..token_count`, each stamped
    /// with `cell` as its home.
    #[must_use]
    pub fn new(cell: Cell, token_count: u32) -> Self {
        Self {
            cell,
            tokens: (0..token_count).map(|serial| Token::new(cell, serial)).collect(),
        }
    }

    /// An empty cache at `cell`, ready to be restored from a memento.
    #[must_use]
    pub const fn empty(cell: Cell) -> Self {
        Self {
            cell,
            tokens: Vec::new(),
        }
    }

    /// The cell this cache is bound to.
    #[must_use]
    pub const fn cell(&self) -> Cell {
        self.cell
    }

    /// Tokens, bottom first.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Capture the token stack.
    #[must_use]
    pub fn capture(&self) -> Memento {
        Memento {
            tokens: self.tokens.clone(),
        }
    }

    /// Replace the token stack wholesale with the memento's contents.
    ///
    /// Tokens need not be homed at this cache's cell; deposits move tokens
    /// between cells.
    pub fn restore(&mut self, memento: &Memento) {
        self.tokens.clone_from(&memento.tokens);
    }

    /// Move the top token into `inventory`.
    ///
    /// Returns `false`, touching nothing, when the cache is empty.
    pub fn collect(&mut self, inventory: &mut Inventory) -> bool {
        match self.tokens.pop() {
            Some(token) => {
                inventory.push(token);
                true
            }
            None => false,
        }
    }

    /// Move the inventory's top token onto this cache.
    ///
    /// Returns `false`, touching nothing, when the inventory is empty.
    pub fn deposit(&mut self, inventory: &mut Inventory) -> bool {
        match inventory.pop() {
            Some(token) => {
                self.tokens.push(token);
                true
            }
            None => false,
        }
    }

    /// Popup-style description: `"Cache at 3,4 with 2 tokens."`.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Cache at {},{} with {} tokens.",
            self.cell.i,
            self.cell.j,
            self.tokens.len()
        )
    }
}

/// Serializable capture of a cache's token stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Memento {
    tokens: Vec<Token>,
}

impl Memento {
    /// A memento holding `tokens`, bottom first.
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Captured tokens, bottom first.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of captured tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the capture is of an empty cache.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Encode as a JSON string.
    ///
    /// # Errors
    /// Returns [`GridError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GridError::Serialization(e.to_string()))
    }

    /// Decode from a JSON string.
    ///
    /// # Errors
    /// Returns [`GridError::MalformedSnapshot`] if `json` is not an ordered
    /// list of tokens.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GridError::MalformedSnapshot(e.to_string()))
    }
}
