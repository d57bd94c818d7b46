//! Explicit commands dispatched to the controller, and what they produced.
//!
//! Every input source (buttons, keys, the geolocation stream, the autosave
//! timer) is reduced to a [`Command`]. The headless driver reads them as
//! text lines:
//!
//! ```text
//! north | south | east | west        one-cell moves (also n / s / e / w)
//! move <di> <dj>                     arbitrary cell offset
//! geo <lat> <lng>                    geolocation update
//! sensor                             enable geolocation
//! collect <i>:<j> | deposit <i>:<j>  token transfer at a materialized cache
//! save | load | reset | autosave
//! ```

use std::fmt;
use std::str::FromStr;

use cachegrid_core::types::{Cell, LatLng, Token};
use thiserror::Error;

/// A cardinal direction. North is `+i`, east is `+j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward increasing latitude.
    North,
    /// Toward decreasing latitude.
    South,
    /// Toward increasing longitude.
    East,
    /// Toward decreasing longitude.
    West,
}

impl Direction {
    /// Cell offset `(di, dj)` of a one-step move.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (1, 0),
            Self::South => (-1, 0),
            Self::East => (0, 1),
            Self::West => (0, -1),
        }
    }
}

/// A discrete input to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Step one cell.
    Move(Direction),
    /// Shift by an arbitrary cell offset.
    MoveBy {
        /// Offset along `i`.
        di: i32,
        /// Offset along `j`.
        dj: i32,
    },
    /// A position reported by the geolocation stream.
    Geolocation(LatLng),
    /// Subscribe to geolocation updates.
    EnableGeolocation,
    /// Move the top token of the cache at the cell into the inventory.
    Collect(Cell),
    /// Move the inventory's top token onto the cache at the cell.
    Deposit(Cell),
    /// Explicit save.
    Save,
    /// Explicit load.
    Load,
    /// Destroy the durable snapshot and restart the player.
    Reset,
    /// Timer-driven save.
    AutoSave,
}

/// Why a text line did not parse as a [`Command`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// First word is not a known command.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// A required argument was not given.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// Command word.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// An argument did not parse.
    #[error("{command}: invalid argument {value:?}")]
    InvalidArgument {
        /// Command word.
        command: &'static str,
        /// The offending text.
        value: String,
    },
}

fn arg<'a, T: FromStr>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<T, ParseCommandError> {
    let value = words
        .next()
        .ok_or(ParseCommandError::MissingArgument { command, argument })?;
    value.parse().map_err(|_| ParseCommandError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseCommandError::Empty);
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "north" | "n" => Self::Move(Direction::North),
            "south" | "s" => Self::Move(Direction::South),
            "east" | "e" => Self::Move(Direction::East),
            "west" | "w" => Self::Move(Direction::West),
            "move" => Self::MoveBy {
                di: arg(&mut words, "move", "di")?,
                dj: arg(&mut words, "move", "dj")?,
            },
            "geo" => Self::Geolocation(LatLng::new(
                arg(&mut words, "geo", "lat")?,
                arg(&mut words, "geo", "lng")?,
            )),
            "sensor" => Self::EnableGeolocation,
            "collect" => Self::Collect(arg(&mut words, "collect", "cell")?),
            "deposit" => Self::Deposit(arg(&mut words, "deposit", "cell")?),
            "save" => Self::Save,
            "load" => Self::Load,
            "reset" => Self::Reset,
            "autosave" => Self::AutoSave,
            _ => return Err(ParseCommandError::Unknown(head.to_string())),
        };
        Ok(command)
    }
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The player moved; `materialized` caches are now in view.
    Moved {
        /// New player cell.
        cell: Cell,
        /// Caches materialized around it.
        materialized: usize,
    },
    /// A collect ran; `None` when the cache was empty.
    Collected {
        /// Cache cell.
        cell: Cell,
        /// The token moved into the inventory.
        token: Option<Token>,
    },
    /// A deposit ran; `None` when the inventory was empty.
    Deposited {
        /// Cache cell.
        cell: Cell,
        /// The token moved onto the cache.
        token: Option<Token>,
    },
    /// Collect/deposit aimed at a cell with no cache in view.
    NotMaterialized(Cell),
    /// The snapshot was written.
    Saved {
        /// Encoded size.
        bytes: usize,
    },
    /// The snapshot write failed; the session continues.
    SaveFailed,
    /// A load ran; `found` is false when nothing usable was stored.
    Loaded {
        /// Whether a snapshot was applied.
        found: bool,
    },
    /// The store could not be read; the session continues unchanged.
    LoadFailed,
    /// Player and durable snapshot were reset.
    Reset,
    /// Geolocation updates now move the player.
    GeolocationEnabled,
    /// The host has no geolocation capability.
    GeolocationUnavailable,
    /// The command had no effect.
    Ignored,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moved { cell, materialized } => {
                write!(f, "moved to {cell} ({materialized} caches in view)")
            }
            Self::Collected { cell, token: Some(t) } => write!(f, "collected {t} from {cell}"),
            Self::Collected { cell, token: None } => write!(f, "cache at {cell} is empty"),
            Self::Deposited { cell, token: Some(t) } => write!(f, "deposited {t} into {cell}"),
            Self::Deposited { token: None, .. } => write!(f, "inventory is empty"),
            Self::NotMaterialized(cell) => write!(f, "no cache in view at {cell}"),
            Self::Saved { bytes } => write!(f, "saved ({bytes} bytes)"),
            Self::SaveFailed => write!(f, "save failed"),
            Self::Loaded { found: true } => write!(f, "loaded"),
            Self::Loaded { found: false } => write!(f, "nothing to load"),
            Self::LoadFailed => write!(f, "load failed"),
            Self::Reset => write!(f, "reset"),
            Self::GeolocationEnabled => write!(f, "geolocation enabled"),
            Self::GeolocationUnavailable => write!(f, "geolocation unavailable"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}
