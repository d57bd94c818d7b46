//! Core value types for the cache grid.
//!
//! All types are plain data and serializable; their serde shape is the
//! persisted snapshot format, so field renames here are format changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GridError;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A discrete grid square, addressed by integer row `i` (latitude axis) and
/// column `j` (longitude axis).
///
/// The cell space is unbounded and implicit; only cells the player has seen
/// are ever instantiated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    /// Row index (latitude axis).
    pub i: i32,
    /// Column index (longitude axis).
    pub j: i32,
}

impl Cell {
    /// Create a cell from its row and column.
    #[must_use]
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// The cell shifted by `(di, dj)`.
    #[must_use]
    pub const fn offset(self, di: i32, dj: i32) -> Self {
        Self {
            i: self.i.saturating_add(di),
            j: self.j.saturating_add(dj),
        }
    }

    /// The `"<i>:<j>"` key used by the persisted world-memory map.
    #[must_use]
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.i, self.j)
    }
}

impl FromStr for Cell {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (i, j) = s
            .split_once(':')
            .ok_or_else(|| GridError::InvalidCellKey(s.to_string()))?;
        let i = i
            .trim()
            .parse()
            .map_err(|_| GridError::InvalidCellKey(s.to_string()))?;
        let j = j
            .trim()
            .parse()
            .map_err(|_| GridError::InvalidCellKey(s.to_string()))?;
        Ok(Self { i, j })
    }
}

// ---------------------------------------------------------------------------
// Continuous positions
// ---------------------------------------------------------------------------

/// A continuous position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Null Island — the origin the grid is anchored at by default.
    pub const NULL_ISLAND: Self = Self { lat: 0.0, lng: 0.0 };

    /// Create a new position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// The axis-aligned rectangle a cell covers, as handed to a render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    /// South-west (minimum) corner.
    pub south_west: LatLng,
    /// North-east (maximum) corner.
    pub north_east: LatLng,
}

impl CellBounds {
    /// Whether `pos` lies inside the half-open rectangle.
    #[must_use]
    pub fn contains(&self, pos: LatLng) -> bool {
        pos.lat >= self.south_west.lat
            && pos.lat < self.north_east.lat
            && pos.lng >= self.south_west.lng
            && pos.lng < self.north_east.lng
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// An immutable, uniquely identified token ("coin").
///
/// Identity is the pair `(home_cell, serial)`; it never changes as the token
/// moves between caches and the player's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token {
    /// Serial number, unique within the home cell.
    pub serial: u32,
    /// The cell the token was generated in.
    #[serde(rename = "homeCell")]
    pub home_cell: Cell,
}

impl Token {
    /// Create a token.
    #[must_use]
    pub const fn new(home_cell: Cell, serial: u32) -> Self {
        Self { serial, home_cell }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.home_cell, self.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_round_trips() {
        let cell = Cell::new(369_894, -1_220_628);
        assert_eq!(cell.key(), "369894:-1220628");
        assert_eq!(cell.key().parse::<Cell>().expect("parse"), cell);
    }

    #[test]
    fn malformed_cell_keys_are_rejected() {
        for bad in ["", "1", "1,2", "a:2", "1:b", "1:2:3"] {
            assert!(
                matches!(bad.parse::<Cell>(), Err(GridError::InvalidCellKey(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn token_display_uses_home_cell_and_serial() {
        let token = Token::new(Cell::new(5, -3), 2);
        assert_eq!(token.to_string(), "5:-3#2");
    }

    #[test]
    fn token_serializes_with_home_cell_field() {
        let token = Token::new(Cell::new(1, 2), 7);
        let json = serde_json::to_string(&token).expect("serialize");
        assert_eq!(json, r#"{"serial":7,"homeCell":{"i":1,"j":2}}"#);
    }

    #[test]
    fn bounds_are_half_open() {
        let bounds = CellBounds {
            south_west: LatLng::new(0.0, 0.0),
            north_east: LatLng::new(1.0, 1.0),
        };
        assert!(bounds.contains(LatLng::new(0.0, 0.5)));
        assert!(!bounds.contains(LatLng::new(1.0, 0.5)));
    }
}
