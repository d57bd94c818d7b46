//! Grid / coordinate mapper.
//!
//! Continuous positions are quantized onto the grid by floor division
//! relative to a fixed origin:
//!
//! ```text
//!   i = floor((lat - origin.lat) / tile)
//!   j = floor((lng - origin.lng) / tile)
//! ```
//!
//! and a cell maps back to its south-west corner by the inverse affine map.
//! Flooring is lossy on purpose, so position → cell → position is not an
//! identity. cell → position → cell is: `i * tile / tile` can land a few ulps
//! below `i` in binary floating point, so quotients within [`SNAP_EPSILON`]
//! of an integer are snapped to it before flooring.

use crate::config::WorldConfig;
use crate::types::{Cell, CellBounds, LatLng};

/// Distance (in cells) under which a quotient is treated as an exact integer.
pub const SNAP_EPSILON: f64 = 1e-7;

/// Converts between continuous positions and discrete cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    origin: LatLng,
    tile_degrees: f64,
}

impl Default for GridMapper {
    fn default() -> Self {
        Self::new(LatLng::NULL_ISLAND, 1e-4)
    }
}

impl GridMapper {
    /// Create a mapper anchored at `origin` with square tiles of `tile_degrees`.
    #[must_use]
    pub const fn new(origin: LatLng, tile_degrees: f64) -> Self {
        Self {
            origin,
            tile_degrees,
        }
    }

    /// Build a mapper from the `[world]` configuration section.
    #[must_use]
    pub const fn from_config(config: &WorldConfig) -> Self {
        Self::new(
            LatLng::new(config.origin_lat, config.origin_lng),
            config.tile_degrees,
        )
    }

    /// The grid origin.
    #[must_use]
    pub const fn origin(&self) -> LatLng {
        self.origin
    }

    /// Tile edge length in degrees.
    #[must_use]
    pub const fn tile_degrees(&self) -> f64 {
        self.tile_degrees
    }

    /// The cell containing `pos`.
    #[must_use]
    pub fn to_cell(&self, pos: LatLng) -> Cell {
        Cell {
            i: quantize((pos.lat - self.origin.lat) / self.tile_degrees),
            j: quantize((pos.lng - self.origin.lng) / self.tile_degrees),
        }
    }

    /// The south-west corner of `cell`.
    #[must_use]
    pub fn to_position(&self, cell: Cell) -> LatLng {
        LatLng {
            lat: self.origin.lat + f64::from(cell.i) * self.tile_degrees,
            lng: self.origin.lng + f64::from(cell.j) * self.tile_degrees,
        }
    }

    /// The center of `cell`.
    #[must_use]
    pub fn cell_center(&self, cell: Cell) -> LatLng {
        LatLng {
            lat: self.origin.lat + (f64::from(cell.i) + 0.5) * self.tile_degrees,
            lng: self.origin.lng + (f64::from(cell.j) + 0.5) * self.tile_degrees,
        }
    }

    /// The rectangle covered by `cell`.
    #[must_use]
    pub fn cell_bounds(&self, cell: Cell) -> CellBounds {
        CellBounds {
            south_west: self.to_position(cell),
            north_east: self.to_position(cell.offset(1, 1)),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(quotient: f64) -> i32 {
    let nearest = quotient.round();
    let snapped = if (quotient - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        quotient.floor()
    };
    // Saturating float-to-int cast; NaN maps to 0.
    snapped as i32
}
