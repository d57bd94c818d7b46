//! Render-surface contract.
//!
//! The controller never touches a map widget directly; it drives a
//! [`MapSurface`]. A cache region is bound to its cell, and the surface is
//! told again whenever the cache behind that cell changes, so popups always
//! show live contents.

use cachegrid_core::cache::Cache;
use cachegrid_core::player::Inventory;
use cachegrid_core::types::{Cell, CellBounds, LatLng};
use tracing::{debug, info};

/// What the controller needs from a map view.
pub trait MapSurface {
    /// Show a clickable region for the cache at `cell`.
    fn add_cache_region(&mut self, cell: Cell, bounds: CellBounds, cache: &Cache);

    /// The cache behind an existing region changed.
    fn update_cache_region(&mut self, cell: Cell, cache: &Cache);

    /// Remove every cache region.
    fn clear_cache_regions(&mut self);

    /// Move the player marker.
    fn set_player_marker(&mut self, position: LatLng);

    /// Replace the movement polyline.
    fn set_trail(&mut self, trail: &[LatLng]);

    /// Pan the view.
    fn center_on(&mut self, position: LatLng);

    /// Refresh the status panel.
    fn show_inventory(&mut self, inventory: &Inventory);
}

/// A region as last reported to a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    /// Cache cell.
    pub cell: Cell,
    /// Rectangle on the map.
    pub bounds: CellBounds,
    /// Popup text, e.g. `"Cache at 3,4 with 2 tokens."`.
    pub label: String,
    /// Token lines, top last.
    pub tokens: Vec<String>,
}

impl RegionRecord {
    fn refresh(&mut self, cache: &Cache) {
        self.label = cache.describe();
        self.tokens = cache.tokens().iter().map(ToString::to_string).collect();
    }
}

/// Keeps the latest view state in memory. Used by tests and by anything that
/// wants to inspect what would be on screen.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Regions currently shown, in the order they were added.
    pub regions: Vec<RegionRecord>,
    /// Player marker position.
    pub player_marker: Option<LatLng>,
    /// Movement polyline.
    pub trail: Vec<LatLng>,
    /// Last position the view was centered on.
    pub centered_on: Option<LatLng>,
    /// Status panel text.
    pub status: String,
    /// Number of `clear_cache_regions` calls.
    pub clears: usize,
}

impl RecordingSurface {
    /// An empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The region shown for `cell`, if any.
    #[must_use]
    pub fn region(&self, cell: Cell) -> Option<&RegionRecord> {
        self.regions.iter().find(|r| r.cell == cell)
    }
}

impl MapSurface for RecordingSurface {
    fn add_cache_region(&mut self, cell: Cell, bounds: CellBounds, cache: &Cache) {
        let mut record = RegionRecord {
            cell,
            bounds,
            label: String::new(),
            tokens: Vec::new(),
        };
        record.refresh(cache);
        self.regions.push(record);
    }

    fn update_cache_region(&mut self, cell: Cell, cache: &Cache) {
        if let Some(record) = self.regions.iter_mut().find(|r| r.cell == cell) {
            record.refresh(cache);
        }
    }

    fn clear_cache_regions(&mut self) {
        self.regions.clear();
        self.clears += 1;
    }

    fn set_player_marker(&mut self, position: LatLng) {
        self.player_marker = Some(position);
    }

    fn set_trail(&mut self, trail: &[LatLng]) {
        self.trail = trail.to_vec();
    }

    fn center_on(&mut self, position: LatLng) {
        self.centered_on = Some(position);
    }

    fn show_inventory(&mut self, inventory: &Inventory) {
        self.status = format!("Tokens: {}", inventory.summary());
    }
}

/// Writes view changes to the log. The headless binary's surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSurface;

impl MapSurface for TracingSurface {
    fn add_cache_region(&mut self, cell: Cell, _bounds: CellBounds, cache: &Cache) {
        debug!(cell = %cell, tokens = cache.len(), "Cache region added");
    }

    fn update_cache_region(&mut self, cell: Cell, cache: &Cache) {
        info!(cell = %cell, "{}", cache.describe());
    }

    fn clear_cache_regions(&mut self) {
        debug!("Cache regions cleared");
    }

    fn set_player_marker(&mut self, position: LatLng) {
        info!(position = %position, "Player marker moved");
    }

    fn set_trail(&mut self, trail: &[LatLng]) {
        debug!(points = trail.len(), "Trail updated");
    }

    fn center_on(&mut self, _position: LatLng) {}

    fn show_inventory(&mut self, inventory: &Inventory) {
        info!(held = inventory.len(), "Tokens: {}", inventory.summary());
    }
}
