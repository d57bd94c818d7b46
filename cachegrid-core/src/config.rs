//! Configuration for the cache grid.
//!
//! Maps directly to `cachegrid.toml`. Every field has a default, so an empty
//! file (or no file) yields the reference world: Null Island origin, 0.0001°
//! tiles, radius-8 neighborhood, 10% spawn probability.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::oracle::SpawnRule;
use crate::types::LatLng;

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// World-generation settings.
    #[serde(default)]
    pub world: WorldConfig,
    /// Player starting state.
    #[serde(default)]
    pub player: PlayerConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl GridConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `GridError::Config` if the TOML is invalid or a value is out
    /// of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| GridError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `GridError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if !(world.tile_degrees.is_finite() && world.tile_degrees > 0.0) {
            return Err(GridError::Config(format!(
                "world.tile_degrees must be a positive number, got {}",
                world.tile_degrees
            )));
        }
        if !(0.0..=1.0).contains(&world.spawn_probability) {
            return Err(GridError::Config(format!(
                "world.spawn_probability must be within [0, 1], got {}",
                world.spawn_probability
            )));
        }
        if world.max_initial_tokens == 0 {
            return Err(GridError::Config(
                "world.max_initial_tokens must be at least 1".to_string(),
            ));
        }
        if !LatLng::new(world.origin_lat, world.origin_lng).is_finite()
            || !self.player.start_position().is_finite()
        {
            return Err(GridError::Config(
                "origin and start coordinates must be finite".to_string(),
            ));
        }
        if self.persistence.snapshot_key.is_empty() {
            return Err(GridError::Config(
                "persistence.snapshot_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// World-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Latitude of the grid origin.
    #[serde(default)]
    pub origin_lat: f64,
    /// Longitude of the grid origin.
    #[serde(default)]
    pub origin_lng: f64,
    /// Tile edge length in degrees.
    #[serde(default = "default_tile_degrees")]
    pub tile_degrees: f64,
    /// Chebyshev radius (in cells) of the materialized neighborhood.
    #[serde(default = "default_8")]
    pub neighborhood_radius: u32,
    /// Probability that a cell holds a cache.
    #[serde(default = "default_spawn_probability")]
    pub spawn_probability: f64,
    /// Maximum token count of a freshly generated cache.
    #[serde(default = "default_5")]
    pub max_initial_tokens: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            origin_lat: 0.0,
            origin_lng: 0.0,
            tile_degrees: 1e-4,
            neighborhood_radius: 8,
            spawn_probability: 0.1,
            max_initial_tokens: 5,
        }
    }
}

impl WorldConfig {
    /// The spawn rule these settings describe.
    #[must_use]
    pub const fn spawn_rule(&self) -> SpawnRule {
        SpawnRule::new(self.spawn_probability, self.max_initial_tokens)
    }
}

/// Player starting state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Starting latitude.
    #[serde(default = "default_start_lat")]
    pub start_lat: f64,
    /// Starting longitude.
    #[serde(default = "default_start_lng")]
    pub start_lng: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_lat: 36.989_493_795_784_01,
            start_lng: -122.062_771_285_485_04,
        }
    }
}

impl PlayerConfig {
    /// The configured starting position.
    #[must_use]
    pub const fn start_position(&self) -> LatLng {
        LatLng::new(self.start_lat, self.start_lng)
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "sqlite" or "memory" (nothing survives the process).
    #[serde(default = "default_sqlite")]
    pub backend: String,
    /// Path of the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Use WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Key the whole-world snapshot is stored under.
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,
    /// Auto-save interval in seconds (0 disables the timer).
    #[serde(default = "default_10")]
    pub auto_save_interval_seconds: u64,
    /// Whether a reset also forgets caches touched earlier in the session.
    #[serde(default)]
    pub purge_world_on_reset: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            db_path: "cachegrid.db".to_string(),
            wal_mode: true,
            checksum_enabled: true,
            snapshot_key: "cachegrid.snapshot".to_string(),
            auto_save_interval_seconds: 10,
            purge_world_on_reset: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_sqlite() -> String { "sqlite".to_string() }
fn default_db_path() -> String { "cachegrid.db".to_string() }
fn default_snapshot_key() -> String { "cachegrid.snapshot".to_string() }
fn default_tile_degrees() -> f64 { 1e-4 }
fn default_spawn_probability() -> f64 { 0.1 }
fn default_start_lat() -> f64 { 36.989_493_795_784_01 }
fn default_start_lng() -> f64 { -122.062_771_285_485_04 }
fn default_5() -> u32 { 5 }
fn default_8() -> u32 { 8 }
fn default_10() -> u64 { 10 }
