//! # cachegrid-core
//!
//! Deterministic world generation and state persistence for a location-grid
//! game: an infinite grid of cells, some of which hold a cache of uniquely
//! identified tokens that the player collects from and deposits into.
//!
//! - [`oracle`] — string key → reproducible value in `[0, 1)`; decides which
//!   cells spawn caches and how many tokens they start with
//! - [`grid`] — continuous position ↔ discrete cell
//! - [`cache`] — token stacks and their mementos
//! - [`world`] — sparse cell → cache registry, the durable source of truth
//! - [`viewport`] — which caches are materialized around the player
//! - [`player`], [`state`] — inventory, trail, and the explicit world state
//! - [`snapshot`], [`persistence`] — the durable format and the stores
//!
//! Rendering, input devices and tile fetching are collaborators outside this
//! crate.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod oracle;
pub mod persistence;
pub mod player;
pub mod snapshot;
pub mod state;
pub mod types;
pub mod viewport;
pub mod world;

pub use cache::{Cache, Memento};
pub use config::GridConfig;
pub use error::GridError;
pub use grid::GridMapper;
pub use oracle::SpawnRule;
pub use state::WorldState;
pub use types::*;
pub use world::WorldMemory;
