//! # cachegrid-session — Controller and session loop
//!
//! Connects the `cachegrid-core` engine to the outside world: input sources
//! become explicit [`Command`]s, a single [`Controller`] owns the world state
//! and applies them, and the render layer is a [`MapSurface`] collaborator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  Command   ┌──────────────────────────────┐
//! │ input lines │──────────▶ │          run_session          │
//! │ geolocation │   mpsc     │   select! { cmd | autosave }  │
//! └─────────────┘            └──────────────┬───────────────┘
//!                                           ▼
//!                            ┌──────────────────────────────┐
//!                            │          Controller           │
//!                            │ WorldState · Materializer ·   │
//!                            │ PersistenceGateway · counters │
//!                            └───────┬──────────────┬───────┘
//!                                    ▼              ▼
//!                              MapSurface     DurableStore
//! ```
//!
//! ## Modules
//!
//! - `commands` — command and outcome types, text-line parsing
//! - `controller` — the single owner of mutable session state
//! - `surface` — the render-surface contract plus recording/tracing surfaces
//! - `session` — the autosaving async event loop

pub mod commands;
pub mod controller;
pub mod session;
pub mod surface;

pub use commands::{Command, Direction, Outcome, ParseCommandError};
pub use controller::Controller;
pub use session::run_session;
pub use surface::{MapSurface, RecordingSurface, TracingSurface};
