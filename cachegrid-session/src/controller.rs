//! The single owner of session state.
//!
//! All mutation funnels through [`Controller::dispatch`]; each command runs
//! to completion before the next is accepted, so no collect, deposit or
//! save can interleave with another. Nothing here is fatal: storage
//! failures are logged and counted, and the session keeps running.

use std::sync::Arc;

use cachegrid_core::config::GridConfig;
use cachegrid_core::error::GridError;
use cachegrid_core::grid::GridMapper;
use cachegrid_core::metrics::GridCounters;
use cachegrid_core::oracle::SpawnRule;
use cachegrid_core::persistence::{DurableStore, PersistenceGateway, StoreRecovery};
use cachegrid_core::player::PlayerState;
use cachegrid_core::state::WorldState;
use cachegrid_core::types::{Cell, LatLng};
use cachegrid_core::viewport::Materializer;
use tracing::{debug, info, warn};

use crate::commands::{Command, Outcome};
use crate::surface::MapSurface;

/// Owns the world state, the viewport, the durable gateway and the surface.
pub struct Controller<S, M> {
    config: GridConfig,
    grid: GridMapper,
    rule: SpawnRule,
    state: WorldState,
    materializer: Materializer,
    gateway: PersistenceGateway<S>,
    surface: M,
    counters: Arc<GridCounters>,
    geolocation_available: bool,
    geolocation_enabled: bool,
}

impl<S: DurableStore, M: MapSurface> Controller<S, M> {
    /// Start a session: restore the stored snapshot if there is a usable
    /// one, otherwise begin a clean world at the configured start, then
    /// materialize the neighborhood.
    ///
    /// `geolocation_available` says whether the host can deliver position
    /// updates at all.
    pub fn start(config: GridConfig, store: S, surface: M, geolocation_available: bool) -> Self {
        let grid = GridMapper::from_config(&config.world);
        let rule = config.world.spawn_rule();
        let gateway = PersistenceGateway::new(store, config.persistence.snapshot_key.clone());
        let counters = Arc::new(GridCounters::new());

        let state = match gateway.try_load(rule) {
            Ok(Some(state)) => {
                GridCounters::incr(&counters.loads_completed);
                info!(cell = %state.player_cell(), caches = state.world.len(), "Resumed session");
                state
            }
            Ok(None) => {
                info!("No saved session, starting fresh");
                WorldState::fresh(&grid, rule, config.player.start_position())
            }
            Err(GridError::MalformedSnapshot(reason)) => {
                GridCounters::incr(&counters.malformed_snapshots);
                warn!(reason = %reason, "Saved session is malformed, starting fresh");
                WorldState::fresh(&grid, rule, config.player.start_position())
            }
            Err(e) => {
                warn!(error = %e, "Could not read saved session, starting fresh");
                WorldState::fresh(&grid, rule, config.player.start_position())
            }
        };

        let mut controller = Self {
            materializer: Materializer::new(config.world.neighborhood_radius, rule),
            config,
            grid,
            rule,
            state,
            gateway,
            surface,
            counters,
            geolocation_available,
            geolocation_enabled: false,
        };
        controller.refresh();
        controller
    }

    /// Apply one command.
    pub fn dispatch(&mut self, command: Command) -> Outcome {
        debug!(?command, "Dispatch");
        match command {
            Command::Move(direction) => {
                let (di, dj) = direction.delta();
                self.move_by(di, dj)
            }
            Command::MoveBy { di, dj } => self.move_by(di, dj),
            Command::Geolocation(position) => self.geolocate(position),
            Command::EnableGeolocation => self.enable_geolocation(),
            Command::Collect(cell) => self.collect(cell),
            Command::Deposit(cell) => self.deposit(cell),
            Command::Save => self.save(),
            Command::AutoSave => {
                debug!("Autosave tick");
                self.save()
            }
            Command::Load => self.load(),
            Command::Reset => self.reset(),
        }
    }

    // -- movement ----------------------------------------------------------

    fn move_by(&mut self, di: i32, dj: i32) -> Outcome {
        let cell = self.state.player_cell().offset(di, dj);
        self.state.player.relocate(cell, self.grid.cell_center(cell));
        self.moved()
    }

    fn geolocate(&mut self, position: LatLng) -> Outcome {
        if !self.geolocation_enabled {
            debug!(position = %position, "Geolocation update before enable, ignored");
            return Outcome::Ignored;
        }
        if !position.is_finite() {
            warn!(position = %position, "Non-finite geolocation update, ignored");
            return Outcome::Ignored;
        }
        self.state.player.relocate(self.grid.to_cell(position), position);
        self.moved()
    }

    fn moved(&mut self) -> Outcome {
        self.refresh();
        Outcome::Moved {
            cell: self.state.player_cell(),
            materialized: self.materializer.materialized().len(),
        }
    }

    fn enable_geolocation(&mut self) -> Outcome {
        if !self.geolocation_available {
            info!("Geolocation is not available on this host");
            return Outcome::GeolocationUnavailable;
        }
        self.geolocation_enabled = true;
        info!("Geolocation enabled");
        Outcome::GeolocationEnabled
    }

    // -- token transfer ----------------------------------------------------

    fn collect(&mut self, cell: Cell) -> Outcome {
        if !self.materializer.is_materialized(cell) {
            return Outcome::NotMaterialized(cell);
        }
        let token = if self.state.collect(cell) {
            GridCounters::incr(&self.counters.collects);
            self.state.player.inventory.tokens().last().copied()
        } else {
            None
        };
        debug!(cell = %cell, collected = token.is_some(), "Collect");
        self.token_moved(cell);
        Outcome::Collected { cell, token }
    }

    fn deposit(&mut self, cell: Cell) -> Outcome {
        if !self.materializer.is_materialized(cell) {
            return Outcome::NotMaterialized(cell);
        }
        let token = if self.state.deposit(cell) {
            GridCounters::incr(&self.counters.deposits);
            self.state
                .world
                .get(cell)
                .and_then(|cache| cache.tokens().last().copied())
        } else {
            None
        };
        debug!(cell = %cell, deposited = token.is_some(), "Deposit");
        self.token_moved(cell);
        Outcome::Deposited { cell, token }
    }

    fn token_moved(&mut self, cell: Cell) {
        if let Some(cache) = self.state.world.get(cell) {
            self.surface.update_cache_region(cell, cache);
        }
        self.surface.show_inventory(&self.state.player.inventory);
    }

    // -- persistence -------------------------------------------------------

    fn save(&mut self) -> Outcome {
        match self.gateway.save(&self.state) {
            Ok(bytes) => {
                GridCounters::incr(&self.counters.saves_completed);
                Outcome::Saved { bytes }
            }
            Err(e) => {
                GridCounters::incr(&self.counters.save_failures);
                warn!(error = %e, "Save failed");
                Outcome::SaveFailed
            }
        }
    }

    fn load(&mut self) -> Outcome {
        match self.gateway.try_load(self.rule) {
            Ok(Some(state)) => {
                GridCounters::incr(&self.counters.loads_completed);
                self.state = state;
                self.refresh();
                info!(cell = %self.state.player_cell(), "Session loaded");
                Outcome::Loaded { found: true }
            }
            Ok(None) => Outcome::Loaded { found: false },
            Err(GridError::MalformedSnapshot(reason)) => {
                GridCounters::incr(&self.counters.malformed_snapshots);
                warn!(reason = %reason, "Ignoring malformed snapshot");
                Outcome::Loaded { found: false }
            }
            Err(e) => {
                warn!(error = %e, "Load failed");
                Outcome::LoadFailed
            }
        }
    }

    fn reset(&mut self) -> Outcome {
        if let Err(e) = self.gateway.reset() {
            warn!(error = %e, "Could not clear durable snapshot");
        }
        let start = self.config.player.start_position();
        self.state.player = PlayerState::start(self.grid.to_cell(start), start);
        if self.config.persistence.purge_world_on_reset {
            self.state.world.clear();
        }
        GridCounters::incr(&self.counters.resets);
        info!(
            cell = %self.state.player_cell(),
            purged = self.config.persistence.purge_world_on_reset,
            "Session reset"
        );
        self.refresh();
        Outcome::Reset
    }

    // -- view --------------------------------------------------------------

    /// Run a materializer pass around the player and redraw everything.
    pub fn refresh(&mut self) {
        let known_before = self.state.world.len();
        let center = self.state.player_cell();

        self.surface.clear_cache_regions();
        let materialized = self
            .materializer
            .regenerate(center, &mut self.state.world, &self.grid);
        for m in materialized {
            if let Some(cache) = self.state.world.get(m.cell) {
                self.surface.add_cache_region(m.cell, m.bounds, cache);
            }
        }

        GridCounters::incr(&self.counters.regenerations);
        GridCounters::add(
            &self.counters.caches_created,
            (self.state.world.len() - known_before) as u64,
        );

        if let Some(position) = self.state.player.position() {
            self.surface.set_player_marker(position);
            self.surface.center_on(position);
        }
        self.surface.set_trail(&self.state.player.trail);
        self.surface.show_inventory(&self.state.player.inventory);
    }

    /// Record how the durable store was obtained. Anything other than a
    /// clean open is logged and counted; the session runs either way.
    pub fn note_store_recovery(&self, recovery: &StoreRecovery) {
        match recovery {
            StoreRecovery::Clean => {}
            StoreRecovery::Quarantined(aside) => {
                GridCounters::incr(&self.counters.store_recoveries);
                warn!(quarantined = %aside.display(), "Session started on a fresh database");
            }
            StoreRecovery::InMemory => {
                GridCounters::incr(&self.counters.store_recoveries);
                warn!("Session started without durable storage");
            }
        }
    }

    // -- accessors ---------------------------------------------------------

    /// Current world state.
    #[must_use]
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    /// The viewport.
    #[must_use]
    pub const fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    /// The render surface.
    #[must_use]
    pub const fn surface(&self) -> &M {
        &self.surface
    }

    /// The durable gateway.
    #[must_use]
    pub const fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    /// Session counters, shareable with an exporter.
    #[must_use]
    pub fn counters(&self) -> Arc<GridCounters> {
        Arc::clone(&self.counters)
    }

    /// Whether geolocation updates currently move the player.
    #[must_use]
    pub const fn geolocation_enabled(&self) -> bool {
        self.geolocation_enabled
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }
}
