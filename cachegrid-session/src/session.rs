//! The session event loop.
//!
//! One task owns the [`Controller`] and reacts to two sources: the command
//! channel and the autosave timer. `select!` polls them from the same task,
//! so handlers never overlap and commands run strictly in arrival order.
//! When every command sender is dropped the loop saves once more and hands
//! the controller back.

use std::time::Duration;

use cachegrid_core::persistence::DurableStore;
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::commands::{Command, Outcome};
use crate::controller::Controller;
use crate::surface::MapSurface;

/// Build the autosave timer. A zero period disables it.
fn autosave_timer(every: Duration) -> Option<Interval> {
    if every.is_zero() {
        return None;
    }
    // The first tick of an interval completes immediately; start one period
    // out instead so a fresh session is not saved before anything happens.
    let mut timer = time::interval_at(time::Instant::now() + every, every);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(timer)
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Drive `controller` until the command channel closes.
pub async fn run_session<S, M>(
    mut controller: Controller<S, M>,
    mut commands: mpsc::Receiver<Command>,
    autosave_every: Duration,
) -> Controller<S, M>
where
    S: DurableStore,
    M: MapSurface,
{
    let mut timer = autosave_timer(autosave_every);
    info!(
        autosave_secs = autosave_every.as_secs(),
        cell = %controller.state().player_cell(),
        "Session loop started"
    );

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("Command channel closed");
                    break;
                };
                let outcome = controller.dispatch(command);
                info!(%outcome, "{command:?}");
            }
            () = next_tick(&mut timer) => {
                controller.dispatch(Command::AutoSave);
            }
        }
    }

    let outcome = controller.dispatch(Command::Save);
    if let Outcome::Saved { bytes } = outcome {
        info!(bytes, "Final save");
    }
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachegrid_core::config::GridConfig;
    use cachegrid_core::persistence::MemoryStore;
    use cachegrid_core::types::Cell;

    use crate::commands::Direction;
    use crate::surface::RecordingSurface;

    fn controller() -> Controller<MemoryStore, RecordingSurface> {
        let mut config = GridConfig::default();
        config.player.start_lat = 0.0;
        config.player.start_lng = 0.0;
        Controller::start(config, MemoryStore::new(), RecordingSurface::new(), false)
    }

    #[tokio::test]
    async fn commands_run_in_arrival_order_and_final_save_runs() {
        let (tx, rx) = mpsc::channel(16);
        for command in [
            Command::Move(Direction::North),
            Command::Move(Direction::North),
            Command::Move(Direction::East),
            Command::Collect(Cell::new(-8, -1)),
        ] {
            tx.send(command).await.expect("send");
        }
        drop(tx);

        let controller = run_session(controller(), rx, Duration::ZERO).await;
        assert_eq!(controller.state().player_cell(), Cell::new(2, 1));
        assert_eq!(controller.state().player.trail.len(), 4);
        assert_eq!(controller.counters().snapshot().saves_completed, 1);
        assert!(!controller.gateway().store().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_fires_on_the_interval() {
        let (tx, rx) = mpsc::channel(16);
        let session = tokio::spawn(async move {
            let controller = run_session(controller(), rx, Duration::from_secs(10)).await;
            controller.counters().snapshot()
        });

        time::sleep(Duration::from_secs(35)).await;
        drop(tx);
        let counters = session.await.expect("join");

        // Ticks at 10, 20 and 30 seconds, plus the final save.
        assert_eq!(counters.saves_completed, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_disables_autosave() {
        let (tx, rx) = mpsc::channel::<Command>(1);
        let session = tokio::spawn(async move {
            run_session(controller(), rx, Duration::ZERO)
                .await
                .counters()
                .snapshot()
        });

        time::sleep(Duration::from_secs(3_600)).await;
        drop(tx);
        assert_eq!(session.await.expect("join").saves_completed, 1);
    }
}
