//! Periodic task plumbing for the two schedulers.
//!
//! Both loops are fixed-period with at most one tick in flight: the tick body
//! runs inline in the loop, and the period is re-read every iteration so a
//! config reload takes effect on the next sleep. Cancellation is a watch
//! signal; an in-flight tick finishes before the task exits.

use crate::monitor::DEFAULT_HEALTH_INTERVAL_SECS;
use crate::scheduler::SpawnOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Runs `tick` every `period()` until the shutdown signal flips to `true`.
pub async fn run_periodic<P, F>(
    name: &'static str,
    period: P,
    mut shutdown: watch::Receiver<bool>,
    tick: F,
) where
    P: Fn() -> Duration + Send,
    F: Fn() + Send,
{
    info!(task = name, "periodic task started");
    loop {
        let sleep = period();
        tokio::select! {
            _ = tokio::time::sleep(sleep) => {
                debug!(task = name, "tick");
                tick();
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!(task = name, "periodic task stopped");
}

/// Handle to the running refresh and health tasks.
///
/// Dropping the handle without calling [`Self::stop`] aborts nothing; the
/// tasks keep running until their shutdown signal fires or the runtime is
/// torn down.
pub struct SpawnRuntime {
    orchestrator: Arc<SpawnOrchestrator>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SpawnRuntime {
    /// Spawns the refresh and health loops onto the current tokio runtime.
    #[must_use]
    pub fn start(orchestrator: Arc<SpawnOrchestrator>) -> Self {
        let (shutdown, _) = watch::channel(false);

        let refresh = {
            let orchestrator = Arc::clone(&orchestrator);
            let rx = shutdown.subscribe();
            tokio::spawn(async move {
                let period = {
                    let orchestrator = Arc::clone(&orchestrator);
                    move || orchestrator.check_interval()
                };
                let tick = {
                    let orchestrator = Arc::clone(&orchestrator);
                    move || orchestrator.refresh_tick()
                };
                run_periodic("boss-refresh", period, rx, tick).await;
            })
        };

        let health = {
            let orchestrator = Arc::clone(&orchestrator);
            let rx = shutdown.subscribe();
            tokio::spawn(async move {
                let tick = {
                    let orchestrator = Arc::clone(&orchestrator);
                    move || orchestrator.health_tick()
                };
                run_periodic(
                    "boss-health",
                    || Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
                    rx,
                    tick,
                )
                .await;
            })
        };

        Self {
            orchestrator,
            shutdown,
            tasks: vec![refresh, health],
        }
    }

    /// The orchestrator driven by this runtime.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<SpawnOrchestrator> {
        &self.orchestrator
    }

    /// Signals both tasks to stop, waits for them, then shuts the
    /// orchestrator down (despawning every tracked boss).
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
        self.orchestrator.shutdown();
    }
}
