//! Cooldown-gated pass starter.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{SyncEngine, SyncError, SyncReport};

/// Shortest accepted interval; `tokio::time::interval` rejects zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Starts a background pass at most once per interval.
///
/// The cooldown timestamp is taken when the decision to start is made, not
/// when the pass finishes, so a burst of triggers yields a single pass.
pub struct SyncTrigger {
    engine: Arc<SyncEngine>,
    interval: Duration,
    last: Mutex<Option<Instant>>,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the spawned pass ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncTrigger {
    /// A zero interval is raised to [`MIN_INTERVAL`].
    pub fn new(engine: Arc<SyncEngine>, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!(
                interval_ms = interval.as_millis() as u64,
                "sync interval too short, using {}ms",
                MIN_INTERVAL.as_millis()
            );
        }
        Self {
            engine,
            interval: interval.max(MIN_INTERVAL),
            last: Mutex::new(None),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while a pass started by this trigger is running.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a pass if the cooldown elapsed and none is running.
    /// Returns the handle of the spawned pass, or `None` if nothing started.
    pub fn poke(&self) -> Option<JoinHandle<Result<SyncReport, SyncError>>> {
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(at) = *last {
                let elapsed = at.elapsed();
                if elapsed <= self.interval {
                    debug!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        interval_ms = self.interval.as_millis() as u64,
                        "sync cooldown active"
                    );
                    return None;
                }
            }
            if self.in_flight.swap(true, Ordering::AcqRel) {
                debug!("sync pass already running");
                return None;
            }
            // Pass started outside this trigger; undo only our own flag.
            if self.engine.is_running() {
                self.in_flight.store(false, Ordering::Release);
                debug!("sync pass already running");
                return None;
            }
            *last = Some(Instant::now());
        }

        let guard = InFlight(Arc::clone(&self.in_flight));
        let engine = Arc::clone(&self.engine);
        Some(tokio::spawn(async move {
            let _guard = guard;
            engine.try_run().await
        }))
    }

    /// Poke once per interval until `shutdown` resolves. The first tick fires
    /// immediately. Passes still running at shutdown are awaited.
    pub async fn run_periodic<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut current: Option<JoinHandle<Result<SyncReport, SyncError>>> = None;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutting down periodic sync");
                    break;
                }
                _ = ticker.tick() => {
                    // The ticker and cooldown share one interval; force the
                    // cooldown to have elapsed by clearing the timestamp.
                    self.reset_cooldown();
                    if let Some(handle) = self.poke() {
                        current = Some(handle);
                    }
                }
            }
        }

        if let Some(handle) = current {
            if !handle.is_finished() {
                info!("waiting for running sync pass to finish");
            }
            let _ = handle.await;
        }
    }

    fn reset_cooldown(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
