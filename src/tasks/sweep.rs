//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{CacheShared, ItemStore};
use crate::config::LogLevel;
use crate::error::{CacheError, Result};

// == Sweep Handle ==
/// Owns the background sweep of one cache.
///
/// Dropping the handle signals the task to stop; [`SweepHandle::shutdown`]
/// also waits for it to finish.
#[derive(Debug)]
pub struct SweepHandle {
    /// Sender to signal shutdown to the sweep task
    shutdown_tx: watch::Sender<bool>,
    /// Taken by the first `shutdown` call
    handle: Mutex<Option<JoinHandle<()>>>,
    /// Verbosity of the owning cache
    log_level: LogLevel,
}

impl SweepHandle {
    /// Asks the task to stop without waiting for it.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the task and waits for it. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.signal_shutdown();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    cache_log!(
                        self.log_level,
                        Warn,
                        "Expiry sweep task ended abnormally: {}",
                        err
                    );
                }
            }
        }
    }

    /// Returns true once the task has exited (or was already joined).
    pub fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

/// Spawns a task that sweeps expired entries every `interval`.
///
/// The first sweep runs one full interval after spawning. Each pass takes the
/// cache's exclusive lock for the duration of that pass only.
///
/// # Errors
/// - `InvalidArgument` if `interval` is zero
/// - `NoRuntime` if called outside a Tokio runtime
pub(crate) fn spawn_sweep_task<S>(
    shared: Arc<CacheShared<S>>,
    interval: Duration,
) -> Result<SweepHandle>
where
    S: ItemStore + 'static,
{
    if interval.is_zero() {
        return Err(CacheError::InvalidArgument(
            "sweep interval must be positive".to_string(),
        ));
    }

    let runtime = tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let log_level = shared.log_level();

    let handle = runtime.spawn(async move {
        cache_log!(
            shared.log_level(),
            Info,
            "Starting expiry sweep task with interval of {:?}",
            interval
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    shared.sweep_expired();
                }
                changed = shutdown_rx.changed() => {
                    // A dropped sender also means the cache is gone
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        cache_log!(log_level, Debug, "Expiry sweep task stopped");
    });

    Ok(SweepHandle {
        shutdown_tx,
        handle: Mutex::new(Some(handle)),
        log_level,
    })
}
