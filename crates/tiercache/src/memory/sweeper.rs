//! Background sweeper that evicts expired entries from one store.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use super::store::Inner;

/// Periodic task owned by exactly one `ExpiringStore`.
///
/// The task holds only a weak reference to the store, so it never keeps the
/// map alive on its own. It exits when a stop is signalled, when the owning
/// handle is dropped, or when the store itself is gone.
pub(crate) struct Sweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Start sweeping `store` every `every`.
    ///
    /// Returns `None` when no tokio runtime is running on this thread; the
    /// store is still correct in that case, only unbounded in memory.
    pub(crate) fn spawn<V>(store: Weak<Inner<V>>, every: Duration) -> Option<Self>
    where
        V: Send + Sync + 'static,
    {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    interval_ms = every.as_millis() as u64,
                    "No tokio runtime available, expired-entry sweeping disabled"
                );
                return None;
            }
        };

        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = runtime.spawn(async move {
            debug!(interval_ms = every.as_millis() as u64, "Sweeper started");

            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so the first sweep
            // happens one full interval after start.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(inner) = store.upgrade() else {
                            break;
                        };
                        let removed = inner.delete_expired();
                        if removed > 0 {
                            debug!(removed, "Swept expired entries");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("Sweeper stopped");
        });

        Some(Self { shutdown, handle })
    }

    /// Signal the loop to stop. Safe to call more than once.
    pub(crate) fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
