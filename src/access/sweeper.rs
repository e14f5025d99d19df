//! Periodic removal of idle client records.
//! Used by: access::gate.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::access::registry::ClientRegistry;

/// Removes every entry that is administratively allowed and has been idle
/// for longer than `existence`. Denied-by-override entries are kept forever
/// so the override is not lost. Returns the number removed.
pub fn sweep(registry: &ClientRegistry, now: Instant, existence: Duration) -> usize {
    registry.retain(|entry| {
        let state = entry.lock();
        !state.override_allowed || state.idle_time(now) <= existence
    })
}

/// Owned background task running [`sweep`] on a fixed period.
pub struct ExpirySweeper {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    pub fn start(
        registry: Arc<ClientRegistry>,
        interval: Duration,
        existence: Duration,
        runtime: &Handle,
    ) -> Self {
        let (stop, mut stopped) = oneshot::channel();
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = sweep(&registry, Instant::now(), existence);
                        if removed > 0 {
                            tracing::debug!(removed, remaining = registry.len(), "expired clients swept");
                        }
                    }
                    _ = &mut stopped => break,
                }
            }
        });
        Self {
            stop: Some(stop),
            task: Some(task),
        }
    }

    /// Stops the loop and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
