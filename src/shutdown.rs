//! Cooperative cancellation shared by the session, workers, supplier, and aggregator.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

/// Broadcast channel size for shutdown notifications (single signal fan-out).
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// The session's cancellation switch.
///
/// Workers poll [`StopSwitch::is_stopped`] at the top of every iteration;
/// long-lived tasks wait on a [`StopListener`]. The switch flips at most once.
#[derive(Debug, Clone)]
pub struct StopSwitch {
    stopped: Arc<AtomicBool>,
    notify: ShutdownSender,
}

impl StopSwitch {
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = shutdown_channel();
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            notify,
        }
    }

    /// Flips the switch and wakes every listener.
    ///
    /// Returns `true` only for the call that actually flipped it.
    pub fn trigger(&self) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        drop(self.notify.send(()));
        true
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn listener(&self) -> StopListener {
        StopListener {
            rx: self.notify.subscribe(),
            stopped: Arc::clone(&self.stopped),
        }
    }
}

impl Default for StopSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Awaitable view of a [`StopSwitch`].
#[derive(Debug)]
pub struct StopListener {
    rx: ShutdownReceiver,
    stopped: Arc<AtomicBool>,
}

impl StopListener {
    /// Resolves once the switch has been flipped, including before this call.
    pub async fn wait(&mut self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        match self.rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use std::future::Future;
    use std::time::Duration;

    const LISTENER_TIMEOUT: Duration = Duration::from_secs(1);

    fn run_async_test<F>(future: F) -> AppResult<()>
    where
        F: Future<Output = AppResult<()>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
        runtime.block_on(future)
    }

    #[test]
    fn trigger_is_idempotent() -> AppResult<()> {
        let stop = StopSwitch::new();
        if stop.is_stopped() {
            return Err(AppError::validation("Switch started flipped"));
        }
        if !stop.trigger() {
            return Err(AppError::validation("First trigger should flip the switch"));
        }
        if stop.trigger() {
            return Err(AppError::validation("Second trigger should be a no-op"));
        }
        if !stop.clone().is_stopped() {
            return Err(AppError::validation("Clones should observe the flip"));
        }
        Ok(())
    }

    #[test]
    fn listener_wakes_on_trigger() -> AppResult<()> {
        run_async_test(async {
            let stop = StopSwitch::new();
            let mut listener = stop.listener();
            let trigger = stop.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                trigger.trigger();
            });
            tokio::time::timeout(LISTENER_TIMEOUT, listener.wait())
                .await
                .map_err(|err| {
                    AppError::validation(format!("Listener did not wake: {}", err))
                })?;
            Ok(())
        })
    }

    #[test]
    fn listener_created_after_trigger_resolves() -> AppResult<()> {
        run_async_test(async {
            let stop = StopSwitch::new();
            stop.trigger();
            let mut listener = stop.listener();
            tokio::time::timeout(LISTENER_TIMEOUT, listener.wait())
                .await
                .map_err(|err| {
                    AppError::validation(format!("Late listener did not resolve: {}", err))
                })?;
            Ok(())
        })
    }
}
