//! Subscriptions to the manager's external signals.
//!
//! Each external signal is followed by a small task that forwards its values
//! into the manager's event queue. The manager keeps the [`Subscription`]
//! handles and cancels them once, at teardown.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ManagerEvent;

/// Cancellation handle for one forwarding task.
#[derive(Debug)]
pub struct Subscription {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            name,
            task: Some(tokio::spawn(future)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop forwarding. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(subscription = self.name, "Subscription cancelled");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Forward changes of the target address.
///
/// The manager reads the current target itself at construction, so only
/// later values are forwarded.
pub(crate) fn forward_target(
    mut target: watch::Receiver<Option<String>>,
    tx: mpsc::UnboundedSender<ManagerEvent>,
) -> Subscription {
    target.mark_unchanged();
    Subscription::spawn("target", async move {
        while target.changed().await.is_ok() {
            let current = target.borrow_and_update().clone();
            if tx.send(ManagerEvent::TargetChanged(current)).is_err() {
                return;
            }
        }
        debug!("Target signal closed");
    })
}

/// Forward changes of the auto-reconnect policy.
///
/// The current value is read by the manager at construction, so only later
/// changes are forwarded.
pub(crate) fn forward_auto_reconnect(
    mut policy: watch::Receiver<bool>,
    tx: mpsc::UnboundedSender<ManagerEvent>,
) -> Subscription {
    policy.mark_unchanged();
    Subscription::spawn("auto_reconnect", async move {
        while policy.changed().await.is_ok() {
            let enabled = *policy.borrow_and_update();
            if tx.send(ManagerEvent::AutoReconnectChanged(enabled)).is_err() {
                return;
            }
        }
        debug!("Auto-reconnect signal closed");
    })
}

/// Forward reconnect triggers.
pub(crate) fn forward_reconnect(
    mut trigger: broadcast::Receiver<()>,
    tx: mpsc::UnboundedSender<ManagerEvent>,
) -> Subscription {
    Subscription::spawn("reconnect", async move {
        loop {
            match trigger.recv().await {
                Ok(()) => {}
                Err(RecvError::Lagged(skipped)) => {
                    // Missed triggers collapse into one; acting on each would only
                    // repeat the same check
                    warn!(skipped, "Reconnect trigger lagged");
                }
                Err(RecvError::Closed) => {
                    debug!("Reconnect trigger closed");
                    break;
                }
            }
            if tx.send(ManagerEvent::ReconnectRequested).is_err() {
                break;
            }
        }
    })
}
