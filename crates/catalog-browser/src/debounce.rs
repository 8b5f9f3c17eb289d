//! Values that only update after a quiescence window.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// A value whose updates are applied only once no newer update has been
/// scheduled for `window`.
///
/// At most one timer task is pending at any time: scheduling an update aborts
/// the pending timer before spawning a new one. The timer task is spawned on the
/// current tokio runtime, so [Debounced::schedule] must be called from within one.
#[derive(Debug)]
pub struct Debounced<T> {
    window: Duration,
    value: Arc<watch::Sender<T>>,
    pending: Option<JoinHandle<()>>,
}

impl<T> Debounced<T> {
    /// Drop the pending update, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether an update is waiting for the window to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Debounced<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(initial: T, window: Duration) -> Self {
        Self {
            window,
            value: Arc::new(watch::Sender::new(initial)),
            pending: None,
        }
    }

    /// Apply `next` after the quiescence window, superseding any pending update.
    pub fn schedule(&mut self, next: T) {
        self.cancel();

        if self.window.is_zero() {
            self.value.send_replace(next);
            return;
        }

        let value = Arc::clone(&self.value);
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            trace!("debounce window elapsed, applying value");
            value.send_replace(next);
        }));
    }

    /// Apply `next` immediately, dropping any pending update.
    pub fn apply_now(&mut self, next: T) {
        self.cancel();
        self.value.send_replace(next);
    }

    /// The currently applied value.
    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.value.subscribe()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
