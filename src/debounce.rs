use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Trailing-edge debounce: only the last action scheduled within `delay`
/// runs.
///
/// Each [`Debouncer::schedule`] cancels the pending action, if any, and
/// starts a new quiet period. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `action` after the quiet period unless superseded first
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });

        if let Some(previous) = self.pending().replace(handle) {
            if !previous.is_finished() {
                debug!("Superseding pending debounced action");
            }
            previous.abort();
        }
    }

    /// Drop the pending action, returning whether one was waiting
    pub fn cancel(&self) -> bool {
        match self.pending().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    /// An action is scheduled and has not completed
    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex as AsyncMutex;

    #[tokio::test(start_paused = true)]
    async fn test_last_keystroke_wins() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AsyncMutex::new(Vec::new()));

        for query in ["c", "ca", "cat"] {
            let fired = fired.clone();
            debouncer.schedule(async move {
                fired.lock().await.push(query);
            });
            tokio::time::advance(Duration::from_millis(200)).await;
        }
        assert!(debouncer.is_pending());
        assert!(fired.lock().await.is_empty());

        // Paused clock: sleeping lets the runtime jump to the pending timer
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*fired.lock().await, vec!["cat"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AsyncMutex::new(false));

        let flag = fired.clone();
        debouncer.schedule(async move {
            *flag.lock().await = true;
        });

        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!*fired.lock().await);
        assert!(!debouncer.is_pending());
    }
}
