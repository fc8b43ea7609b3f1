use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Delay used for address autocomplete while the user is typing.
pub const SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(300);

/// Runs only the most recent action once input has been quiet for `delay`.
///
/// Each `call` cancels the pending timer of the previous one. An action that
/// has already started is left to finish.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
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

    /// Schedules `action` after the quiet period, superseding any pending one.
    pub fn call<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.swap_pending(Some(token.clone())) {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => action().await,
            }
        });
    }

    /// Drops the pending action without scheduling a new one.
    pub fn cancel(&self) {
        if let Some(previous) = self.swap_pending(None) {
            previous.cancel();
        }
    }

    fn swap_pending(&self, next: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut guard = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, next)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SUGGESTION_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_call_fires() {
        let debouncer = Debouncer::default();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for query in ["Orc", "Orch", "Orchard"] {
            let tx = tx.clone();
            debouncer.call(move || async move {
                let _ = tx.send(query);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        drop(tx);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(rx.recv().await, Some("Orchard"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_fires_before_the_quiet_period() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let fired = Arc::new(Mutex::new(false));

        let flag = fired.clone();
        debouncer.call(move || async move {
            *flag.lock().unwrap() = true;
        });

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(!*fired.lock().unwrap());

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(*fired.lock().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_action() {
        let debouncer = Debouncer::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        debouncer.call(move || async move {
            let _ = tx.send(());
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.recv().await.is_none());
    }
}
