use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delays work until input has been quiet for `delay`.
///
/// Every `call` invalidates the timer armed by the previous one, so a burst of
/// calls ends in a single run of the last future. Work whose timer already
/// fired keeps running.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms a new timer for `work`. Must be called inside a tokio runtime.
    pub fn call<F>(&self, work: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != armed {
                return false;
            }
            work.await;
            true
        })
    }

    /// Invalidates the pending timer, if any.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn only_last_call_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for keystroke in ["n", "na", "nar"] {
            let fired = Arc::clone(&fired);
            handles.push(debouncer.call(async move {
                fired.lock().unwrap().push(keystroke);
            }));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }
        assert_eq!(outcomes, vec![false, false, true]);
        assert_eq!(*fired.lock().unwrap(), vec!["nar"]);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let first = debouncer.call(async {});
        tokio::time::sleep(Duration::from_millis(600)).await;
        let second = debouncer.call(async {});
        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_timer() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let handle = debouncer.call(async {});
        debouncer.cancel();
        assert!(!handle.await.unwrap());
    }
}
