use log::debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use publisher::Observable;

/// Timer counting whole ticks down to zero before running an expiry action.
///
/// The remaining count is published after every tick. At most one countdown is
/// pending: starting a new one cancels the previous. Once the expiry action has
/// begun it always runs to completion.
pub struct Countdown {
    remaining: Arc<Observable<u32>>,
    start_value: u32,
    tick: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Countdown {
    pub fn new(start_value: u32, tick: Duration) -> Self {
        Self {
            remaining: Arc::new(Observable::new(start_value)),
            start_value,
            tick,
            pending: Mutex::new(None),
        }
    }

    /// Counts `start_value, ..., 0`, one tick each, then runs `on_expire`.
    pub async fn start<F, Fut>(&self, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let remaining = self.remaining.clone();
        let start_value = self.start_value;
        let tick = self.tick;
        tokio::spawn(async move {
            for value in (0..=start_value).rev() {
                remaining.set(value);
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Countdown cancelled at {}", value);
                        return;
                    }
                    _ = tokio::time::sleep(tick) => {}
                }
            }
            debug!("Countdown expired");
            on_expire().await;
        });
    }

    /// Cancels the pending countdown, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.pending.lock().await.take() {
            token.cancel();
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.subscribe()
    }

    pub fn start_value(&self) -> u32 {
        self.start_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (
        Arc<AtomicUsize>,
        impl FnOnce() -> std::future::Ready<()> + Send + 'static,
    ) {
        let fired = Arc::new(AtomicUsize::new(0));
        let action = {
            let fired = fired.clone();
            move || {
                fired.fetch_add(1, Ordering::SeqCst);
                std::future::ready(())
            }
        };
        (fired, action)
    }

    #[tokio::test]
    async fn test_counts_down_then_expires() {
        let countdown = Countdown::new(3, Duration::from_millis(5));
        let mut receiver = countdown.subscribe();
        let (fired, action) = counter();

        countdown.start(action).await;

        let mut seen = Vec::new();
        while seen.last() != Some(&0) {
            receiver.changed().await.unwrap();
            seen.push(*receiver.borrow_and_update());
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(seen.windows(2).all(|pair| pair[0] > pair[1]));
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_expiry() {
        let countdown = Countdown::new(2, Duration::from_millis(20));
        let (fired, action) = counter();

        countdown.start(action).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        countdown.cancel().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(countdown.remaining(), 2);
    }

    #[tokio::test]
    async fn test_restart_replaces_pending_countdown() {
        let countdown = Countdown::new(1, Duration::from_millis(20));
        let (first, first_action) = counter();
        let (second, second_action) = counter();

        countdown.start(first_action).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        countdown.start(second_action).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
