use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

/// Refresh period of the elapsed-seconds counter
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// Counts whole seconds since a start instant on a background interval.
/// The interval task is aborted when the ticker is dropped.
pub struct ElapsedTicker {
    seconds: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl ElapsedTicker {
    /// Must be called from within a tokio runtime
    pub fn start(started: Instant) -> Self {
        let seconds = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seconds);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(TICK_PERIOD);
            loop {
                interval.tick().await;
                counter.store(started.elapsed().as_secs(), Ordering::Relaxed);
            }
        });

        Self { seconds, handle }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::Relaxed)
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
