//! Fixed-interval repeating background task with a single stop handle.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Runs a job on a fixed period until stopped or dropped. The job runs
/// once immediately, then on every period boundary.
pub struct RepeatingTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => job().await,
                    _ = stopped.changed() => break,
                }
            }
        });
        Self { stop, handle }
    }

    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
        self.handle.abort();
    }
}
