//! Time-driven trigger for refresh cycles.
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs a tick immediately and then again after every `interval`, measured
/// from the end of the previous tick.
///
/// Cancelling never aborts a tick in flight; it only prevents the next one.
/// Dropping the scheduler cancels it.
#[derive(Debug)]
pub struct PollingScheduler {
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollingScheduler {
    /// Spawns the timer task on the current tokio runtime.
    pub fn start<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let cancel = cancel_token.clone();
        let task = tokio::spawn(async move {
            while !cancel.is_cancelled() {
                tick().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            log::debug!("Polling stopped");
        });
        Self {
            cancel_token,
            task: Some(task),
        }
    }

    /// Cancels the outstanding timer.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Cancels and waits until a tick in flight has completed.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                log::warn!("Polling task ended abnormally: {error}");
            }
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
