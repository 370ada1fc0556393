//! Affinity worker: run a clipboard job on a dedicated thread with a
//! bounded wait.
//!
//! The legacy clipboard must be opened, read and closed from one thread,
//! and the calls can block indefinitely when another process holds the
//! clipboard. Each job gets its own named OS thread; the caller races
//! the job's completion against a deadline and a cancellation token.
//!
//! A job that misses its deadline is abandoned, not stopped: the thread
//! keeps running until the native call returns and its result is dropped.

use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Name given to every worker thread (visible in debuggers and panics).
pub const WORKER_THREAD_NAME: &str = "cbhist-clipboard";

/// Failures of the worker transport itself, not of the job.
#[derive(Debug, thiserror::Error)]
pub enum AffinityError {
    #[error("failed to spawn clipboard worker: {0}")]
    Spawn(std::io::Error),

    #[error("clipboard worker did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    /// The worker dropped its result channel without sending (panicked).
    #[error("clipboard worker exited without a result")]
    WorkerLost,
}

/// Run `job` on a fresh worker thread and wait up to `deadline` for it.
///
/// Cancellation is checked before the thread is spawned and raced
/// against the job afterwards.
pub async fn run_with_deadline<T, F>(
    deadline: Duration,
    cancel: &CancellationToken,
    job: F,
) -> Result<T, AffinityError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(AffinityError::Cancelled);
    }

    let (tx, rx) = oneshot::channel();
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.into())
        .spawn(move || {
            // Receiver gone means the caller timed out or was cancelled.
            let _ = tx.send(job());
        })
        .map_err(AffinityError::Spawn)?;

    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            tracing::debug!("clipboard worker abandoned: cancelled");
            Err(AffinityError::Cancelled)
        }

        result = tokio::time::timeout(deadline, rx) => match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(AffinityError::WorkerLost),
            Err(_) => {
                tracing::warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "clipboard worker timed out, abandoning"
                );
                Err(AffinityError::Timeout(deadline))
            }
        },
    }
}
