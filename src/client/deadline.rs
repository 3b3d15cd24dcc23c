//! Deadline-bounded blocking tasks.
//!
//! The task runs on a worker thread while the caller waits on a channel
//! with a timeout. Whichever finishes first wins: if the deadline passes,
//! the caller stops waiting and the worker's eventual result is dropped.
//! Only the wait is cancelled; the worker is never interrupted.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("deadline of {0:?} exceeded")]
    Exceeded(Duration),
    #[error("worker thread exited without a result")]
    WorkerLost,
}

/// Run `task` on a worker thread, waiting at most `deadline` for it.
pub fn run_with_deadline<T, F>(deadline: Duration, task: F) -> Result<T, DeadlineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);

    thread::Builder::new()
        .name("topiclens-fetch".to_string())
        .spawn(move || {
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(task());
        })
        .map_err(|_| DeadlineError::WorkerLost)?;

    match rx.recv_timeout(deadline) {
        Ok(value) => Ok(value),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(DeadlineError::Exceeded(deadline)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(DeadlineError::WorkerLost),
    }
}
