//! Bounded fan-out / fan-in worker pool
//!
//! Runs independent per-item jobs with a concurrency cap and a join barrier:
//! workers pull item indices from a shared cursor and report results over a
//! channel, and the collector writes each result into its input-order slot.
//! Completion order therefore never affects output order, and a deadline
//! leaves the slots filled so far intact as a partial result.

use horizon_types::CancelToken;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Outcome of a pool run
#[derive(Debug)]
pub struct PoolRun<R> {
    /// Per-input results in input order; `None` marks an item whose job
    /// never finished (deadline or cancellation)
    pub slots: Vec<Option<R>>,
    /// True when the deadline expired before all slots resolved
    pub deadline_exceeded: bool,
    /// True when cancellation was observed
    pub cancelled: bool,
}

impl<R> PoolRun<R> {
    /// Number of slots that never resolved
    #[must_use]
    pub fn unresolved(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }
}

/// Run `job` over every input with at most `width` jobs in flight
///
/// All jobs receive independent input clones and write to their own result
/// slot; no state is shared between concurrent jobs. When `deadline`
/// expires or the token is cancelled, outstanding jobs are aborted and the
/// partial slot vector is returned.
pub async fn run_bounded<T, R, F, Fut>(
    inputs: Vec<T>,
    width: usize,
    deadline: Option<Instant>,
    cancel: &CancelToken,
    job: F,
) -> PoolRun<R>
where
    T: Clone + Send + Sync + 'static,
    R: Send + 'static,
    F: Fn(usize, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let total = inputs.len();
    let mut slots: Vec<Option<R>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    if total == 0 {
        return PoolRun {
            slots,
            deadline_exceeded: false,
            cancelled: cancel.is_cancelled(),
        };
    }

    let inputs = Arc::new(inputs);
    let cursor = Arc::new(AtomicUsize::new(0));
    let job = Arc::new(job);
    let (tx, mut rx) = mpsc::channel::<(usize, R)>(total);

    let worker_count = width.max(1).min(total);
    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let inputs = Arc::clone(&inputs);
        let cursor = Arc::clone(&cursor);
        let job = Arc::clone(&job);
        let tx = tx.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                let idx = cursor.fetch_add(1, Ordering::Relaxed);
                if idx >= inputs.len() {
                    break;
                }
                let item = inputs[idx].clone();
                let result = job(idx, item).await;
                if tx.send((idx, result)).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    let mut deadline_exceeded = false;
    let mut interrupted = false;
    loop {
        let received = tokio::select! {
            () = cancel.cancelled() => {
                interrupted = true;
                break;
            }
            received = async {
                match deadline {
                    Some(at) => tokio::time::timeout_at(at, rx.recv()).await,
                    None => Ok(rx.recv().await),
                }
            } => received,
        };
        match received {
            Ok(Some((idx, result))) => slots[idx] = Some(result),
            Ok(None) => break,
            Err(_) => {
                deadline_exceeded = true;
                break;
            }
        }
    }

    // Both interruption paths abort in-flight jobs; nothing waits out a
    // retry budget once the run is over.
    if deadline_exceeded || interrupted {
        for handle in &handles {
            handle.abort();
        }
    }
    for handle in handles {
        // Aborted workers resolve to a JoinError; nothing to salvage there.
        let _ = handle.await;
    }

    PoolRun {
        slots,
        deadline_exceeded,
        cancelled: cancel.is_cancelled(),
    }
}
