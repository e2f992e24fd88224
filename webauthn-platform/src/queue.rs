//! Serial ceremony queue
//!
//! Registrations and authentications run strictly one at a time, in
//! submission order. Without this, two registrations for the same account
//! could both pass the exclude-list check before either stores its
//! credential source.
//!
//! The order is fixed when a ceremony is submitted: each submission takes
//! its turn from the one before it and runs as a task on the submitter's
//! runtime once that predecessor is done with the queue. A ceremony that has
//! not started yet can be cancelled and is then dropped without running.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

const READY: u8 = 0;
const EXECUTING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Lifecycle of a queued ceremony
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    /// Waiting for earlier ceremonies
    Ready,
    Executing,
    Finished,
    /// Cancelled before it started; its body never ran
    Cancelled,
}

impl CeremonyState {
    fn from_u8(value: u8) -> Self {
        match value {
            READY => Self::Ready,
            EXECUTING => Self::Executing,
            FINISHED => Self::Finished,
            _ => Self::Cancelled,
        }
    }
}

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Passed to the next ceremony once the previous one leaves the queue
///
/// A ceremony dropped while it was still waiting passes on the turn it was
/// waiting for, so its successor stays behind the earlier ceremonies.
struct Handoff(Option<oneshot::Receiver<Handoff>>);

/// A ceremony's place in line
struct Turn {
    waiting_on: Option<oneshot::Receiver<Handoff>>,
    next: Option<oneshot::Sender<Handoff>>,
}

impl Turn {
    async fn wait(&mut self) {
        while let Some(previous) = self.waiting_on.as_mut() {
            self.waiting_on = match previous.await {
                Ok(Handoff(earlier)) => earlier,
                Err(_) => None,
            };
        }
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if let Some(next) = self.next.take() {
            // The successor may already be gone
            let _ = next.send(Handoff(self.waiting_on.take()));
        }
    }
}

static SHARED: LazyLock<CeremonyQueue> = LazyLock::new(CeremonyQueue::new);

/// FIFO queue running one ceremony at a time
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct CeremonyQueue {
    tail: Arc<Mutex<Option<oneshot::Receiver<Handoff>>>>,
}

impl CeremonyQueue {
    /// Create a queue that orders nothing but its own submissions
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide queue
    ///
    /// Every credential surface uses it unless given another queue, so
    /// surfaces built independently over the same stores still never
    /// overlap.
    pub fn shared() -> Self {
        SHARED.clone()
    }

    /// Enqueue `future`; it starts once every earlier submission is done
    ///
    /// The ceremony is spawned on the current Tokio runtime. Outside a
    /// runtime nothing can drive it, so the ticket ends up `Cancelled`.
    pub fn submit<F>(&self, future: F) -> Ticket<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(READY));
        let (output_tx, output_rx) = oneshot::channel();

        let job_state = Arc::clone(&state);
        let job: Job = Box::pin(async move {
            let output = future.await;
            job_state.store(FINISHED, Ordering::Release);
            // The ticket may already be gone
            let _ = output_tx.send(output);
        });

        let (next, turn_rx) = oneshot::channel();
        let waiting_on = self
            .tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(turn_rx);
        let turn = Turn {
            waiting_on,
            next: Some(next),
        };

        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run(turn, Arc::clone(&state), job));
            }
            Err(err) => {
                warn!(error = %err, "no runtime to drive ceremony, dropping submission");
                state.store(CANCELLED, Ordering::Release);
            }
        }

        Ticket {
            state,
            output: output_rx,
        }
    }
}

impl fmt::Debug for CeremonyQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CeremonyQueue").finish_non_exhaustive()
    }
}

async fn run(mut turn: Turn, state: Arc<AtomicU8>, job: Job) {
    turn.wait().await;

    if state
        .compare_exchange(READY, EXECUTING, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        debug!("skipping cancelled ceremony");
        return;
    }

    // A panicking ceremony must not hold up the ones behind it
    if let Err(err) = tokio::spawn(job).await {
        warn!(error = %err, "ceremony task failed");
        state.store(FINISHED, Ordering::Release);
    }
}

/// Handle to a submitted ceremony
pub struct Ticket<T> {
    state: Arc<AtomicU8>,
    output: oneshot::Receiver<T>,
}

impl<T> Ticket<T> {
    /// Cancel the ceremony if it has not started yet
    ///
    /// # Returns
    ///
    /// `true` if the ceremony will never run; `false` if it is already
    /// executing, finished, or was cancelled earlier
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(READY, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            debug!("ceremony cancelled before start");
        }
        cancelled
    }

    pub fn state(&self) -> CeremonyState {
        CeremonyState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Wait for the ceremony's output, `None` if it never produced one
    pub async fn wait(self) -> Option<T> {
        self.outcome().await.ok()
    }

    /// Wait for the ceremony's output
    ///
    /// On failure returns the state the ceremony ended in: `Cancelled` when
    /// it was cancelled or could not be queued, otherwise the task died
    /// before producing a value.
    pub async fn outcome(self) -> Result<T, CeremonyState> {
        let state = Arc::clone(&self.state);
        self.output
            .await
            .map_err(|_| CeremonyState::from_u8(state.load(Ordering::Acquire)))
    }
}

impl<T> fmt::Debug for Ticket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket").field("state", &self.state()).finish()
    }
}
