//! Session and background-task lifecycle for sort runs.
//!
//! A [`SortSession`] binds one dataset, the currently selected algorithm and
//! shape, a single background-task slot, and an optional completion callback.
//! Sorts run on the tokio blocking pool; cancellation is cooperative through
//! the flag checked at every pacing step, so a new `start` always wins within
//! one pacing interval of the incumbent noticing. A replacing `start` waits
//! for the superseded task to exit before regenerating the dataset: the old
//! run can never write into its successor's data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, mpsc};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::engine::{self, DEFAULT_PACING, Pacer};
use crate::generate::{self, ThreadRngSource, ValueSource};
use crate::state::{AlgoKind, Dataset, RunState, ShapeKind};

/// Completion callback, invoked synchronously on the background task's own
/// thread exactly once per completed (non-cancelled) run.
type CompletionCallback = Arc<dyn Fn(&Dataset) + Send + Sync>;

/// Lock a mutex, recovering the inner value if a holder panicked.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The single background-task slot plus lifecycle bookkeeping.
struct TaskSlot {
    /// Lifecycle state of the slot.
    state: RunState,
    /// Algorithm selected by the most recent accepted `start`.
    algo: Option<AlgoKind>,
    /// Shape selected by the most recent accepted `start`.
    shape: Option<ShapeKind>,
    /// Cancellation flag of the incumbent run, if one is active.
    cancel: Option<Arc<AtomicBool>>,
    /// Handle of the incumbent task. Held for the slot invariant only; the
    /// task is never awaited or aborted, it drains cooperatively.
    task: Option<JoinHandle<()>>,
    /// Exit signal of the incumbent task: the task owns the sender and drops
    /// it on every exit path, so a blocking `recv` observes the exit.
    drain: Option<mpsc::Receiver<()>>,
    /// Monotonic run counter so a superseded task cannot clobber the state
    /// of the run that replaced it.
    generation: u64,
}

/// State shared between the session and its background tasks.
struct Shared {
    /// The dataset, element-atomic and unsynchronized as a whole.
    dataset: Dataset,
    /// Task slot guarded by one mutex.
    slot: Mutex<TaskSlot>,
    /// Optional completion callback.
    callback: Mutex<Option<CompletionCallback>>,
}

impl Shared {
    /// What: Fire the callback for a naturally finished run, then transition
    /// it to `Completed`.
    ///
    /// Inputs:
    /// - `generation`: The finishing run's generation
    ///
    /// Output: None
    ///
    /// Details:
    /// - Runs on the background task's own thread.
    /// - Both steps are guarded by generation and state so a run that was
    ///   replaced or cancelled after its final step fires nothing, and the
    ///   callback fires at most once per run.
    /// - The callback runs before the state flips to `Completed`; a `stop`
    ///   that lands between the two leaves the state `Cancelled`.
    fn complete(&self, generation: u64) {
        let callback = {
            let slot = lock(&self.slot);
            if slot.generation != generation || slot.state != RunState::Running {
                return;
            }
            lock(&self.callback).clone()
        };
        if let Some(callback) = callback {
            callback(&self.dataset);
        }
        let mut slot = lock(&self.slot);
        if slot.generation == generation && slot.state == RunState::Running {
            slot.state = RunState::Completed;
            slot.cancel = None;
            slot.task = None;
        }
    }
}

/// Owning context for one dataset and at most one running sort.
///
/// Created once at startup and kept for the application's lifetime. The
/// controlling context issues `start`/`stop` and reads snapshots; the
/// background task mutates the dataset in place concurrently.
pub struct SortSession {
    /// State shared with background tasks.
    shared: Arc<Shared>,
    /// Delay inserted after every elementary algorithm step.
    pacing: Duration,
    /// Injected randomness for dataset regeneration.
    source: Mutex<Box<dyn ValueSource>>,
}

impl SortSession {
    /// Session with the standard 500 µs pacing and the thread-RNG source.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pacing(DEFAULT_PACING)
    }

    /// What: Session with a caller-chosen pacing delay.
    ///
    /// Inputs:
    /// - `pacing`: Delay after each elementary step; `Duration::ZERO` runs
    ///   the algorithms at full speed
    ///
    /// Output: Fresh idle session over a zeroed 128-cell dataset
    #[must_use]
    pub fn with_pacing(pacing: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                dataset: Dataset::new(),
                slot: Mutex::new(TaskSlot {
                    state: RunState::Idle,
                    algo: None,
                    shape: None,
                    cancel: None,
                    task: None,
                    drain: None,
                    generation: 0,
                }),
                callback: Mutex::new(None),
            }),
            pacing,
            source: Mutex::new(Box::new(ThreadRngSource)),
        }
    }

    /// Replace the randomness source used for dataset regeneration.
    /// Deterministic sources make whole runs reproducible.
    pub fn set_value_source(&self, source: Box<dyn ValueSource>) {
        *lock(&self.source) = source;
    }

    /// What: Register the completion callback.
    ///
    /// Inputs:
    /// - `f`: Invoked with the dataset, on the background task's thread,
    ///   exactly once per completed run; never for a cancelled run
    ///
    /// Output: None (replaces any previously registered callback)
    ///
    /// Details:
    /// - The callback runs on the sorting task's thread while that task
    ///   still occupies the slot, so it must not call [`SortSession::start`]
    ///   itself: a replacing `start` waits for the incumbent task to exit.
    ///   Signal the controlling context (for example through a channel) and
    ///   start the next run from there.
    pub fn set_completion_callback<F>(&self, f: F)
    where
        F: Fn(&Dataset) + Send + Sync + 'static,
    {
        *lock(&self.shared.callback) = Some(Arc::new(f));
    }

    /// What: Start a sort, replacing any incumbent run.
    ///
    /// Inputs:
    /// - `algo_id`: Raw algorithm selector (see [`AlgoKind::from_id`])
    /// - `shape_id`: Raw shape selector (see [`ShapeKind::from_id`])
    ///
    /// Output: None
    ///
    /// Details:
    /// - An unrecognized `shape_id` is logged and the call is a complete
    ///   no-op: no cancellation, no regeneration, no state change.
    /// - An unrecognized `algo_id` with a valid shape still cancels and
    ///   drains the incumbent and regenerates the dataset, but launches no
    ///   sort: a running session falls back to `Idle`, any other state is
    ///   retained.
    /// - Otherwise the incumbent (if any) has its cancellation flag raised
    ///   and this call waits for its task to exit (bounded by one pacing
    ///   interval) before the dataset is regenerated per `shape_id` on the
    ///   caller's context, so the superseded run cannot write into the new
    ///   data; then a fresh task is launched on the tokio blocking pool and
    ///   the state becomes `Running`. One task slot, no queueing: a new
    ///   start always wins.
    /// - Without a reachable tokio runtime the task cannot be created; the
    ///   failure is logged and the session falls back to `Idle` with no
    ///   active sort. No result code is surfaced to the caller.
    pub fn start(&self, algo_id: u8, shape_id: u8) {
        let Some(shape) = ShapeKind::from_id(shape_id) else {
            tracing::warn!(id = shape_id, "unknown shape id, sort skipped");
            return;
        };
        let algo = AlgoKind::from_id(algo_id);
        if algo.is_none() {
            tracing::warn!(id = algo_id, "unknown algorithm id, sort skipped");
        }

        // Cancel the incumbent and wait for its task to exit before touching
        // the dataset. The generation bump keeps a concurrently finishing
        // task from claiming `Completed` while we wait.
        let drain = {
            let mut slot = lock(&self.shared.slot);
            if let Some(flag) = slot.cancel.take() {
                flag.store(true, Ordering::Relaxed);
            }
            slot.task = None;
            slot.generation += 1;
            slot.drain.take()
        };
        if let Some(done) = drain {
            // Returns once the task drops its sender on exit.
            let _ = done.recv();
        }

        let mut slot = lock(&self.shared.slot);
        let generation = slot.generation;
        slot.shape = Some(shape);

        {
            let mut source = lock(&self.source);
            let n = self.shared.dataset.len();
            let values = generate::generate(shape, n, source.as_mut());
            self.shared.dataset.fill(&values);
        }

        let Some(algo) = algo else {
            // Shape was valid, so regeneration happened; with no algorithm
            // to run the slot is left empty.
            if slot.state == RunState::Running {
                slot.state = RunState::Idle;
            }
            return;
        };
        slot.algo = Some(algo);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!("no tokio runtime available, sort task not created");
            slot.state = RunState::Idle;
            return;
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel::<()>();
        slot.cancel = Some(Arc::clone(&cancel));
        slot.drain = Some(done_rx);
        let pacing = self.pacing;
        let shared = Arc::clone(&self.shared);
        let task = runtime.spawn_blocking(move || {
            // Dropped on every exit path, unblocking a replacing `start`.
            let _exit_signal = done_tx;
            let pacer = Pacer::new(pacing, cancel);
            if engine::run(algo, &shared.dataset, &pacer).is_ok() {
                shared.complete(generation);
            }
        });
        slot.task = Some(task);
        slot.state = RunState::Running;
    }

    /// What: Cancel the incumbent run, if any.
    ///
    /// Inputs: None
    ///
    /// Output: None
    ///
    /// Details:
    /// - If `Running`, raises the cancellation flag and transitions to
    ///   `Cancelled`; the task drains within one pacing interval and its
    ///   callback is suppressed. Otherwise a no-op.
    pub fn stop(&self) {
        let mut slot = lock(&self.shared.slot);
        if slot.state != RunState::Running {
            return;
        }
        if let Some(flag) = slot.cancel.take() {
            flag.store(true, Ordering::Relaxed);
        }
        slot.task = None;
        slot.state = RunState::Cancelled;
    }

    /// Current lifecycle state of the task slot.
    #[must_use]
    pub fn state(&self) -> RunState {
        lock(&self.shared.slot).state
    }

    /// Algorithm and shape of the most recent accepted `start`, if any.
    #[must_use]
    pub fn selection(&self) -> Option<(AlgoKind, ShapeKind)> {
        let slot = lock(&self.shared.slot);
        slot.algo.zip(slot.shape)
    }

    /// Whether the last run completed a full sort.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.shared.dataset.is_sorted()
    }

    /// Best-effort copy of the dataset for rendering. Values are read cell
    /// by cell while the sorter may be mutating them; that tearing-free but
    /// unsynchronized view is the documented contract.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u16> {
        self.shared.dataset.snapshot()
    }

    /// Number of dataset cells, constant for the session's lifetime.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.dataset.len()
    }

    /// Whether the dataset holds no cells. Never true for a real session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.dataset.is_empty()
    }
}

impl Default for SortSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SortSession {
    fn drop(&mut self) {
        // Teardown: let any incumbent drain instead of leaking a runner.
        let mut slot = lock(&self.shared.slot);
        if let Some(flag) = slot.cancel.take() {
            flag.store(true, Ordering::Relaxed);
        }
        slot.task = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What: An unknown shape id is a complete no-op
    ///
    /// - Input: start with a valid algo but shape id 9
    /// - Output: State stays Idle, dataset untouched, no selection recorded
    #[test]
    fn unknown_shape_changes_nothing() {
        let session = SortSession::with_pacing(Duration::ZERO);
        let before = session.snapshot();
        session.start(0, 9);
        assert_eq!(session.state(), RunState::Idle);
        assert_eq!(session.snapshot(), before);
        assert_eq!(session.selection(), None);
    }

    /// What: An unknown algo id with a valid shape regenerates but runs nothing
    ///
    /// - Input: start(9, 1) on a fresh zeroed session
    /// - Output: Dataset holds the reversed skeleton, state Idle, no algorithm
    ///   recorded
    #[test]
    fn unknown_algo_regenerates_without_sorting() {
        let session = SortSession::with_pacing(Duration::ZERO);
        session.start(9, 1);
        assert_eq!(session.state(), RunState::Idle);
        let snap = session.snapshot();
        // Reversed skeleton: nonzero everywhere but possibly the last cell.
        assert!(snap.iter().rev().skip(1).all(|&v| v > 0), "{snap:?}");
        assert_eq!(session.selection(), None);
        assert!(!session.is_sorted());
    }

    /// What: Without a runtime the session falls back to Idle after a valid start
    ///
    /// - Input: start(0, 1) outside any tokio runtime
    /// - Output: State Idle, dataset regenerated (values no longer all zero)
    #[test]
    fn start_without_runtime_falls_back_to_idle() {
        let session = SortSession::with_pacing(Duration::ZERO);
        session.start(0, 1);
        assert_eq!(session.state(), RunState::Idle);
        // Regeneration happened before the failed task creation: the
        // reversed skeleton is nonzero everywhere but the last cell.
        let snap = session.snapshot();
        assert!(snap.iter().rev().skip(1).all(|&v| v > 0), "{snap:?}");
        assert_eq!(session.selection().map(|(a, s)| (a.id(), s.id())), Some((0, 1)));
    }

    /// What: stop on a non-running session is a no-op
    ///
    /// - Input: stop() on a fresh session
    /// - Output: State stays Idle
    #[test]
    fn stop_when_idle_is_noop() {
        let session = SortSession::new();
        session.stop();
        assert_eq!(session.state(), RunState::Idle);
    }
}
