//! Background-task lifecycle: completion, cancellation, replacement.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use sortscope::generate::ScriptedSource;
use sortscope::session::SortSession;
use sortscope::state::{AlgoKind, RunState, ShapeKind};

/// Callback plumbing: counts invocations and signals an async waiter.
fn instrument(session: &SortSession) -> (Arc<AtomicUsize>, mpsc::UnboundedReceiver<Vec<u16>>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let fired_cb = Arc::clone(&fired);
    let (tx, rx) = mpsc::unbounded_channel();
    session.set_completion_callback(move |data| {
        fired_cb.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(data.snapshot());
    });
    (fired, rx)
}

/// Poll until the session reaches `state`; the callback fires before the
/// `Completed` transition, so observers may need a moment after it.
async fn wait_for(session: &SortSession, state: RunState) {
    for _ in 0..500 {
        if session.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session never reached {state:?}, still {:?}", session.state());
}

fn is_non_decreasing(v: &[u16]) -> bool {
    v.windows(2).all(|w| w[0] <= w[1])
}

/// What: A full-speed run completes, fires the callback once, sets the flag
///
/// - Input: Insertion x Random, zero pacing
/// - Output: Completed state, sorted snapshot, exactly one callback firing
#[tokio::test(flavor = "multi_thread")]
async fn natural_completion_fires_callback_once() {
    let session = SortSession::with_pacing(Duration::ZERO);
    let (fired, mut done) = instrument(&session);

    session.start(AlgoKind::Insertion.id(), ShapeKind::Random.id());
    let values = timeout(Duration::from_secs(10), done.recv())
        .await
        .expect("sort should finish well within the timeout")
        .expect("callback sender alive");

    assert!(is_non_decreasing(&values));
    wait_for(&session, RunState::Completed).await;
    assert!(session.is_sorted());
    // Give a hypothetical duplicate firing time to show up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// What: stop() mid-run cancels, suppresses the callback, and a restart completes
///
/// - Input: Bubble x Reversed at 500us pacing, stopped after 30ms, then Heap
/// - Output: Cancelled with flag false and no callback; restarted run reaches
///   Completed with exactly one callback firing
#[tokio::test(flavor = "multi_thread")]
async fn stop_cancels_then_restart_completes() {
    let session = SortSession::with_pacing(Duration::from_micros(500));
    let (fired, mut done) = instrument(&session);

    session.start(AlgoKind::Bubble.id(), ShapeKind::Reversed.id());
    assert_eq!(session.state(), RunState::Running);
    tokio::time::sleep(Duration::from_millis(30)).await;

    session.stop();
    assert_eq!(session.state(), RunState::Cancelled);
    // Let the cancelled task drain; it must stay silent.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!session.is_sorted());

    // A new start always succeeds regardless of prior state.
    session.start(AlgoKind::Heap.id(), ShapeKind::Random.id());
    assert_eq!(session.state(), RunState::Running);
    let values = timeout(Duration::from_secs(30), done.recv())
        .await
        .expect("restarted sort should finish")
        .expect("callback sender alive");
    assert!(is_non_decreasing(&values));
    wait_for(&session, RunState::Completed).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// What: A new start while running wins immediately and silences the incumbent
///
/// - Input: Bubble x Reversed at 500us pacing, replaced by Heap x FewUnique
/// - Output: Selection switches at once; only the replacement's callback fires
#[tokio::test(flavor = "multi_thread")]
async fn new_start_replaces_incumbent() {
    let session = SortSession::with_pacing(Duration::from_micros(500));
    let (fired, mut done) = instrument(&session);

    session.start(AlgoKind::Bubble.id(), ShapeKind::Reversed.id());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.state(), RunState::Running);

    session.start(AlgoKind::Heap.id(), ShapeKind::FewUnique.id());
    assert_eq!(session.state(), RunState::Running);
    assert_eq!(
        session.selection(),
        Some((AlgoKind::Heap, ShapeKind::FewUnique))
    );

    let values = timeout(Duration::from_secs(30), done.recv())
        .await
        .expect("replacement sort should finish")
        .expect("callback sender alive");
    assert!(is_non_decreasing(&values));
    wait_for(&session, RunState::Completed).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// What: A superseded run's late writes never reach the replacement's dataset
///
/// - Input: Insertion x Reversed at 100ms pacing (task asleep mid-shift),
///   replaced by Insertion over a scripted ascending dataset that completes
///   instantly
/// - Output: Snapshot equals the scripted sequence exactly, both right after
///   completion and well past the old task's wake-up time
#[tokio::test(flavor = "multi_thread")]
async fn replacement_is_isolated_from_superseded_writes() {
    let session = SortSession::with_pacing(Duration::from_millis(100));
    let (fired, mut done) = instrument(&session);

    session.start(AlgoKind::Insertion.id(), ShapeKind::Reversed.id());
    assert_eq!(session.state(), RunState::Running);
    // Land inside one of the old task's pacing sleeps.
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Already ascending, so the replacement paces zero shift steps and
    // finishes at once.
    let script: Vec<u16> = (128..256).collect();
    session.set_value_source(Box::new(ScriptedSource::new(script.clone())));
    session.start(AlgoKind::Insertion.id(), ShapeKind::Random.id());

    let values = timeout(Duration::from_secs(10), done.recv())
        .await
        .expect("replacement sort should finish")
        .expect("callback sender alive");
    assert_eq!(values, script);

    // Well past the superseded task's last possible wake-up.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.snapshot(), script);
    wait_for(&session, RunState::Completed).await;
    assert!(session.is_sorted());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// What: An unknown shape id leaves a running sort untouched
///
/// - Input: Long-running Bubble sort, then a start with an out-of-range shape
/// - Output: State stays Running and the original selection is retained
#[tokio::test(flavor = "multi_thread")]
async fn unknown_shape_leaves_running_sort_untouched() {
    let session = SortSession::with_pacing(Duration::from_micros(500));
    let (fired, _done) = instrument(&session);

    session.start(AlgoKind::Bubble.id(), ShapeKind::Reversed.id());
    assert_eq!(session.state(), RunState::Running);

    session.start(AlgoKind::Quick.id(), 42);
    assert_eq!(session.state(), RunState::Running);
    assert_eq!(
        session.selection(),
        Some((AlgoKind::Bubble, ShapeKind::Reversed))
    );
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    session.stop();
    assert_eq!(session.state(), RunState::Cancelled);
}

/// What: An unknown algo id with a valid shape cancels the incumbent and
/// regenerates without launching a sort
///
/// - Input: Running Bubble sort, then start(99, Random) over a scripted
///   ascending source
/// - Output: State Idle, dataset is exactly the scripted sequence, callback
///   never fires
#[tokio::test(flavor = "multi_thread")]
async fn unknown_algo_cancels_incumbent_and_regenerates() {
    let session = SortSession::with_pacing(Duration::from_micros(500));
    let (fired, _done) = instrument(&session);

    session.start(AlgoKind::Bubble.id(), ShapeKind::Reversed.id());
    assert_eq!(session.state(), RunState::Running);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let script: Vec<u16> = (0..128).collect();
    session.set_value_source(Box::new(ScriptedSource::new(script.clone())));
    session.start(99, ShapeKind::Random.id());

    assert_eq!(session.state(), RunState::Idle);
    assert_eq!(session.selection(), Some((AlgoKind::Bubble, ShapeKind::Random)));
    // The incumbent was drained before regeneration; nothing disturbs the
    // fresh values and no callback ever fires.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.snapshot(), script);
    assert!(!session.is_sorted());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

/// What: Renderer-style snapshots stay readable while a sort is mutating
///
/// - Input: Selection x Random at 200us pacing, sampled repeatedly
/// - Output: Every snapshot has the session length and in-bound values
#[tokio::test(flavor = "multi_thread")]
async fn snapshots_remain_consistent_per_cell_during_run() {
    let session = SortSession::with_pacing(Duration::from_micros(200));
    session.start(AlgoKind::Selection.id(), ShapeKind::Random.id());

    for _ in 0..10 {
        let snap = session.snapshot();
        assert_eq!(snap.len(), session.len());
        assert!(snap.iter().all(|&v| v < sortscope::state::VALUE_BOUND));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    session.stop();
}
