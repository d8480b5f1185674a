//! The five sorting algorithms and the pacing/cancellation gate.
//!
//! Every elementary comparison or move passes through [`Pacer::step`], which
//! sleeps for the configured pacing delay so a renderer can sample the array
//! between steps, and checks the run's cancellation flag. Cancellation is
//! cooperative: the flag is observed within one pacing interval and the
//! algorithm unwinds through `Result` without touching the `sorted` flag,
//! leaving the array in whatever partially ordered state it had reached.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::state::{AlgoKind, Dataset};

/// Default delay after each elementary step, chosen so a 128-element sort
/// progresses at a human-observable rate.
pub const DEFAULT_PACING: Duration = Duration::from_micros(500);

/// Marker error: the run's cancellation flag was raised mid-sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sort interrupted by cancellation")
    }
}

impl std::error::Error for Interrupted {}

/// Per-run gate combining the pacing delay with the cancellation flag.
pub struct Pacer {
    /// Sleep inserted after each elementary step; zero skips the sleep.
    delay: Duration,
    /// Raised by `stop()` or by a replacing `start()`.
    cancel: Arc<AtomicBool>,
}

impl Pacer {
    /// What: Build a gate for one run.
    ///
    /// Inputs:
    /// - `delay`: Pacing delay per elementary step
    /// - `cancel`: Shared flag raised to interrupt the run
    ///
    /// Output: Gate handed to the algorithm for the run's whole duration
    #[must_use]
    pub fn new(delay: Duration, cancel: Arc<AtomicBool>) -> Self {
        Self { delay, cancel }
    }

    /// Gate with zero delay and a flag nobody raises, for tests and demos
    /// that want full-speed, uncancellable runs.
    #[must_use]
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO, Arc::new(AtomicBool::new(false)))
    }

    /// What: One elementary-step checkpoint.
    ///
    /// Inputs: None
    ///
    /// Output: `Ok(())` to continue, `Err(Interrupted)` once the flag is up
    ///
    /// # Errors
    /// - Returns `Err(Interrupted)` when the cancellation flag has been
    ///   raised. The flag is checked before and after the sleep, so
    ///   cancellation latency is bounded by one pacing interval and a task
    ///   never carries a write out of a pacing sleep into a cancelled run.
    pub fn step(&self) -> Result<(), Interrupted> {
        self.check()?;
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
            self.check()?;
        }
        Ok(())
    }

    /// Cancellation check without the pacing delay, for in-place writes that
    /// no checkpoint in the same iteration already covers.
    fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Interrupted);
        }
        Ok(())
    }
}

/// What: Run one algorithm in place over the dataset, paced per step.
///
/// Inputs:
/// - `algo`: Algorithm to run
/// - `data`: Shared dataset, mutated in place
/// - `pacer`: Pacing/cancellation gate for this run
///
/// Output: `Ok(())` after a full sort with the `sorted` flag set
///
/// # Errors
/// - Returns `Err(Interrupted)` if the run was cancelled; the `sorted` flag
///   stays false and the array keeps its partial ordering.
pub fn run(algo: AlgoKind, data: &Dataset, pacer: &Pacer) -> Result<(), Interrupted> {
    data.set_sorted(false);
    match algo {
        AlgoKind::Bubble => bubble(data, pacer)?,
        AlgoKind::Selection => selection(data, pacer)?,
        AlgoKind::Insertion => insertion(data, pacer)?,
        AlgoKind::Quick => quick(data, pacer)?,
        AlgoKind::Heap => heap(data, pacer)?,
    }
    data.set_sorted(true);
    Ok(())
}

/// Adjacent-pair passes until a full pass performs no swap.
fn bubble(data: &Dataset, pacer: &Pacer) -> Result<(), Interrupted> {
    let n = data.len();
    let mut swapped = true;
    let mut pass = 0;
    while swapped && pass < n {
        swapped = false;
        for j in 0..n.saturating_sub(1) {
            pacer.step()?;
            if data.get(j) > data.get(j + 1) {
                data.swap(j, j + 1);
                swapped = true;
            }
        }
        pass += 1;
    }
    Ok(())
}

/// Index of the minimum value in `[start, end)`, one pace per comparison.
fn min_index(
    data: &Dataset,
    start: usize,
    end: usize,
    pacer: &Pacer,
) -> Result<usize, Interrupted> {
    let mut imin = start;
    for i in start + 1..end {
        pacer.step()?;
        if data.get(i) < data.get(imin) {
            imin = i;
        }
    }
    Ok(imin)
}

/// Repeatedly move the minimum of the unsorted suffix to its front.
fn selection(data: &Dataset, pacer: &Pacer) -> Result<(), Interrupted> {
    let n = data.len();
    for i in 0..n {
        let imin = min_index(data, i, n, pacer)?;
        if imin != i {
            // The scan above may have had nothing to compare.
            pacer.check()?;
            data.swap(i, imin);
        }
    }
    Ok(())
}

/// Shift-and-insert each element into the sorted prefix.
fn insertion(data: &Dataset, pacer: &Pacer) -> Result<(), Interrupted> {
    let n = data.len();
    for i in 1..n {
        let value = data.get(i);
        let mut j = i;
        while j > 0 && data.get(j - 1) > value {
            pacer.step()?;
            data.set(j, data.get(j - 1));
            j -= 1;
        }
        // The trailing placement happens even when no shift paced, so it
        // needs its own cancellation check.
        pacer.check()?;
        data.set(j, value);
    }
    Ok(())
}

/// What: Lomuto partition of `[l, r]` around the midpoint element.
///
/// Inputs:
/// - `data`: Dataset being sorted
/// - `l`, `r`: Inclusive range bounds, `l <= r`
/// - `pacer`: Pacing gate, one pace per comparison
///
/// Output: Boundary index `j`: values in `[l, j)` are `<= data[j]` and values
/// in `(j, r]` are `>= data[j]`
///
/// # Errors
/// - Returns `Err(Interrupted)` when the run is cancelled mid-partition.
///
/// Details:
/// - The pivot is the element at `(l + r) / 2`, swapped to `r` before the
///   scan and swapped back to the boundary afterwards.
fn partition(data: &Dataset, l: usize, r: usize, pacer: &Pacer) -> Result<usize, Interrupted> {
    pacer.check()?;
    let pivot = usize::midpoint(l, r);
    data.swap(pivot, r);
    let mut j = l;
    for i in l..r {
        pacer.step()?;
        if data.get(i) <= data.get(r) {
            data.swap(i, j);
            j += 1;
        }
    }
    data.swap(j, r);
    Ok(j)
}

/// Recursive quicksort over the inclusive range `[l, r]`.
fn quick_range(data: &Dataset, l: usize, r: usize, pacer: &Pacer) -> Result<(), Interrupted> {
    if l >= r {
        return Ok(());
    }
    let b = partition(data, l, r, pacer)?;
    if b > l {
        quick_range(data, l, b - 1, pacer)?;
    }
    if b < r {
        quick_range(data, b + 1, r, pacer)?;
    }
    Ok(())
}

/// Quicksort entry point.
fn quick(data: &Dataset, pacer: &Pacer) -> Result<(), Interrupted> {
    let n = data.len();
    if n > 1 {
        quick_range(data, 0, n - 1, pacer)?;
    }
    Ok(())
}

/// Sift the value at `i` down the max-heap occupying `[0, end)`, pacing once
/// per level descended.
fn sift_down(data: &Dataset, mut i: usize, end: usize, pacer: &Pacer) -> Result<(), Interrupted> {
    loop {
        pacer.step()?;
        let left = 2 * i + 1;
        let right = 2 * i + 2;
        let mut largest = i;
        if left < end && data.get(left) > data.get(largest) {
            largest = left;
        }
        if right < end && data.get(right) > data.get(largest) {
            largest = right;
        }
        if largest == i {
            return Ok(());
        }
        data.swap(i, largest);
        i = largest;
    }
}

/// Build a max-heap from the last internal node up, then repeatedly swap the
/// root with the last unsorted element and re-sift.
fn heap(data: &Dataset, pacer: &Pacer) -> Result<(), Interrupted> {
    let n = data.len();
    for i in (0..n / 2).rev() {
        sift_down(data, i, n, pacer)?;
    }
    for end in (1..n).rev() {
        pacer.check()?;
        data.swap(0, end);
        sift_down(data, 0, end, pacer)?;
    }
    Ok(())
}
