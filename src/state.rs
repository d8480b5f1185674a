//! Shared dataset and selector types.
//!
//! The dataset is shared mutable state between the sorting task and a
//! renderer that samples it between pacing steps. There is deliberately no
//! whole-array synchronization: displayed values are a best-effort snapshot.
//! Cells are `AtomicU16` with relaxed ordering so individual reads and writes
//! are never torn, which is the only consistency the renderer is promised.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Number of values a session's dataset holds.
pub const DATASET_LEN: usize = 128;

/// Exclusive upper bound for generated values.
pub const VALUE_BOUND: u16 = 400;

/// Fixed-size sequence of unsigned 16-bit values plus a `sorted` flag.
///
/// Only the background sorting task writes cells; the controlling context
/// reads them concurrently for rendering. All accesses are relaxed atomic
/// operations on individual cells.
pub struct Dataset {
    /// Value cells, length fixed at construction.
    cells: Box<[AtomicU16]>,
    /// Set only after an algorithm has fully completed; false while a sort is
    /// running or after a cancelled run.
    sorted: AtomicBool,
}

impl Dataset {
    /// What: Create a dataset of the standard visualizer length
    /// ([`DATASET_LEN`]), zero-filled and unsorted.
    ///
    /// Inputs: None
    ///
    /// Output: Fresh [`Dataset`] with 128 zeroed cells
    #[must_use]
    pub fn new() -> Self {
        Self::with_len(DATASET_LEN)
    }

    /// What: Create a dataset of an arbitrary length for scaled-down runs.
    ///
    /// Inputs:
    /// - `n`: Number of cells
    ///
    /// Output: Zero-filled, unsorted dataset of length `n`
    ///
    /// Details:
    /// - Sessions always use [`Dataset::new`]; this exists so tests and demos
    ///   can exercise the engine on small inputs.
    #[must_use]
    pub fn with_len(n: usize) -> Self {
        let cells = (0..n).map(|_| AtomicU16::new(0)).collect();
        Self {
            cells,
            sorted: AtomicBool::new(false),
        }
    }

    /// Number of cells; constant for the dataset's lifetime.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the dataset holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read the value at `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> u16 {
        self.cells[i].load(Ordering::Relaxed)
    }

    /// Write `value` at `i`.
    pub fn set(&self, i: usize, value: u16) {
        self.cells[i].store(value, Ordering::Relaxed);
    }

    /// What: Exchange the values at `i` and `j`.
    ///
    /// Inputs:
    /// - `i`, `j`: Cell indices
    ///
    /// Output: None (cells exchanged in place)
    ///
    /// Details:
    /// - An involution: applying it twice restores the original pair.
    /// - Performs no writes at all when both cells already hold equal values,
    ///   so `swap(i, i)` never produces an observable mutation.
    pub fn swap(&self, i: usize, j: usize) {
        let a = self.get(i);
        let b = self.get(j);
        if a != b {
            self.set(i, b);
            self.set(j, a);
        }
    }

    /// What: Overwrite all cells from a slice and clear the `sorted` flag.
    ///
    /// Inputs:
    /// - `values`: Replacement values; length must equal [`Dataset::len`]
    ///
    /// Output: None
    ///
    /// # Panics
    /// - If `values.len()` differs from the dataset length.
    pub fn fill(&self, values: &[u16]) {
        assert_eq!(values.len(), self.len(), "dataset length is constant");
        self.sorted.store(false, Ordering::Relaxed);
        for (i, v) in values.iter().enumerate() {
            self.set(i, *v);
        }
    }

    /// Best-effort copy of the current values, cell by cell.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u16> {
        self.cells
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect()
    }

    /// Whether the last run completed a full sort.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted.load(Ordering::Relaxed)
    }

    /// Set or clear the `sorted` flag.
    pub fn set_sorted(&self, value: bool) {
        self.sorted.store(value, Ordering::Relaxed);
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorting algorithm selector as presented to the UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgoKind {
    /// Adjacent-pair passes until a pass performs no swap.
    Bubble,
    /// Repeated minimum scan over the unsorted suffix.
    Selection,
    /// Shift-and-insert into the sorted prefix.
    Insertion,
    /// Lomuto-partition quicksort with a midpoint pivot.
    Quick,
    /// In-array binary max-heap, then repeated root extraction.
    Heap,
}

impl AlgoKind {
    /// All algorithm kinds in menu order.
    pub const ALL: [Self; 5] = [
        Self::Bubble,
        Self::Selection,
        Self::Insertion,
        Self::Quick,
        Self::Heap,
    ];

    /// What: Resolve a raw menu identifier to an algorithm kind.
    ///
    /// Inputs:
    /// - `id`: Raw selector as sent by the UI layer
    ///
    /// Output: `Some(kind)` for ids 0..=4, `None` otherwise
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Bubble),
            1 => Some(Self::Selection),
            2 => Some(Self::Insertion),
            3 => Some(Self::Quick),
            4 => Some(Self::Heap),
            _ => None,
        }
    }

    /// Raw selector for this kind, inverse of [`AlgoKind::from_id`].
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Bubble => 0,
            Self::Selection => 1,
            Self::Insertion => 2,
            Self::Quick => 3,
            Self::Heap => 4,
        }
    }

    /// Human-readable name for logs and the demo binary.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bubble => "bubble",
            Self::Selection => "selection",
            Self::Insertion => "insertion",
            Self::Quick => "quick",
            Self::Heap => "heap",
        }
    }
}

/// Input shape class selector: the strategy used to synthesize test input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// Every value uniform in `[0, VALUE_BOUND)`.
    Random,
    /// Descending skeleton with small jitter.
    Reversed,
    /// Mostly the already-ordered skeleton `i * 3`, occasionally fresh noise.
    NearlySorted,
    /// Heavy value repetition via copying earlier elements.
    FewUnique,
}

impl ShapeKind {
    /// All shape kinds in menu order.
    pub const ALL: [Self; 4] = [
        Self::Random,
        Self::Reversed,
        Self::NearlySorted,
        Self::FewUnique,
    ];

    /// What: Resolve a raw menu identifier to a shape kind.
    ///
    /// Inputs:
    /// - `id`: Raw selector as sent by the UI layer
    ///
    /// Output: `Some(kind)` for ids 0..=3, `None` otherwise
    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Random),
            1 => Some(Self::Reversed),
            2 => Some(Self::NearlySorted),
            3 => Some(Self::FewUnique),
            _ => None,
        }
    }

    /// Raw selector for this kind, inverse of [`ShapeKind::from_id`].
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::Random => 0,
            Self::Reversed => 1,
            Self::NearlySorted => 2,
            Self::FewUnique => 3,
        }
    }

    /// Human-readable name for logs and the demo binary.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Reversed => "reversed",
            Self::NearlySorted => "nearly-sorted",
            Self::FewUnique => "few-unique",
        }
    }
}

/// Lifecycle state of a session's single background-task slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// No sort has been started yet, or task creation failed.
    Idle,
    /// A background sorting task is active.
    Running,
    /// The last run finished naturally and fired its callback.
    Completed,
    /// The last run was cancelled by `stop()`.
    Cancelled,
}
