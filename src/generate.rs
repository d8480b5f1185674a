//! Input synthesis for the four shape classes.
//!
//! Randomness flows through the [`ValueSource`] trait so production code can
//! draw from the `rand` thread generator while tests substitute deterministic
//! sequences. The engine itself carries no hidden global random state.

use rand::RngExt;

use crate::state::{ShapeKind, VALUE_BOUND};

/// What: Abstract uniform integer source used by the generator.
///
/// Inputs:
/// - `bound`: Exclusive upper bound, nonzero
///
/// Output:
/// - A value uniform in `[0, bound)` (production) or the next scripted value
///   reduced modulo `bound` (replay)
///
/// Details:
/// - Implementations may replay fixed sequences to enable deterministic
///   testing. Production code relies on [`ThreadRngSource`].
pub trait ValueSource: Send {
    /// Next value in `[0, bound)`.
    fn below(&mut self, bound: u16) -> u16;
}

/// Production source backed by the `rand` per-thread generator, seeded once
/// by the OS at first use and never reseeded per sort.
#[derive(Default)]
pub struct ThreadRngSource;

impl ValueSource for ThreadRngSource {
    fn below(&mut self, bound: u16) -> u16 {
        rand::rng().random_range(0..bound)
    }
}

/// Replay source cycling through a fixed sequence, for deterministic runs.
pub struct ScriptedSource {
    /// Values handed out in order, reduced modulo the requested bound.
    values: Vec<u16>,
    /// Next position in `values`.
    pos: usize,
}

impl ScriptedSource {
    /// What: Build a replay source over a fixed sequence.
    ///
    /// Inputs:
    /// - `values`: Sequence to cycle through; must be non-empty
    ///
    /// Output: Source yielding `values[k % len] % bound` on the k-th draw
    ///
    /// # Panics
    /// - If `values` is empty.
    #[must_use]
    pub fn new(values: Vec<u16>) -> Self {
        assert!(!values.is_empty(), "scripted source needs at least one value");
        Self { values, pos: 0 }
    }
}

impl ValueSource for ScriptedSource {
    fn below(&mut self, bound: u16) -> u16 {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % bound
    }
}

/// Clamp a skeleton index product into the u16 value range.
fn to_value(x: usize) -> u16 {
    u16::try_from(x).unwrap_or(u16::MAX)
}

/// What: Synthesize `n` values in `[0, VALUE_BOUND)` for a shape class.
///
/// Inputs:
/// - `shape`: Shape class to synthesize
/// - `n`: Number of values to produce
/// - `src`: Uniform integer source (injected; see [`ValueSource`])
///
/// Output: Vector of `n` values
///
/// Details:
/// - `Random`: every value uniform in `[0, VALUE_BOUND)`.
/// - `Reversed`: `v[i] = rand(0..5) + 3 * (n - (i + 1))`, a descending
///   skeleton with small jitter.
/// - `NearlySorted`: with probability 2/3 the ordered skeleton `i * 3`,
///   otherwise a fresh uniform value.
/// - `FewUnique`: first two values uniform; afterwards an odd draw copies a
///   previously generated element at a uniform index, an even draw is kept
///   as-is, giving heavy value repetition.
/// - Total: every recognized shape succeeds for every `n`. Unknown shape ids
///   never reach this function; the session rejects them first.
#[must_use]
pub fn generate(shape: ShapeKind, n: usize, src: &mut dyn ValueSource) -> Vec<u16> {
    let mut out = Vec::with_capacity(n);
    match shape {
        ShapeKind::Random => {
            for _ in 0..n {
                out.push(src.below(VALUE_BOUND));
            }
        }
        ShapeKind::Reversed => {
            for i in 0..n {
                let base = to_value(3 * (n - (i + 1)));
                out.push(base.saturating_add(src.below(5)));
            }
        }
        ShapeKind::NearlySorted => {
            for i in 0..n {
                if src.below(3) == 0 {
                    out.push(src.below(VALUE_BOUND));
                } else {
                    out.push(to_value(i * 3));
                }
            }
        }
        ShapeKind::FewUnique => {
            for i in 0..n {
                if i < 2 {
                    out.push(src.below(VALUE_BOUND));
                    continue;
                }
                let x = src.below(VALUE_BOUND);
                if x % 2 == 1 {
                    let idx = usize::from(src.below(to_value(i)));
                    out.push(out[idx]);
                } else {
                    out.push(x);
                }
            }
        }
    }
    out
}
