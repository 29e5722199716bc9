//! Deterministic Random Number Generator
//!
//! Uses the mulberry32 mixing function: a single 32-bit word of state,
//! advanced by a fixed increment and hashed into a float in [0, 1).
//! Given the same seed and call sequence, the output is bit-identical on
//! every platform. Every derived operation is built from [`DeterministicRng::next_float`].

use serde::{Deserialize, Serialize};

/// Increment applied to the state on every draw.
const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

/// 2^32 as a float, used to map a u32 into [0, 1).
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Errors from misuse of the RNG (empty or malformed inputs).
///
/// Never raised for well-formed content; seeing one means a content or
/// integration bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RngError {
    /// Tried to pick from an empty sequence.
    #[error("cannot pick from an empty sequence")]
    EmptyChoice,

    /// Items and weights had different lengths.
    #[error("weighted pick got {items} items but {weights} weights")]
    WeightMismatch {
        /// Number of items supplied.
        items: usize,
        /// Number of weights supplied.
        weights: usize,
    },

    /// Asked for more distinct samples than exist.
    #[error("cannot sample {requested} items from {available}")]
    SampleTooLarge {
        /// Requested sample size.
        requested: usize,
        /// Items available.
        available: usize,
    },
}

/// Deterministic PRNG (mulberry32).
///
/// The whole generator is one `u32`, exposed as the *cursor*. A cursor
/// captured with [`cursor`](Self::cursor) and fed back to
/// [`from_cursor`](Self::from_cursor) continues the exact same stream.
///
/// # Example
///
/// ```
/// use paper_federation::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(42);
/// let mut b = DeterministicRng::new(42);
/// assert_eq!(a.next_float(), b.next_float());
/// assert_eq!(a.cursor(), b.cursor());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u32,
}

impl DeterministicRng {
    /// Create a new RNG from a 32-bit seed.
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Rebuild a generator from a previously captured cursor.
    pub const fn from_cursor(cursor: u32) -> Self {
        Self { state: cursor }
    }

    /// Derive an independent, reproducible sub-stream.
    ///
    /// The sub-stream starts at `cursor + offset` and leaves `self`
    /// untouched, so drawing from it never disturbs the main stream.
    pub const fn derive(&self, offset: u32) -> Self {
        Self::from_cursor(self.state.wrapping_add(offset))
    }

    /// Current internal state.
    #[inline]
    pub const fn cursor(&self) -> u32 {
        self.state
    }

    /// Reseed in place.
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Next float in [0, 1).
    #[inline]
    pub fn next_float(&mut self) -> f64 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / TWO_POW_32
    }

    /// Integer in [min, max] inclusive.
    ///
    /// `floor(float * (max - min + 1)) + min`. Always consumes one draw,
    /// including for a single-value range. An inverted range returns `min`
    /// without drawing.
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min > max {
            return min;
        }
        let span = f64::from(max) - f64::from(min) + 1.0;
        let offset = (self.next_float() * span).floor() as i64;
        (i64::from(min) + offset) as i32
    }

    /// Percentile roll in [1, 100].
    #[inline]
    pub fn roll_percent(&mut self) -> u32 {
        self.next_int_range(1, 100) as u32
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, RngError> {
        if items.is_empty() {
            return Err(RngError::EmptyChoice);
        }
        let idx = self.next_int_range(0, items.len() as i32 - 1) as usize;
        Ok(&items[idx])
    }

    /// Pick `n` distinct items: full shuffle, then take the prefix.
    pub fn pick_n<T: Clone>(&mut self, items: &[T], n: usize) -> Result<Vec<T>, RngError> {
        if n > items.len() {
            return Err(RngError::SampleTooLarge {
                requested: n,
                available: items.len(),
            });
        }
        let mut shuffled = self.shuffled(items);
        shuffled.truncate(n);
        Ok(shuffled)
    }

    /// Weighted pick by cumulative-weight roll.
    ///
    /// Draws `r = float * total` and subtracts weights in order until the
    /// remainder is `<= 0`. The last item absorbs floating-point slack.
    pub fn pick_weighted<'a, T>(
        &mut self,
        items: &'a [T],
        weights: &[f64],
    ) -> Result<&'a T, RngError> {
        if items.len() != weights.len() {
            return Err(RngError::WeightMismatch {
                items: items.len(),
                weights: weights.len(),
            });
        }
        let last = items.last().ok_or(RngError::EmptyChoice)?;

        let total: f64 = weights.iter().sum();
        let mut remainder = self.next_float() * total;
        for (item, weight) in items.iter().zip(weights) {
            remainder -= weight;
            if remainder <= 0.0 {
                return Ok(item);
            }
        }
        Ok(last)
    }

    /// Fisher-Yates shuffle into a new vector; the input is untouched.
    pub fn shuffled<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            let j = self.next_int_range(0, i as i32) as usize;
            out.swap(i, j);
        }
        out
    }

    /// Bernoulli trial: percentile roll `<= chance`.
    #[inline]
    pub fn chance(&mut self, chance_percent: u32) -> bool {
        self.roll_percent() <= chance_percent
    }
}

// =============================================================================
// TESTS
// =============================================================================
