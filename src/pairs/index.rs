//! Enumeration of unordered index pairs.

use std::iter::FusedIterator;

/// Number of unordered pairs among `n` items, `n * (n - 1) / 2`.
///
/// Returns `None` when the count does not fit in a `usize`. The even factor
/// is halved first, so this only happens when the result itself overflows.
#[must_use]
pub const fn checked_pair_count(n: usize) -> Option<usize> {
    if n < 2 {
        Some(0)
    } else if n % 2 == 0 {
        (n / 2).checked_mul(n - 1)
    } else {
        n.checked_mul((n - 1) / 2)
    }
}

/// Number of unordered pairs among `n` items, saturating at `usize::MAX`.
#[must_use]
pub const fn pair_count(n: usize) -> usize {
    match checked_pair_count(n) {
        Some(count) => count,
        None => usize::MAX,
    }
}

/// Position of the pair `(i, j)` in [`PairIndices`] order.
///
/// Returns `None` unless `i < j < n`.
#[must_use]
pub const fn pair_position(i: usize, j: usize, n: usize) -> Option<usize> {
    if i >= j || j >= n {
        return None;
    }
    // Pairs starting below `i` come first: (n-1) + (n-2) + ... + (n-i)
    let (Some(total), Some(rest)) = (checked_pair_count(n), checked_pair_count(n - i)) else {
        return None;
    };
    Some(total - rest + (j - i - 1))
}

/// Iterator over all index pairs `(i, j)` with `0 <= i < j < n`.
///
/// Pairs come in combinations order: every pair with `i = 0` in increasing
/// `j`, then `i = 1`, and so on. Image pairs and label pairs are built from
/// the same iterator, which keeps them co-indexed.
#[derive(Debug, Clone)]
pub struct PairIndices {
    n: usize,
    i: usize,
    j: usize,
    remaining: usize,
}

impl PairIndices {
    /// Pairs over the indices `0..n`.
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self {
            n,
            i: 0,
            j: 1,
            remaining: pair_count(n),
        }
    }
}

impl Iterator for PairIndices {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let pair = (self.i, self.j);
        self.j += 1;
        if self.j == self.n {
            self.i += 1;
            self.j = self.i + 1;
        }
        self.remaining -= 1;

        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PairIndices {}

impl FusedIterator for PairIndices {}
