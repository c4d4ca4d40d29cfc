//! Small helpers that scan a finished word slice to recover scalar summary
//! state (`last`, cardinality) without needing a full bit iterator.

use crate::word::{self, BLOCK_SIZE};

/// Recomputes `last` (the highest set element, or `-1` for an empty set)
/// from a word slice that satisfies the trailing-word invariant: the final
/// word is a literal with at least one set bit, or a one-run.
pub(crate) fn compute_last(words: &[u32]) -> i64 {
    if words.is_empty() {
        return -1;
    }
    let mut base = 0i64;
    for &w in &words[..words.len() - 1] {
        base += word::block_span(w) * BLOCK_SIZE;
    }
    let tail = words[words.len() - 1];
    if word::is_literal(tail) {
        let bits = word::literal_bits(tail);
        debug_assert_ne!(bits, 0, "trailing literal must carry at least one set bit");
        let hi = 31i64 - bits.leading_zeros() as i64;
        base + hi
    } else {
        debug_assert!(word::is_one_run(tail), "trailing run must be a one-run");
        base + word::block_span(tail) * BLOCK_SIZE - 1
    }
}

/// Recomputes cardinality by scanning every word. Used to lazily refresh
/// the cached `size` sentinel.
pub(crate) fn compute_size(words: &[u32]) -> i64 {
    words.iter().map(|&w| word::word_popcount(w)).sum()
}
