//! The append path (new tail element, strictly greater than any existing
//! element) and the compression step that runs after every append to keep
//! the word buffer in its fixpoint: no two adjacent words are mergeable.

use crate::buffer::WordBuffer;
use crate::word::{self, ALL_ZEROS_LITERAL, BLOCK_SIZE, LITERAL_TAG};

/// Appends `e` (which must be strictly greater than `last`, or `last == -1`
/// for an empty set) and returns the new `last`.
pub(crate) fn append(buf: &mut WordBuffer, last: i64, e: i64, simulate_wah: bool) -> i64 {
    debug_assert!(e > last);
    if buf.is_empty() {
        append_to_empty(buf, e);
    } else {
        append_to_nonempty(buf, last, e, simulate_wah);
    }
    compress(buf, simulate_wah);
    e
}

fn append_to_empty(buf: &mut WordBuffer, e: i64) {
    let q = e / BLOCK_SIZE;
    let r = (e % BLOCK_SIZE) as u32;
    if q == 0 {
        buf.push(LITERAL_TAG | (1 << r));
    } else if q == 1 {
        buf.push(ALL_ZEROS_LITERAL);
        buf.push(LITERAL_TAG | (1 << r));
    } else {
        buf.push(word::make_run(None, false, (q - 1) as u32));
        buf.push(LITERAL_TAG | (1 << r));
    }
}

fn append_to_nonempty(buf: &mut WordBuffer, last: i64, e: i64, simulate_wah: bool) {
    let bit = (last % BLOCK_SIZE) + (e - last);
    if bit < BLOCK_SIZE {
        let idx = buf.last_word_index() as usize;
        let w = buf.word(idx);
        debug_assert!(word::is_literal(w), "last word must be a literal per invariant 2");
        buf.set(idx, w | (1 << bit));
        return;
    }

    let zero_blocks = bit / BLOCK_SIZE - 1;
    if zero_blocks == 0 {
        buf.push(ALL_ZEROS_LITERAL | (1 << (bit % BLOCK_SIZE)));
        return;
    }

    let idx = buf.last_word_index() as usize;
    let w = buf.word(idx);
    let folded = !simulate_wah
        && word::is_literal(w)
        && word::contains_single_bit(word::literal_bits(w));

    if folded {
        let f = word::literal_bits(w).trailing_zeros();
        buf.set(idx, word::make_run(Some(f), false, zero_blocks as u32));
    } else if zero_blocks == 1 {
        buf.push(ALL_ZEROS_LITERAL);
    } else {
        buf.push(word::make_run(None, false, (zero_blocks - 1) as u32));
    }
    buf.push(ALL_ZEROS_LITERAL | (1 << (bit % BLOCK_SIZE)));
}

/// Builds the word sequence for the contiguous inclusive range `[from, to]`
/// directly from its block/bit coordinates — a head literal for the
/// (possibly partial) first block, a single run word for any fully-covered
/// blocks in between, and a tail literal for the (possibly partial) last
/// block. Mirrors `append_to_nonempty`'s own block arithmetic, but never
/// visits an individual element: cost is O(1) words, not O(to - from).
pub(crate) fn build_range(from: i64, to: i64, simulate_wah: bool) -> WordBuffer {
    debug_assert!(from >= 0 && to >= from);
    let mut buf = WordBuffer::new();
    let top = BLOCK_SIZE as u32 - 1;
    let q_from = from / BLOCK_SIZE;
    let r_from = (from % BLOCK_SIZE) as u32;
    let q_to = to / BLOCK_SIZE;
    let r_to = (to % BLOCK_SIZE) as u32;

    if q_from == q_to {
        buf.push(LITERAL_TAG | block_mask(r_from, r_to));
        return buf;
    }

    if r_from > 0 {
        buf.push(LITERAL_TAG | block_mask(r_from, top));
        compress(&mut buf, simulate_wah);
    }

    let full_start = if r_from == 0 { q_from } else { q_from + 1 };
    let full_end = if r_to == top { q_to } else { q_to - 1 };
    if full_start <= full_end {
        let count = (full_end - full_start) as u32;
        buf.push(word::make_run(None, true, count));
        compress(&mut buf, simulate_wah);
    }

    if r_to != top {
        buf.push(LITERAL_TAG | block_mask(0, r_to));
        compress(&mut buf, simulate_wah);
    }

    buf
}

/// Bitmask with bits `[lo, hi]` (inclusive, 0-based within a 31-bit block)
/// set.
fn block_mask(lo: u32, hi: u32) -> u32 {
    let hi_mask = if hi >= 30 { word::LITERAL_MASK } else { (1u32 << (hi + 1)) - 1 };
    let lo_mask = !((1u32 << lo) - 1);
    hi_mask & lo_mask & word::LITERAL_MASK
}

/// Attempts to merge a trailing all-zeros/all-ones literal into the
/// preceding word, folding the pair into (or extending) a run. Only ever
/// needs to look one step back: the rest of the buffer was already at its
/// compression fixpoint before this literal was written.
pub(crate) fn compress(buf: &mut WordBuffer, simulate_wah: bool) {
    if buf.last_word_index() <= 0 {
        return;
    }
    let last_idx = buf.last_word_index() as usize;
    let w = buf.word(last_idx);
    if !word::is_literal(w) {
        return;
    }
    let bits = word::literal_bits(w);
    let kind_one = if bits == 0 {
        false
    } else if bits == word::LITERAL_MASK {
        true
    } else {
        return;
    };

    let prev_idx = last_idx - 1;
    let p = buf.word(prev_idx);

    if !word::is_literal(p) {
        if word::is_one_run(p) == kind_one {
            let c = word::run_count(p);
            if c < word::MAX_RUN_COUNT {
                let f = word::flip_bit(p);
                let flip = if f < 0 { None } else { Some(f as u32) };
                buf.set(prev_idx, word::make_run(flip, kind_one, c + 1));
                buf.pop();
            }
        }
        return;
    }

    let p_bits = word::literal_bits(p);
    let b = if kind_one { !p_bits & word::LITERAL_MASK } else { p_bits };
    if b == 0 {
        buf.set(prev_idx, word::make_run(None, kind_one, 1));
        buf.pop();
    } else if !simulate_wah && word::contains_single_bit(b) {
        let f = b.trailing_zeros();
        buf.set(prev_idx, word::make_run(Some(f), kind_one, 1));
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn s1_thirty_one_consecutive_elements_fold_to_one_run() {
        let mut buf = WordBuffer::new();
        let mut last = -1i64;
        for e in 0..31 {
            last = append(&mut buf, last, e, false);
        }
        assert_eq!(buf.len_words(), 1);
        let w = buf.word(0);
        assert!(word::is_one_run(w));
        assert_eq!(word::run_count(w), 0);
        assert_eq!(last, 30);
    }

    #[test]
    fn s2_sparse_pair_layout() {
        let mut buf = WordBuffer::new();
        let mut last = -1i64;
        last = append(&mut buf, last, 5, false);
        last = append(&mut buf, last, 36, false);
        assert_eq!(buf.len_words(), 2);
        assert!(word::is_zero_run(buf.word(0)));
        assert_eq!(word::flip_bit(buf.word(0)), 5);
        assert_eq!(word::run_count(buf.word(0)), 0);
        assert_eq!(buf.word(1), LITERAL_TAG | (1 << 5));
        assert_eq!(last, 36);
    }

    #[test]
    fn build_range_matches_incremental_append_within_one_block() {
        let direct = build_range(3, 9, false);
        let mut incremental = WordBuffer::new();
        let mut last = -1i64;
        for e in 3..=9 {
            last = append(&mut incremental, last, e, false);
        }
        let _ = last;
        assert_eq!(direct.as_slice(), incremental.as_slice());
    }

    #[test]
    fn build_range_spans_many_blocks_without_materializing_elements() {
        let buf = build_range(5, 500_000_000, false);
        // A 500M-element range folds into a handful of words, never one
        // word per element.
        assert!(buf.len_words() <= 4);
        let expected_blocks = 500_000_000 / BLOCK_SIZE - 5 / BLOCK_SIZE + 1;
        let total_span: i64 = (0..buf.len_words()).map(|i| word::block_span(buf.word(i))).sum();
        assert_eq!(total_span, expected_blocks);
    }

    #[test]
    fn build_range_within_single_block() {
        let buf = build_range(2, 5, false);
        assert_eq!(buf.len_words(), 1);
        assert_eq!(word::literal_bits(buf.word(0)), 0b111100);
    }

    #[test]
    fn compression_fixpoint_after_each_append() {
        let mut buf = WordBuffer::new();
        let mut last = -1i64;
        for e in [0i64, 1, 2, 62, 63, 64] {
            last = append(&mut buf, last, e, false);
        }
        // Last word must never be an all-zeros literal or a zero-run.
        let tail = buf.word(buf.last_word_index() as usize);
        assert!(word::is_literal(tail) && word::literal_bits(tail) != 0 || word::is_one_run(tail));
        assert_eq!(last, 64);
    }
}
