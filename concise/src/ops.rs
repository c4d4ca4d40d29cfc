//! Mutation fast paths (`add`, `remove`, `contains`) and in-place
//! complement. Each mutation either resolves via a cheap literal-word
//! bit-flip or falls back to a single-element merge through [`crate::merge`].

use crate::buffer::WordBuffer;
use crate::cursor::WordCursor;
use crate::word::{self, BLOCK_SIZE};

/// Set-bit threshold below which toggling a bit in place is preferred over
/// folding a new run: a literal with few enough set bits can never become
/// all-ones by adding one more bit, so it stays a literal and no
/// re-compression with neighbours is triggered.
const ADD_FAST_PATH_MAX_BITS: u32 = BLOCK_SIZE as u32 - 3;
/// Clearing a bit in place is only safe while at least 2 bits remain set
/// afterward — dropping to a single bit or to zero would leave the literal
/// a candidate for folding into its neighbour, which only the merge
/// fallback path re-triggers compression for.
const REMOVE_FAST_PATH_MAX_BITS: u32 = 2;

pub(crate) enum Location {
    /// The element falls inside the literal at `word_index`, bit `bit`.
    Literal { word_index: usize, bit: u32 },
    /// The element falls inside a run word, at `word_index`. `bit` is the
    /// position within its own 31-bit block; `block_offset` is how many
    /// blocks into the run that block is (0 = the run's first, flip-bearing
    /// block).
    Run { word_index: usize, bit: u32, block_offset: i64 },
    /// Past the end of the buffer entirely.
    PastEnd,
}

/// Locates the word (and bit within its containing block) covering `e`,
/// walking blocks left to right. `words` must be non-empty.
pub(crate) fn locate(words: &[u32], e: i64) -> Location {
    let target_block = e / BLOCK_SIZE;
    let bit = (e % BLOCK_SIZE) as u32;
    let mut block = 0i64;
    for (i, &w) in words.iter().enumerate() {
        let span = word::block_span(w);
        if target_block < block + span {
            return if word::is_literal(w) {
                Location::Literal { word_index: i, bit }
            } else {
                Location::Run { word_index: i, bit, block_offset: target_block - block }
            };
        }
        block += span;
    }
    Location::PastEnd
}

/// True if `e` (known to lie within the set's current range) is a member.
pub(crate) fn contains_in_range(words: &[u32], e: i64) -> bool {
    match locate(words, e) {
        Location::Literal { word_index, bit } => word::literal_bits(words[word_index]) & (1 << bit) != 0,
        Location::Run { word_index, bit, block_offset } => {
            let w = words[word_index];
            let base_set = word::is_one_run(w);
            if block_offset == 0 && word::flip_bit(w) == bit as i32 {
                !base_set
            } else {
                base_set
            }
        }
        Location::PastEnd => false,
    }
}

pub(crate) enum FastPathResult {
    /// Bit toggled in place; `changed` reports whether the set actually
    /// differed before the call.
    Done { changed: bool },
    /// The element sits inside a run or would require re-compression; the
    /// caller must fall back to a single-element merge.
    Fallback,
}

/// Attempts to set bit `e` in place. `e` must already be known to lie
/// within `[0, last]` (the append path handles `e > last`).
pub(crate) fn try_add_in_place(buf: &mut WordBuffer, e: i64) -> FastPathResult {
    let words = buf.as_slice();
    match locate(words, e) {
        Location::Literal { word_index, bit } => {
            let w = words[word_index];
            let bits = word::literal_bits(w);
            if bits & (1 << bit) != 0 {
                return FastPathResult::Done { changed: false };
            }
            if bits.count_ones() <= ADD_FAST_PATH_MAX_BITS {
                buf.set(word_index, w | (1 << bit));
                FastPathResult::Done { changed: true }
            } else {
                FastPathResult::Fallback
            }
        }
        Location::Run { .. } | Location::PastEnd => FastPathResult::Fallback,
    }
}

/// Attempts to clear bit `e` in place.
pub(crate) fn try_remove_in_place(buf: &mut WordBuffer, e: i64) -> FastPathResult {
    let words = buf.as_slice();
    match locate(words, e) {
        Location::Literal { word_index, bit } => {
            let w = words[word_index];
            let bits = word::literal_bits(w);
            if bits & (1 << bit) == 0 {
                return FastPathResult::Done { changed: false };
            }
            let count = bits.count_ones();
            if count >= 2 && count <= REMOVE_FAST_PATH_MAX_BITS + 1 {
                buf.set(word_index, word::LITERAL_TAG | (bits & !(1 << bit)));
                FastPathResult::Done { changed: true }
            } else {
                FastPathResult::Fallback
            }
        }
        Location::Run { .. } => FastPathResult::Fallback,
        Location::PastEnd => FastPathResult::Done { changed: false },
    }
}

/// In-place complement: negate every literal, flip the kind of every run,
/// then clear synthetic bits past the old `last` and trim. Returns the new
/// `last`.
///
/// By invariant 2 the buffer's last word is either a literal whose highest
/// set bit is exactly `old_last`, or a one-run whose last block's top bit
/// is exactly `old_last`. Only the literal case can leave unset bits above
/// `old_last % 31` within the same block that would otherwise turn into
/// spurious members once flipped; a one-run's final block always extends
/// exactly to a block boundary, so it never needs masking.
pub(crate) fn complement(buf: &mut WordBuffer, old_last: i64) -> i64 {
    if buf.is_empty() {
        return -1;
    }
    let n = buf.len_words();
    for i in 0..n {
        let w = buf.word(i);
        let flipped = if word::is_literal(w) {
            word::LITERAL_TAG | (!w & word::LITERAL_MASK)
        } else {
            w ^ word::ONE_RUN_TAG
        };
        buf.set(i, flipped);
    }

    let last_word_idx = buf.last_word_index() as usize;
    let w = buf.word(last_word_idx);
    if word::is_literal(w) {
        let keep_bits = (old_last % BLOCK_SIZE) as u32 + 1;
        let mask = if keep_bits >= 31 { word::LITERAL_MASK } else { (1u32 << keep_bits) - 1 };
        buf.set(last_word_idx, word::LITERAL_TAG | (w & mask));
    } else {
        debug_assert_eq!(old_last % BLOCK_SIZE, BLOCK_SIZE - 1);
    }

    crate::merge::trim_trailing_zeros(buf);
    crate::scan::compute_last(buf.as_slice())
}
