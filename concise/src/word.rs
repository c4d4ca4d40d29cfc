//! Word-level codec for the compressed bitmap representation.
//!
//! Every word is a plain `u32`. The top bit distinguishes a *literal* word,
//! whose low 31 bits are a raw bitmask for one 31-element block, from a *run*
//! word, which packs a run kind, an optional "flip" bit position, and a run
//! count into the remaining 31 bits. See the module-level crate docs for the
//! full layout table.

pub(crate) const LITERAL_TAG: u32 = 0x8000_0000;
pub(crate) const ONE_RUN_TAG: u32 = 0x4000_0000;
pub(crate) const LITERAL_MASK: u32 = 0x7FFF_FFFF;
pub(crate) const RUN_COUNT_MASK: u32 = 0x01FF_FFFF;
pub(crate) const FLIP_SHIFT: u32 = 25;
pub(crate) const FLIP_FIELD_MASK: u32 = 0x1F << FLIP_SHIFT;

pub(crate) const ALL_ZEROS_LITERAL: u32 = LITERAL_TAG;
pub(crate) const ALL_ONES_LITERAL: u32 = LITERAL_TAG | LITERAL_MASK;

/// Number of element positions carried by one block / one literal word.
pub(crate) const BLOCK_SIZE: i64 = 31;

/// Largest run count a single run word can hold (25 bits).
pub(crate) const MAX_RUN_COUNT: u32 = RUN_COUNT_MASK;

/// Largest element a set can contain: `31 * 2^25 + 30`.
pub const MAX_ELEMENT: i64 = BLOCK_SIZE * (1i64 << 25) + 30;

#[inline(always)]
pub(crate) fn is_literal(w: u32) -> bool {
    w & LITERAL_TAG != 0
}

#[inline(always)]
pub(crate) fn is_one_run(w: u32) -> bool {
    !is_literal(w) && w & ONE_RUN_TAG != 0
}

#[inline(always)]
pub(crate) fn is_zero_run(w: u32) -> bool {
    !is_literal(w) && w & ONE_RUN_TAG == 0
}

/// Run count `c`: the number of *additional* blocks beyond the implicit
/// first block. Only meaningful for run words.
#[inline(always)]
pub(crate) fn run_count(w: u32) -> u32 {
    w & RUN_COUNT_MASK
}

/// Total blocks spanned by a word: 1 for a literal, `c + 1` for a run.
#[inline(always)]
pub(crate) fn block_span(w: u32) -> i64 {
    if is_literal(w) {
        1
    } else {
        run_count(w) as i64 + 1
    }
}

/// Position of the flip bit within the first block, or `-1` if the run
/// carries no exceptional bit. Meaningless for literals.
#[inline(always)]
pub(crate) fn flip_bit(w: u32) -> i32 {
    let f = (w & FLIP_FIELD_MASK) >> FLIP_SHIFT;
    if f == 0 {
        -1
    } else {
        (f - 1) as i32
    }
}

#[inline(always)]
pub(crate) fn is_run_without_flip(w: u32) -> bool {
    !is_literal(w) && flip_bit(w) < 0
}

/// The literal value of a run word's first block (flip bit included), or the
/// word itself if it is already a literal.
#[inline(always)]
pub(crate) fn literal_of(w: u32) -> u32 {
    if is_literal(w) {
        return w;
    }
    let base = if is_one_run(w) { ALL_ONES_LITERAL } else { ALL_ZEROS_LITERAL };
    let f = flip_bit(w);
    if f < 0 {
        return base;
    }
    let bit = 1u32 << f;
    if is_one_run(w) {
        base & !bit
    } else {
        base | bit
    }
}

/// The literal value of a run word's *trailing* block: the plain all-zeros
/// or all-ones block for a multi-block run, or `literal_of` for a
/// single-block run (where first block and trailing block coincide).
#[inline(always)]
pub(crate) fn reverse_literal_of(w: u32) -> u32 {
    if is_literal(w) || run_count(w) == 0 {
        return literal_of(w);
    }
    if is_one_run(w) {
        ALL_ONES_LITERAL
    } else {
        ALL_ZEROS_LITERAL
    }
}

/// Assembles a run word. `flip` is the 0-based bit position of the
/// exceptional bit within the first block, or `None` for a plain run.
#[inline]
pub(crate) fn make_run(flip: Option<u32>, one: bool, count: u32) -> u32 {
    debug_assert!(count <= MAX_RUN_COUNT);
    debug_assert!(flip.map_or(true, |f| f < 31));
    let kind = if one { ONE_RUN_TAG } else { 0 };
    let f_field = flip.map_or(0, |f| (f + 1) << FLIP_SHIFT);
    kind | f_field | count
}

#[inline(always)]
pub(crate) fn literal_bits(w: u32) -> u32 {
    w & LITERAL_MASK
}

#[inline(always)]
pub(crate) fn literal_popcount(w: u32) -> u32 {
    literal_bits(w).count_ones()
}

#[inline(always)]
pub(crate) fn contains_single_bit(bits: u32) -> bool {
    bits != 0 && (bits & (bits.wrapping_sub(1))) == 0
}

/// Number of set bits the word contributes to the set's cardinality.
#[inline]
pub(crate) fn word_popcount(w: u32) -> i64 {
    if is_literal(w) {
        literal_popcount(w) as i64
    } else {
        let span = block_span(w);
        let dense = if is_one_run(w) { span * BLOCK_SIZE } else { 0 };
        if flip_bit(w) >= 0 {
            if is_one_run(w) { dense - 1 } else { dense + 1 }
        } else {
            dense
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn literal_roundtrip() {
        let w = LITERAL_TAG | 0b101;
        assert!(is_literal(w));
        assert_eq!(literal_of(w), w);
        assert_eq!(literal_bits(w), 0b101);
        assert_eq!(literal_popcount(w), 2);
    }

    #[test]
    fn zero_run_no_flip() {
        let w = make_run(None, false, 5);
        assert!(is_zero_run(w));
        assert!(!is_literal(w));
        assert_eq!(run_count(w), 5);
        assert_eq!(block_span(w), 6);
        assert_eq!(flip_bit(w), -1);
        assert_eq!(literal_of(w), ALL_ZEROS_LITERAL);
        assert_eq!(reverse_literal_of(w), ALL_ZEROS_LITERAL);
    }

    #[test]
    fn zero_run_with_flip() {
        let w = make_run(Some(6), false, 2);
        assert_eq!(flip_bit(w), 6);
        assert_eq!(literal_of(w), ALL_ZEROS_LITERAL | (1 << 6));
        assert_eq!(reverse_literal_of(w), ALL_ZEROS_LITERAL);
    }

    #[test]
    fn one_run_with_flip_single_block() {
        let w = make_run(Some(3), true, 0);
        assert!(is_one_run(w));
        assert_eq!(literal_of(w), ALL_ONES_LITERAL & !(1 << 3));
        assert_eq!(reverse_literal_of(w), literal_of(w));
    }

    #[test]
    fn single_bit_detection() {
        assert!(contains_single_bit(1));
        assert!(contains_single_bit(1 << 17));
        assert!(!contains_single_bit(0));
        assert!(!contains_single_bit(0b11));
    }

    #[test]
    fn max_element_matches_spec() {
        assert_eq!(MAX_ELEMENT, 1_040_187_422);
    }
}
