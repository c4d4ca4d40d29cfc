//! Positional access: `get(i)` (the i-th smallest element) and
//! `index_of(e)` (how many elements precede `e`).

use crate::word::{self, BLOCK_SIZE};
use concise_base::{ConciseError, Result};

pub(crate) fn get(words: &[u32], size: i64, i: i64) -> Result<i64> {
    if i < 0 || i >= size {
        return Err(ConciseError::index_out_of_range(i, size));
    }
    let mut remaining = i;
    let mut base = 0i64;
    for &w in words {
        let pc = word::word_popcount(w);
        if remaining < pc {
            return Ok(base + position_within_word(w, remaining));
        }
        remaining -= pc;
        base += word::block_span(w) * BLOCK_SIZE;
    }
    unreachable!("cached size inconsistent with word contents")
}

fn position_within_word(w: u32, i: i64) -> i64 {
    if word::is_literal(w) {
        nth_set_bit(word::literal_bits(w), i) as i64
    } else if word::is_zero_run(w) {
        debug_assert_eq!(i, 0);
        word::flip_bit(w) as i64
    } else {
        let f = word::flip_bit(w);
        if f < 0 || i < f as i64 {
            i
        } else {
            i + 1
        }
    }
}

fn nth_set_bit(bits: u32, n: i64) -> u32 {
    let mut remaining = n;
    let mut bits = bits;
    loop {
        let b = bits.trailing_zeros();
        if remaining == 0 {
            return b;
        }
        remaining -= 1;
        bits &= bits - 1;
    }
}

pub(crate) fn index_of(words: &[u32], e: i64) -> Result<i64> {
    if !(0..=word::MAX_ELEMENT).contains(&e) {
        return Err(ConciseError::out_of_range(e, word::MAX_ELEMENT));
    }
    let target_block = e / BLOCK_SIZE;
    let target_bit = (e % BLOCK_SIZE) as u32;
    let mut count = 0i64;
    let mut block = 0i64;
    for &w in words {
        let span = word::block_span(w);
        if target_block < block + span {
            count += count_set_below(w, target_block - block, target_bit);
            return Ok(count);
        }
        count += word::word_popcount(w);
        block += span;
    }
    Ok(count)
}

fn count_set_below(w: u32, block_offset: i64, bit: u32) -> i64 {
    if word::is_literal(w) {
        let mask = (1u32 << bit) - 1;
        return (word::literal_bits(w) & mask).count_ones() as i64;
    }
    let flip = word::flip_bit(w);
    let first_block = block_offset == 0;
    let flip_precedes = first_block && flip >= 0 && (flip as u32) < bit;
    if word::is_zero_run(w) {
        if flip_precedes { 1 } else { 0 }
    } else {
        let mut c = bit as i64;
        if flip_precedes {
            c -= 1;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::append;
    use crate::buffer::WordBuffer;
    use crate::scan::compute_size;
    use test_log::test;

    fn build(elems: &[i64]) -> WordBuffer {
        let mut buf = WordBuffer::new();
        let mut last = -1i64;
        for &e in elems {
            last = append(&mut buf, last, e, false);
        }
        let _ = last;
        buf
    }

    #[test]
    fn get_matches_reference_order() {
        let elems = [0i64, 5, 31, 62, 1000];
        let buf = build(&elems);
        let size = compute_size(buf.as_slice());
        for (i, &e) in elems.iter().enumerate() {
            assert_eq!(get(buf.as_slice(), size, i as i64).unwrap(), e);
        }
        assert!(get(buf.as_slice(), size, size).is_err());
    }

    #[test]
    fn index_of_counts_predecessors() {
        let elems = [0i64, 5, 31, 62, 1000];
        let buf = build(&elems);
        for (i, &e) in elems.iter().enumerate() {
            assert_eq!(index_of(buf.as_slice(), e).unwrap(), i as i64);
        }
    }

    #[test]
    fn get_and_index_of_over_dense_run() {
        let buf = build(&(0..100).collect::<Vec<_>>());
        let size = compute_size(buf.as_slice());
        assert_eq!(size, 100);
        assert_eq!(get(buf.as_slice(), size, 50).unwrap(), 50);
        assert_eq!(index_of(buf.as_slice(), 50).unwrap(), 50);
    }
}
