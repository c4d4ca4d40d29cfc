//! Element-level forward and reverse iterators. Both detect structural
//! modification of the owning set via a snapshotted `mod_count` and fail
//! fast with [`ConciseError::ConcurrentModification`] rather than risk
//! returning garbage.

use crate::cursor::{RevWordCursor, WordCursor};
use crate::word::{self, ALL_ZEROS_LITERAL, BLOCK_SIZE};
use concise_base::{ConciseError, Result};

/// Ascending element iterator.
pub struct Iter<'a> {
    mod_count: u64,
    current_mod_count: &'a std::cell::Cell<u64>,
    cursor: WordCursor<'a>,
    base: i64,
    next_bit: u32,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(words: &'a [u32], mod_count: u64, current_mod_count: &'a std::cell::Cell<u64>) -> Self {
        Iter { mod_count, current_mod_count, cursor: WordCursor::new(words), base: 0, next_bit: 0 }
    }

    fn check_unmodified(&self) -> Result<()> {
        if self.mod_count != self.current_mod_count.get() {
            return Err(ConciseError::concurrent_modification());
        }
        Ok(())
    }

    /// Advances the cursor so the next yielded element is the smallest
    /// member `>= e`. A no-op if the cursor has already passed `e`.
    pub fn skip_all_before(&mut self, e: i64) -> Result<()> {
        self.check_unmodified()?;
        let target_block = e.max(0) / BLOCK_SIZE;
        let target_bit = (e.max(0) % BLOCK_SIZE) as u32;
        loop {
            if self.cursor.is_done() {
                return Ok(());
            }
            let cur_block = self.base / BLOCK_SIZE;
            if cur_block < target_block {
                let blocks_to_skip = target_block - cur_block;
                let avail = self.cursor.plain_blocks_available();
                if avail > 0 {
                    let skip = avail.min(blocks_to_skip);
                    self.cursor.skip_plain_blocks(skip);
                    self.base += skip * BLOCK_SIZE;
                } else {
                    self.cursor.advance();
                    self.base += BLOCK_SIZE;
                }
                self.next_bit = 0;
            } else if cur_block == target_block {
                if self.next_bit < target_bit {
                    self.next_bit = target_bit;
                }
                return Ok(());
            } else {
                return Ok(());
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.check_unmodified() {
            return Some(Err(e));
        }
        loop {
            if self.cursor.is_done() {
                return None;
            }
            let lit = self.cursor.current_literal();
            let bits = word::literal_bits(lit);
            let mask = if self.next_bit >= 31 { 0 } else { !((1u32 << self.next_bit) - 1) };
            let masked = bits & mask & word::LITERAL_MASK;
            if masked != 0 {
                let b = masked.trailing_zeros();
                self.next_bit = b + 1;
                return Some(Ok(self.base + b as i64));
            }
            // No set bit remains in this block; skip ahead, in bulk through
            // homogeneous all-zero runs when possible.
            let avail = self.cursor.plain_blocks_available();
            if avail > 1 && lit == ALL_ZEROS_LITERAL {
                self.cursor.skip_plain_blocks(avail);
                self.base += avail * BLOCK_SIZE;
            } else {
                self.cursor.advance();
                self.base += BLOCK_SIZE;
            }
            self.next_bit = 0;
        }
    }
}

/// Descending element iterator.
pub struct RevIter<'a> {
    mod_count: u64,
    current_mod_count: &'a std::cell::Cell<u64>,
    cursor: RevWordCursor<'a>,
    /// Absolute position of the highest bit of the current block.
    top: i64,
    /// Next bit to check, scanning downward from 30.
    next_bit: i32,
}

impl<'a> RevIter<'a> {
    pub(crate) fn new(words: &'a [u32], last: i64, mod_count: u64, current_mod_count: &'a std::cell::Cell<u64>) -> Self {
        let cursor = RevWordCursor::new(words);
        let top = if words.is_empty() { -1 } else { (last / BLOCK_SIZE) * BLOCK_SIZE };
        RevIter { mod_count, current_mod_count, cursor, top, next_bit: 30 }
    }

    fn check_unmodified(&self) -> Result<()> {
        if self.mod_count != self.current_mod_count.get() {
            return Err(ConciseError::concurrent_modification());
        }
        Ok(())
    }
}

impl<'a> Iterator for RevIter<'a> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.check_unmodified() {
            return Some(Err(e));
        }
        loop {
            if self.cursor.is_done() {
                return None;
            }
            let lit = word::literal_bits(self.cursor.current_literal());
            while self.next_bit >= 0 {
                let b = self.next_bit as u32;
                self.next_bit -= 1;
                if lit & (1 << b) != 0 {
                    return Some(Ok(self.top + b as i64));
                }
            }
            let avail = self.cursor.plain_blocks_available();
            if avail > 1 {
                self.cursor.skip_plain_blocks(avail);
                self.top -= avail * BLOCK_SIZE;
            } else {
                self.cursor.advance();
                self.top -= BLOCK_SIZE;
            }
            self.next_bit = 30;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::append;
    use crate::buffer::WordBuffer;
    use test_log::test;

    fn build(elems: &[i64]) -> (WordBuffer, i64) {
        let mut buf = WordBuffer::new();
        let mut last = -1i64;
        for &e in elems {
            last = append(&mut buf, last, e, false);
        }
        (buf, last)
    }

    #[test]
    fn forward_yields_in_order() {
        let (buf, _last) = build(&[0, 5, 31, 62, 1000]);
        let mc = std::cell::Cell::new(0u64);
        let it = Iter::new(buf.as_slice(), 0, &mc);
        let got: Vec<i64> = it.map(|r| r.unwrap()).collect();
        assert_eq!(got, vec![0, 5, 31, 62, 1000]);
    }

    #[test]
    fn reverse_yields_in_order() {
        let (buf, last) = build(&[0, 5, 31, 62, 1000]);
        let mc = std::cell::Cell::new(0u64);
        let it = RevIter::new(buf.as_slice(), last, 0, &mc);
        let got: Vec<i64> = it.map(|r| r.unwrap()).collect();
        assert_eq!(got, vec![1000, 62, 31, 5, 0]);
    }

    #[test]
    fn skip_all_before_lands_on_smallest_at_or_above() {
        let (buf, _last) = build(&[0, 5, 31, 62, 1000]);
        let mc = std::cell::Cell::new(0u64);
        let mut it = Iter::new(buf.as_slice(), 0, &mc);
        it.skip_all_before(32).unwrap();
        let got: Vec<i64> = it.map(|r| r.unwrap()).collect();
        assert_eq!(got, vec![62, 1000]);
    }

    #[test]
    fn concurrent_modification_is_detected() {
        let (buf, _last) = build(&[1, 2, 3]);
        let mc = std::cell::Cell::new(0u64);
        let mut it = Iter::new(buf.as_slice(), 0, &mc);
        assert_eq!(it.next().unwrap().unwrap(), 1);
        mc.set(1);
        assert!(it.next().unwrap().is_err());
    }
}
