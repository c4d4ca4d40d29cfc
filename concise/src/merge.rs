//! The dual-cursor merge engine: combines two word streams under a bitwise
//! operator without ever decompressing either operand. Runs of identical
//! plain blocks on both sides are skipped in bulk instead of being visited
//! block by block.

use crate::append;
use crate::buffer::WordBuffer;
use crate::cursor::WordCursor;
use crate::word::{self, ALL_ONES_LITERAL, ALL_ZEROS_LITERAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    And,
    Or,
    Xor,
    AndNot,
}

pub(crate) fn merge(a: &[u32], b: &[u32], op: BoolOp, simulate_wah: bool) -> WordBuffer {
    if a.is_empty() || b.is_empty() {
        return merge_with_empty(a, b, op);
    }

    let mut out = WordBuffer::with_capacity(a.len() + b.len() + 3);
    let mut ca = WordCursor::new(a);
    let mut cb = WordCursor::new(b);

    while !ca.is_done() && !cb.is_done() {
        let pa = ca.plain_blocks_available();
        let pb = cb.plain_blocks_available();
        if pa > 0 && pb > 0 {
            let kind_one = plain_op_result(op, ca.current_literal(), cb.current_literal());
            let skip = pa.min(pb);
            push_run(&mut out, kind_one, skip, simulate_wah);
            ca.skip_plain_blocks(skip);
            cb.skip_plain_blocks(skip);
        } else {
            let lit = op_literal(op, ca.current_literal(), cb.current_literal());
            out.push(lit);
            append::compress(&mut out, simulate_wah);
            ca.advance();
            cb.advance();
        }
    }

    match op {
        BoolOp::Or | BoolOp::Xor => {
            copy_tail(&mut out, &mut ca, simulate_wah);
            copy_tail(&mut out, &mut cb, simulate_wah);
        }
        BoolOp::AndNot => copy_tail(&mut out, &mut ca, simulate_wah),
        BoolOp::And => {}
    }

    trim_trailing_zeros(&mut out);
    out
}

fn merge_with_empty(a: &[u32], b: &[u32], op: BoolOp) -> WordBuffer {
    let mut out = WordBuffer::new();
    let words: &[u32] = match op {
        BoolOp::And => &[],
        BoolOp::Or | BoolOp::Xor => if a.is_empty() { b } else { a },
        BoolOp::AndNot => a,
    };
    for &w in words {
        out.push(w);
    }
    out
}

fn op_literal(op: BoolOp, a: u32, b: u32) -> u32 {
    let ab = word::literal_bits(a);
    let bb = word::literal_bits(b);
    let bits = match op {
        BoolOp::And => ab & bb,
        BoolOp::Or => ab | bb,
        BoolOp::Xor => ab ^ bb,
        BoolOp::AndNot => ab & !bb,
    };
    word::LITERAL_TAG | (bits & word::LITERAL_MASK)
}

fn plain_op_result(op: BoolOp, a_lit: u32, b_lit: u32) -> bool {
    let a_one = a_lit == ALL_ONES_LITERAL;
    let b_one = b_lit == ALL_ONES_LITERAL;
    match op {
        BoolOp::And => a_one && b_one,
        BoolOp::Or => a_one || b_one,
        BoolOp::Xor => a_one ^ b_one,
        BoolOp::AndNot => a_one && !b_one,
    }
}

/// Appends `span` consecutive blocks all equal to `kind_one` (all-ones if
/// true, all-zeros otherwise), folding into a run word directly rather than
/// writing `span` individual literals.
fn push_run(out: &mut WordBuffer, kind_one: bool, span: i64, simulate_wah: bool) {
    debug_assert!(span >= 1);
    if span == 1 {
        out.push(if kind_one { ALL_ONES_LITERAL } else { ALL_ZEROS_LITERAL });
    } else {
        out.push(word::make_run(None, kind_one, (span - 1) as u32));
    }
    append::compress(out, simulate_wah);
}

fn copy_tail(out: &mut WordBuffer, cursor: &mut WordCursor<'_>, simulate_wah: bool) {
    while !cursor.is_done() {
        let pa = cursor.plain_blocks_available();
        if pa > 0 {
            let kind_one = cursor.current_literal() == ALL_ONES_LITERAL;
            push_run(out, kind_one, pa, simulate_wah);
            cursor.skip_plain_blocks(pa);
        } else {
            out.push(cursor.current_literal());
            append::compress(out, simulate_wah);
            cursor.advance();
        }
    }
}

/// Drops a trailing all-zeros literal or zero-run, keeping only its flip bit
/// (if any) as a one-element literal, so the buffer always ends on a
/// literal carrying at least one set bit or a one-run (invariants 2 and 6).
pub(crate) fn trim_trailing_zeros(out: &mut WordBuffer) {
    loop {
        if out.is_empty() {
            return;
        }
        let idx = out.last_word_index() as usize;
        let w = out.word(idx);
        if word::is_literal(w) {
            if word::literal_bits(w) == 0 {
                out.pop();
                continue;
            }
            return;
        }
        if word::is_zero_run(w) {
            let f = word::flip_bit(w);
            if f < 0 {
                out.pop();
                continue;
            }
            out.set(idx, word::LITERAL_TAG | (1 << f));
            return;
        }
        return;
    }
}

/// Cardinality of `AND(a, b)` without materialising the result.
pub(crate) fn intersection_size(a: &[u32], b: &[u32]) -> i64 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut ca = WordCursor::new(a);
    let mut cb = WordCursor::new(b);
    let mut total = 0i64;
    while !ca.is_done() && !cb.is_done() {
        let pa = ca.plain_blocks_available();
        let pb = cb.plain_blocks_available();
        if pa > 0 && pb > 0 {
            let both_one = ca.current_literal() == ALL_ONES_LITERAL && cb.current_literal() == ALL_ONES_LITERAL;
            let skip = pa.min(pb);
            if both_one {
                total += skip * word::BLOCK_SIZE;
            }
            ca.skip_plain_blocks(skip);
            cb.skip_plain_blocks(skip);
        } else {
            let bits = word::literal_bits(ca.current_literal()) & word::literal_bits(cb.current_literal());
            total += bits.count_ones() as i64;
            ca.advance();
            cb.advance();
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::append as append_elem;
    use test_log::test;

    fn build(elems: &[i64]) -> WordBuffer {
        let mut buf = WordBuffer::new();
        let mut last = -1i64;
        for &e in elems {
            last = append_elem(&mut buf, last, e, false);
        }
        let _ = last;
        buf
    }

    fn elements(words: &[u32]) -> Vec<i64> {
        let mut out = Vec::new();
        let mut base = 0i64;
        for &w in words {
            if word::is_literal(w) {
                let bits = word::literal_bits(w);
                for b in 0..31 {
                    if bits & (1 << b) != 0 {
                        out.push(base + b);
                    }
                }
                base += 31;
            } else {
                let span = word::block_span(w);
                let f = word::flip_bit(w);
                if f >= 0 {
                    let bit = base + f as i64;
                    if word::is_one_run(w) {
                        // every position in the run is set except `bit`
                        for blk in 0..span {
                            for b in 0..31 {
                                let pos = base + blk * 31 + b;
                                if pos != bit {
                                    out.push(pos);
                                }
                            }
                        }
                        base += span * 31;
                        continue;
                    } else {
                        out.push(bit);
                    }
                } else if word::is_one_run(w) {
                    for blk in 0..span {
                        for b in 0..31 {
                            out.push(base + blk * 31 + b);
                        }
                    }
                }
                base += span * 31;
            }
        }
        out
    }

    #[test]
    fn s3_scenario() {
        let a = build(&[3, 5]);
        let b = build(&[2, 3, 4, 10, 11, 20, 40]);

        let inter = merge(a.as_slice(), b.as_slice(), BoolOp::And, false);
        assert_eq!(elements(inter.as_slice()), vec![3]);

        let union = merge(a.as_slice(), b.as_slice(), BoolOp::Or, false);
        assert_eq!(elements(union.as_slice()), vec![2, 3, 4, 5, 10, 11, 20, 40]);

        let diff = merge(b.as_slice(), a.as_slice(), BoolOp::AndNot, false);
        assert_eq!(elements(diff.as_slice()), vec![2, 4, 10, 11, 20, 40]);

        let xor = merge(a.as_slice(), b.as_slice(), BoolOp::Xor, false);
        assert_eq!(elements(xor.as_slice()), vec![2, 4, 5, 10, 11, 20, 40]);
    }

    #[test]
    fn union_with_long_runs_bulk_skips() {
        let a = build(&(0..1000).collect::<Vec<_>>());
        let b = build(&[2000]);
        let u = merge(a.as_slice(), b.as_slice(), BoolOp::Or, false);
        let mut expected: Vec<i64> = (0..1000).collect();
        expected.push(2000);
        assert_eq!(elements(u.as_slice()), expected);
    }

    #[test]
    fn intersection_with_empty_is_empty() {
        let a = build(&[1, 2, 3]);
        let b = WordBuffer::new();
        let r = merge(a.as_slice(), b.as_slice(), BoolOp::And, false);
        assert!(r.is_empty());
    }
}
