//! `ConciseSet`: the public compressed integer set. Everything here is a
//! thin dispatcher over the lower modules — this file owns no bit-twiddling
//! of its own, only the bookkeeping (`last`, cached `size`, `mod_count`) that
//! ties them together into one coherent value.

use std::cell::Cell;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::access;
use crate::append;
use crate::buffer::WordBuffer;
use crate::cursor::RevWordCursor;
use crate::iter::{Iter, RevIter};
use crate::merge::{self, BoolOp};
use crate::metrics::MergeMetrics;
use crate::ops;
use crate::scan;
use crate::word;
use concise_base::{ConciseError, Result};

/// A compressed, sorted set of non-negative integers in
/// `[0, ConciseSet::MAX_ELEMENT]`.
///
/// Internally the set is a sequence of 32-bit words — literal blocks or
/// run-length-encoded blocks — kept at a "compression fixpoint" after every
/// mutation: no two adjacent words could be folded into one. All algebraic
/// operations (intersection, union, difference, symmetric difference,
/// complement) work directly over this word stream, without ever expanding
/// it into a plain bitmap.
#[derive(Clone)]
pub struct ConciseSet {
    buf: WordBuffer,
    last: i64,
    size: Cell<i64>,
    mod_count: Cell<u64>,
    simulate_wah: bool,
    metrics: Option<Arc<dyn MergeMetrics>>,
}

impl ConciseSet {
    /// Largest element a set can ever contain.
    pub const MAX_ELEMENT: i64 = word::MAX_ELEMENT;

    pub fn new() -> Self {
        ConciseSet {
            buf: WordBuffer::new(),
            last: -1,
            size: Cell::new(0),
            mod_count: Cell::new(0),
            simulate_wah: false,
            metrics: None,
        }
    }

    /// A set that never folds a single remaining bit of a run into the
    /// run's flip field. Produces the same elements, at a lower compression
    /// ratio, for interoperability with consumers that only understand
    /// plain WAH runs.
    pub fn new_wah_compatible() -> Self {
        let mut s = Self::new();
        s.simulate_wah = true;
        s
    }

    /// Wires an opt-in call-counting hook into every algebra/mutation entry
    /// point on this set (and on any set derived from it via `clone`).
    pub fn with_metrics(mut self, metrics: Arc<dyn MergeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds a set from an arbitrary (unsorted, possibly duplicated)
    /// sequence of elements.
    pub fn from_elements<I: IntoIterator<Item = i64>>(elems: I) -> Result<Self> {
        let mut v: Vec<i64> = elems.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        let mut set = Self::new();
        let mut last = -1i64;
        for e in v {
            if !(0..=word::MAX_ELEMENT).contains(&e) {
                return Err(ConciseError::out_of_range(e, word::MAX_ELEMENT));
            }
            last = append::append(&mut set.buf, last, e, set.simulate_wah);
        }
        set.last = last;
        Ok(set)
    }

    pub fn singleton(e: i64) -> Result<Self> {
        Self::from_elements(std::iter::once(e))
    }

    fn from_buf(buf: WordBuffer, simulate_wah: bool, metrics: Option<Arc<dyn MergeMetrics>>) -> Self {
        let last = scan::compute_last(buf.as_slice());
        ConciseSet { buf, last, size: Cell::new(-1), mod_count: Cell::new(0), simulate_wah, metrics }
    }

    fn bump_mod_count(&mut self) {
        self.mod_count.set(self.mod_count.get().wrapping_add(1));
    }

    // ---- query ----------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Cardinality, recomputed by scanning the word buffer the first time
    /// it is asked for after a mutation and cached until the next one.
    pub fn size(&self) -> i64 {
        if self.size.get() < 0 {
            self.size.set(scan::compute_size(self.buf.as_slice()));
        }
        self.size.get()
    }

    pub fn contains(&self, e: i64) -> bool {
        if e < 0 || e > self.last {
            return false;
        }
        ops::contains_in_range(self.buf.as_slice(), e)
    }

    pub fn contains_all(&self, other: &ConciseSet) -> bool {
        if other.is_empty() {
            return true;
        }
        self.intersection_size(other) == other.size()
    }

    pub fn contains_any(&self, other: &ConciseSet) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.intersection_size(other) > 0
    }

    pub fn contains_at_least(&self, other: &ConciseSet, k: i64) -> Result<bool> {
        if k < 1 {
            return Err(ConciseError::invalid_argument("k must be at least 1"));
        }
        Ok(self.intersection_size(other) >= k)
    }

    pub fn first(&self) -> Result<i64> {
        if self.buf.is_empty() {
            return Err(ConciseError::empty_set());
        }
        self.iter().next().expect("non-empty set yields at least one element")
    }

    pub fn last(&self) -> Result<i64> {
        if self.buf.is_empty() {
            return Err(ConciseError::empty_set());
        }
        Ok(self.last)
    }

    pub fn get(&self, i: i64) -> Result<i64> {
        access::get(self.buf.as_slice(), self.size(), i)
    }

    pub fn index_of(&self, e: i64) -> Result<i64> {
        access::index_of(self.buf.as_slice(), e)
    }

    // ---- mutation ---------------------------------------------------------

    pub fn add(&mut self, e: i64) -> Result<bool> {
        if !(0..=word::MAX_ELEMENT).contains(&e) {
            return Err(ConciseError::out_of_range(e, word::MAX_ELEMENT));
        }
        let changed = if e > self.last {
            self.last = append::append(&mut self.buf, self.last, e, self.simulate_wah);
            true
        } else if ops::contains_in_range(self.buf.as_slice(), e) {
            false
        } else {
            match ops::try_add_in_place(&mut self.buf, e) {
                ops::FastPathResult::Done { changed } => changed,
                ops::FastPathResult::Fallback => {
                    let mut tmp = WordBuffer::new();
                    append::append(&mut tmp, -1, e, self.simulate_wah);
                    self.buf = merge::merge(self.buf.as_slice(), tmp.as_slice(), BoolOp::Or, self.simulate_wah);
                    true
                }
            }
        };
        if changed {
            self.size.set(-1);
            self.bump_mod_count();
        }
        if let Some(m) = &self.metrics {
            m.on_add(changed);
        }
        Ok(changed)
    }

    pub fn remove(&mut self, e: i64) -> Result<bool> {
        if !(0..=word::MAX_ELEMENT).contains(&e) {
            return Err(ConciseError::out_of_range(e, word::MAX_ELEMENT));
        }
        if self.buf.is_empty() || e > self.last {
            if let Some(m) = &self.metrics {
                m.on_remove(false);
            }
            return Ok(false);
        }
        let changed = if !ops::contains_in_range(self.buf.as_slice(), e) {
            false
        } else {
            match ops::try_remove_in_place(&mut self.buf, e) {
                ops::FastPathResult::Done { changed } => changed,
                ops::FastPathResult::Fallback => {
                    let mut tmp = WordBuffer::new();
                    append::append(&mut tmp, -1, e, self.simulate_wah);
                    self.buf = merge::merge(self.buf.as_slice(), tmp.as_slice(), BoolOp::AndNot, self.simulate_wah);
                    true
                }
            }
        };
        if changed {
            self.last = scan::compute_last(self.buf.as_slice());
            self.size.set(-1);
            self.bump_mod_count();
        }
        if let Some(m) = &self.metrics {
            m.on_remove(changed);
        }
        Ok(changed)
    }

    pub fn add_all(&mut self, other: &ConciseSet) -> bool {
        if let Some(m) = &self.metrics {
            m.on_union();
        }
        if other.is_empty() {
            return false;
        }
        let merged = merge::merge(self.buf.as_slice(), other.buf.as_slice(), BoolOp::Or, self.simulate_wah);
        let changed = merged.as_slice() != self.buf.as_slice();
        if changed {
            self.buf = merged;
            self.last = scan::compute_last(self.buf.as_slice());
            self.size.set(-1);
            self.bump_mod_count();
        }
        changed
    }

    pub fn remove_all(&mut self, other: &ConciseSet) -> bool {
        if let Some(m) = &self.metrics {
            m.on_difference();
        }
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let merged = merge::merge(self.buf.as_slice(), other.buf.as_slice(), BoolOp::AndNot, self.simulate_wah);
        let changed = merged.as_slice() != self.buf.as_slice();
        if changed {
            self.buf = merged;
            self.last = scan::compute_last(self.buf.as_slice());
            self.size.set(-1);
            self.bump_mod_count();
        }
        changed
    }

    pub fn retain_all(&mut self, other: &ConciseSet) -> bool {
        if let Some(m) = &self.metrics {
            m.on_intersection();
        }
        if self.is_empty() {
            return false;
        }
        let merged = merge::merge(self.buf.as_slice(), other.buf.as_slice(), BoolOp::And, self.simulate_wah);
        let changed = merged.as_slice() != self.buf.as_slice();
        if changed {
            self.buf = merged;
            self.last = scan::compute_last(self.buf.as_slice());
            self.size.set(-1);
            self.bump_mod_count();
        }
        changed
    }

    pub fn clear(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        self.buf.clear();
        self.last = -1;
        self.size.set(0);
        self.bump_mod_count();
    }

    pub fn flip(&mut self, e: i64) -> Result<()> {
        if !(0..=word::MAX_ELEMENT).contains(&e) {
            return Err(ConciseError::out_of_range(e, word::MAX_ELEMENT));
        }
        let mut tmp = WordBuffer::new();
        append::append(&mut tmp, -1, e, self.simulate_wah);
        self.buf = merge::merge(self.buf.as_slice(), tmp.as_slice(), BoolOp::Xor, self.simulate_wah);
        self.last = scan::compute_last(self.buf.as_slice());
        self.size.set(-1);
        self.bump_mod_count();
        if let Some(m) = &self.metrics {
            m.on_symmetric_difference();
        }
        Ok(())
    }

    /// Complements the set in place, over `[0, last]` before the call (an
    /// empty set's complement is itself the empty set).
    pub fn complement(&mut self) {
        self.last = ops::complement(&mut self.buf, self.last);
        self.size.set(-1);
        self.bump_mod_count();
    }

    pub fn fill(&mut self, from: i64, to: i64) -> Result<()> {
        self.check_range(from, to)?;
        let range_buf = append::build_range(from, to, self.simulate_wah);
        let merged = merge::merge(self.buf.as_slice(), range_buf.as_slice(), BoolOp::Or, self.simulate_wah);
        if merged.as_slice() != self.buf.as_slice() {
            self.buf = merged;
            self.last = scan::compute_last(self.buf.as_slice());
            self.size.set(-1);
            self.bump_mod_count();
        }
        Ok(())
    }

    pub fn clear_range(&mut self, from: i64, to: i64) -> Result<()> {
        self.check_range(from, to)?;
        let range_buf = append::build_range(from, to, self.simulate_wah);
        let merged = merge::merge(self.buf.as_slice(), range_buf.as_slice(), BoolOp::AndNot, self.simulate_wah);
        if merged.as_slice() != self.buf.as_slice() {
            self.buf = merged;
            self.last = scan::compute_last(self.buf.as_slice());
            self.size.set(-1);
            self.bump_mod_count();
        }
        Ok(())
    }

    fn check_range(&self, from: i64, to: i64) -> Result<()> {
        if !(0..=word::MAX_ELEMENT).contains(&from) {
            return Err(ConciseError::out_of_range(from, word::MAX_ELEMENT));
        }
        if !(0..=word::MAX_ELEMENT).contains(&to) {
            return Err(ConciseError::out_of_range(to, word::MAX_ELEMENT));
        }
        if from > to {
            return Err(ConciseError::invalid_range(from, to));
        }
        Ok(())
    }

    // ---- algebra ----------------------------------------------------------

    pub fn intersection(&self, other: &ConciseSet) -> ConciseSet {
        if let Some(m) = &self.metrics {
            m.on_intersection();
        }
        self.combine(other, BoolOp::And)
    }

    pub fn union(&self, other: &ConciseSet) -> ConciseSet {
        if let Some(m) = &self.metrics {
            m.on_union();
        }
        self.combine(other, BoolOp::Or)
    }

    pub fn difference(&self, other: &ConciseSet) -> ConciseSet {
        if let Some(m) = &self.metrics {
            m.on_difference();
        }
        self.combine(other, BoolOp::AndNot)
    }

    pub fn symmetric_difference(&self, other: &ConciseSet) -> ConciseSet {
        if let Some(m) = &self.metrics {
            m.on_symmetric_difference();
        }
        self.combine(other, BoolOp::Xor)
    }

    pub fn complemented(&self) -> ConciseSet {
        let mut c = self.clone();
        c.complement();
        c
    }

    fn combine(&self, other: &ConciseSet, op: BoolOp) -> ConciseSet {
        let buf = merge::merge(self.buf.as_slice(), other.buf.as_slice(), op, self.simulate_wah);
        Self::from_buf(buf, self.simulate_wah, self.metrics.clone())
    }

    // ---- cardinalities ------------------------------------------------

    pub fn intersection_size(&self, other: &ConciseSet) -> i64 {
        merge::intersection_size(self.buf.as_slice(), other.buf.as_slice())
    }

    pub fn complement_size(&self) -> i64 {
        (self.last + 1).max(0) - self.size()
    }

    // ---- iteration ------------------------------------------------------

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.buf.as_slice(), self.mod_count.get(), &self.mod_count)
    }

    pub fn iter_rev(&self) -> RevIter<'_> {
        RevIter::new(self.buf.as_slice(), self.last, self.mod_count.get(), &self.mod_count)
    }

    // ---- introspection ------------------------------------------------

    /// Ratio of words actually used to the words a plain (uncompressed)
    /// bitmap covering the same range would need. Below 1.0 means the
    /// compressed form is smaller.
    pub fn bitmap_compression_ratio(&self) -> f64 {
        if self.last < 0 {
            return 0.0;
        }
        let theoretical_words = ((self.last + 1) as f64 / word::BLOCK_SIZE as f64).ceil();
        self.buf.len_words() as f64 / theoretical_words
    }

    /// Ratio of words used to the number of elements stored. Below 1.0
    /// means the set uses fewer words than it has elements.
    pub fn collection_compression_ratio(&self) -> f64 {
        let size = self.size();
        if size == 0 {
            return 0.0;
        }
        self.buf.len_words() as f64 / size as f64
    }
}

impl Default for ConciseSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConciseSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConciseSet")
            .field("size", &self.size())
            .field("last", &self.last)
            .field("words", &self.buf.len_words())
            .finish()
    }
}

impl PartialEq for ConciseSet {
    fn eq(&self, other: &Self) -> bool {
        self.last == other.last && self.buf.as_slice() == other.buf.as_slice()
    }
}

impl Eq for ConciseSet {}

impl std::hash::Hash for ConciseSet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let mut h: u32 = 1;
        for &w in self.buf.as_slice() {
            h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(w);
        }
        state.write_u32(h);
    }
}

/// Reverse-lexicographic order: the set with the larger `last` sorts
/// greater; ties are broken by comparing blocks from the top down.
impl PartialOrd for ConciseSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConciseSet {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.last.cmp(&other.last) {
            Ordering::Equal => {}
            ord => return ord,
        }
        let mut ca = RevWordCursor::new(self.buf.as_slice());
        let mut cb = RevWordCursor::new(other.buf.as_slice());
        loop {
            match (ca.is_done(), cb.is_done()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => {
                    let la = word::literal_bits(ca.current_literal());
                    let lb = word::literal_bits(cb.current_literal());
                    if la != lb {
                        return la.cmp(&lb);
                    }
                    ca.advance();
                    cb.advance();
                }
            }
        }
    }
}
