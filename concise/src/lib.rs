//! A compressed set of non-negative integers backed by a run-length-encoded
//! word stream (literal 31-bit blocks, or runs of all-zero/all-one blocks
//! carrying one optional exceptional "flip" bit).
//!
//! Set algebra — intersection, union, difference, symmetric difference,
//! complement — runs directly over the compressed word stream via a
//! dual-cursor merge that bulk-skips homogeneous runs on both sides instead
//! of expanding either operand. See [`ConciseSet`] for the public surface.
//!
//! Elements must lie in `[0, ConciseSet::MAX_ELEMENT]`; callers go through
//! [`concise_base::ConciseError`] for any precondition violation.

mod access;
mod append;
mod buffer;
mod cursor;
mod iter;
mod merge;
mod metrics;
mod ops;
mod scan;
mod set;
mod word;

pub use concise_base::{ConciseError, Result};
pub use iter::{Iter, RevIter};
pub use metrics::MergeMetrics;
pub use set::ConciseSet;
