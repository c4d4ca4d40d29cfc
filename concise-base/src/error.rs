// We want a few things here:
// 1. A closed set of error variants callers can match on.
// 2. A way to centralize setting a breakpoint to trap any error in the system fairly soon
//    after it's created (or at least when it's propagated from a library we use back to us)
// 3. Same but for logging / emitting error messages into the tracing/logging system

use thiserror::Error;
use tracing::error;

#[cfg(test)]
use test_log::test;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConciseError {
    #[error("element {element} is out of range [0, {max}]")]
    OutOfRange { element: i64, max: i64 },

    #[error("range endpoints reversed: from {from} > to {to}")]
    InvalidRange { from: i64, to: i64 },

    #[error("position {index} is out of range for a set of size {size}")]
    IndexOutOfRange { index: i64, size: i64 },

    #[error("operation is undefined on an empty set")]
    EmptySet,

    #[error("iterator observed a concurrent modification of the underlying set")]
    ConcurrentModification,

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },
}

pub type Result<T> = std::result::Result<T, ConciseError>;

impl ConciseError {
    pub fn out_of_range(element: i64, max: i64) -> ConciseError {
        let err = ConciseError::OutOfRange { element, max };
        error!(target: "concise", "{}", err);
        err
    }

    pub fn invalid_range(from: i64, to: i64) -> ConciseError {
        let err = ConciseError::InvalidRange { from, to };
        error!(target: "concise", "{}", err);
        err
    }

    pub fn index_out_of_range(index: i64, size: i64) -> ConciseError {
        let err = ConciseError::IndexOutOfRange { index, size };
        error!(target: "concise", "{}", err);
        err
    }

    pub fn empty_set() -> ConciseError {
        let err = ConciseError::EmptySet;
        error!(target: "concise", "{}", err);
        err
    }

    pub fn concurrent_modification() -> ConciseError {
        let err = ConciseError::ConcurrentModification;
        error!(target: "concise", "{}", err);
        err
    }

    pub fn invalid_argument(reason: &'static str) -> ConciseError {
        let err = ConciseError::InvalidArgument { reason };
        error!(target: "concise", "{}", err);
        err
    }
}

#[test]
fn test_error_display() {
    let err = ConciseError::out_of_range(-1, 1_040_187_422);
    assert_eq!(
        err.to_string(),
        "element -1 is out of range [0, 1040187422]"
    );
}

#[test]
fn test_error_equality() {
    assert_eq!(ConciseError::empty_set(), ConciseError::EmptySet);
    assert_ne!(ConciseError::empty_set(), ConciseError::ConcurrentModification);
}
