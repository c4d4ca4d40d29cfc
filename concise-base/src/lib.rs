mod error;

pub use error::{ConciseError, Result};
