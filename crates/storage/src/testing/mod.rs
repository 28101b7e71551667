//! Testing utilities for copy correctness under failure
//!
//! This module provides tools for exercising the copy engine against a
//! misbehaving backend:
//!
//! - **Fault injection**: [`FaultyStore`] wraps any backend and fails reads
//!   or writes at chosen points, or accepts batches only partially
//! - **Recording**: every batch size forwarded to the target is kept for
//!   later assertions
//!
//! # Example
//!
//! ```ignore
//! use tablecopy_storage::testing::FaultyStore;
//!
//! let store = FaultyStore::new(memory_store)
//!     .fail_write("target", 3)
//!     .fail_read("source", 1, 2);
//! ```

mod faults;

pub use faults::{Fault, FaultyStore};
