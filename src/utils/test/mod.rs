//! Test utilities
//!
//! Builders for small observation tables and reference files, shared by the
//! unit tests and the integration tests under `tests/`.


pub use fixtures::{TableBuilder, sample_lookup, write_lookup_file};
