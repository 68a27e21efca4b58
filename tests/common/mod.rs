//! tests/common/mod.rs
//!
//! Public facade for the test harness module. This makes test utilities
//! easily accessible to all integration test files.

// Not every helper is used by every test crate.
#![allow(dead_code)]
