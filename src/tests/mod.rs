//! Scenario tests for the loader.
//!
//! These drive a real `Loader` with instrumented fetch functions and check
//! coalescing, stale-while-revalidate, error caching and lock reclamation.

mod cases_eviction_test;

pub mod support;
