// Shared test support code for loader tests.

pub mod common;
pub mod fetch;

pub use common::*;
pub use fetch::*;
