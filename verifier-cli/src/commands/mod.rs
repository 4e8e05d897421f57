//! Command handlers (imperative shell)
//!
//! Each handler resolves settings, builds its collaborators and delegates to
//! an `_impl` function that takes them as parameters, so tests can inject
//! mocks and capture output.

pub mod common;
pub mod normalize;
pub mod verify;
pub mod versions;
