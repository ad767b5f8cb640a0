//! Integration test support for the feed interaction engine
//!
//! Provides scripted collaborator fakes and assembly helpers used by the
//! tests in `tests/`.

pub mod fixtures;
pub mod helpers;
