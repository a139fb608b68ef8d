//! Test utilities for the notifier crate.
//!
//! This module provides shared doubles for both unit tests (in `src/`) and
//! behaviour tests (in `tests/`). It is compiled for `cfg(test)` and when the
//! `test-support` feature is enabled.

pub mod rotation_reminder;
