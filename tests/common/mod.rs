//! Common test utilities and helpers
//!
//! This module provides shared functionality used across integration tests:
//! - Binary invocation with a clean environment (via `helpers::kompile_command`)
//! - Source tree, library and stand-in tool fixtures (via `helpers`)

pub(crate) mod helpers;
