//! Test helpers module
//!
//! This module provides utilities and helpers for testing AzBuddy.
//! It includes a mock Azure management server, a scripted resource provider,
//! a recording channel sink and a unified test context.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod arm_mock;
pub mod fake_provider;
pub mod test_context;

pub use arm_mock::*;
pub use fake_provider::*;
pub use test_context::*;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}
