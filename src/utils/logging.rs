//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the AzBuddy application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop, so the caller must hold it
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "azbuddy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log the start of a conversation turn
pub fn log_turn(conversation: &str, turn_id: &str, kind: &str, depth: usize) {
    info!(
        conversation = conversation,
        turn_id = turn_id,
        kind = kind,
        depth = depth,
        "Turn started"
    );
}

/// Log a dialog stack transition
pub fn log_dialog_transition(conversation: &str, dialog: &str, step: usize, outcome: &str) {
    debug!(
        conversation = conversation,
        dialog = dialog,
        step = step,
        outcome = outcome,
        "Dialog transition"
    );
}

/// Log resource provider calls
pub fn log_provider_call(operation: &str, target: &str, duration_ms: u64, success: bool) {
    if success {
        info!(
            operation = operation,
            target = target,
            duration_ms = duration_ms,
            "Azure operation completed"
        );
    } else {
        error!(
            operation = operation,
            target = target,
            duration_ms = duration_ms,
            "Azure operation failed"
        );
    }
}

/// Log a dialog stack being discarded
pub fn log_state_reset(conversation: &str, reason: &str) {
    warn!(
        conversation = conversation,
        reason = reason,
        "Dialog state reset"
    );
}
