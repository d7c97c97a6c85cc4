//! Channel handlers module
//!
//! This module contains the root controller and the channels that feed it:
//! - Telegram via the Bot API
//! - Console over stdin/stdout

pub mod controller;
pub mod console;
pub mod telegram;

// Re-export commonly used handler types
pub use controller::{ActivitySink, RootController, RESET_MESSAGE};
pub use console::{run_console, ConsoleSink};
pub use telegram::{run_telegram, TelegramSink};
