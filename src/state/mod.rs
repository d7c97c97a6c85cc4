//! State management module
//! 
//! This module handles conversation dialog stacks and their persistence

pub mod context;
pub mod locks;
pub mod storage;

// Re-export commonly used state components
pub use context::{ConversationId, DialogState, Frame, FrameValue};
pub use locks::{ConversationGuard, ConversationLocks};
pub use storage::{DialogStateStore, MemoryStateStore, RedisStateStore};
