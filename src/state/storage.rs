//! State storage implementation
//!
//! This module persists each conversation's dialog stack between turns, either
//! in Redis (with a TTL) or in process memory.

use std::collections::HashMap;
use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use crate::utils::errors::{AzBuddyError, Result};
use crate::config::RedisConfig;
use super::context::{ConversationId, DialogState, Frame};

/// Keyed persistence for dialog stacks
#[async_trait]
pub trait DialogStateStore: Send + Sync {
    /// Load the stored record, `None` when the conversation has never been saved
    async fn load_state(&self, conversation: &ConversationId) -> Result<Option<DialogState>>;

    async fn save_state(&self, state: &DialogState) -> Result<()>;

    async fn delete(&self, conversation: &ConversationId) -> Result<()>;

    /// Load the frame stack, empty when nothing is stored
    async fn load(&self, conversation: &ConversationId) -> Result<Vec<Frame>> {
        Ok(self
            .load_state(conversation)
            .await?
            .map(|state| state.frames)
            .unwrap_or_default())
    }

    async fn save(&self, conversation: &ConversationId, frames: &[Frame]) -> Result<()> {
        self.save_state(&DialogState::new(conversation.clone(), frames.to_vec()))
            .await
    }

    async fn exists(&self, conversation: &ConversationId) -> Result<bool> {
        Ok(self.load_state(conversation).await?.is_some())
    }
}

/// Decode a stored record; unreadable data is corruption, not an I/O failure
fn decode_state(conversation: &ConversationId, data: &str) -> Result<DialogState> {
    serde_json::from_str::<DialogState>(data).map_err(|e| {
        error!(conversation = %conversation, error = %e, "Failed to deserialize dialog state");
        AzBuddyError::corruption(conversation.key(), format!("unreadable record: {}", e))
    })
}

/// Redis-based state storage
#[derive(Clone)]
pub struct RedisStateStore {
    /// Redis connection manager
    connection_manager: redis::aio::ConnectionManager,
    /// Redis configuration
    config: RedisConfig,
}

impl RedisStateStore {
    /// Create a new state storage instance
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Get the Redis key for a conversation's dialog state
    fn state_key(&self, conversation: &ConversationId) -> String {
        format!("{}dialog:{}", self.config.prefix, conversation.key())
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl DialogStateStore for RedisStateStore {
    async fn load_state(&self, conversation: &ConversationId) -> Result<Option<DialogState>> {
        let key = self.state_key(conversation);
        debug!(conversation = %conversation, key = %key, "Loading dialog state from Redis");

        let mut conn = self.connection_manager.clone();
        let serialized: Option<String> = match conn.get(&key).await {
            Ok(data) => data,
            Err(e) => {
                error!(conversation = %conversation, error = %e, "Failed to get dialog state from Redis");
                return Err(e.into());
            }
        };

        match serialized {
            Some(data) => {
                let state = decode_state(conversation, &data)?;
                debug!(conversation = %conversation, depth = state.frames.len(), "Dialog state loaded");
                Ok(Some(state))
            }
            None => {
                debug!(conversation = %conversation, "No dialog state found in Redis");
                Ok(None)
            }
        }
    }

    async fn save_state(&self, state: &DialogState) -> Result<()> {
        let key = self.state_key(&state.conversation);
        let serialized = serde_json::to_string(state)?;

        let mut conn = self.connection_manager.clone();
        match conn.set_ex::<_, _, ()>(&key, serialized, self.config.ttl_seconds).await {
            Ok(_) => {
                debug!(conversation = %state.conversation, depth = state.frames.len(),
                       ttl_seconds = self.config.ttl_seconds, "Dialog state saved to Redis");
                Ok(())
            }
            Err(e) => {
                error!(conversation = %state.conversation, error = %e, "Failed to save dialog state to Redis");
                Err(e.into())
            }
        }
    }

    async fn delete(&self, conversation: &ConversationId) -> Result<()> {
        let key = self.state_key(conversation);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&key).await?;
        if deleted == 0 {
            debug!(conversation = %conversation, "No dialog state to delete");
        }

        Ok(())
    }
}

impl std::fmt::Debug for RedisStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStateStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// In-process state storage holding serialized records
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Store a raw record, bypassing serialization
    pub async fn put_raw(&self, conversation: &ConversationId, data: &str) {
        warn!(conversation = %conversation, "Writing raw dialog record");
        self.records
            .write()
            .await
            .insert(conversation.key(), data.to_string());
    }
}

#[async_trait]
impl DialogStateStore for MemoryStateStore {
    async fn load_state(&self, conversation: &ConversationId) -> Result<Option<DialogState>> {
        let records = self.records.read().await;
        match records.get(&conversation.key()) {
            Some(data) => decode_state(conversation, data).map(Some),
            None => Ok(None),
        }
    }

    async fn save_state(&self, state: &DialogState) -> Result<()> {
        let serialized = serde_json::to_string(state)?;
        self.records
            .write()
            .await
            .insert(state.conversation.key(), serialized);
        debug!(conversation = %state.conversation, depth = state.frames.len(), "Dialog state saved in memory");
        Ok(())
    }

    async fn delete(&self, conversation: &ConversationId) -> Result<()> {
        self.records.write().await.remove(&conversation.key());
        Ok(())
    }
}
