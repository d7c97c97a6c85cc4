//! Root controller
//!
//! Glue between a hosting channel and the step engine: per inbound activity it
//! loads the conversation's stack, advances it, delivers the outbound messages
//! in order and saves the new stack exactly once.

use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::dialogs::StepEngine;
use crate::models::{ActivityKind, InboundActivity, OutboundActivity};
use crate::state::{ConversationId, ConversationLocks, DialogStateStore, Frame};
use crate::utils::errors::Result;
use crate::utils::helpers::generate_uuid;
use crate::utils::logging::{log_state_reset, log_turn};

pub const RESET_MESSAGE: &str = "Sorry, I lost track of our conversation. Let's start over.";

/// Outbound delivery for one channel
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn send(&self, conversation: &ConversationId, activity: &OutboundActivity) -> Result<()>;
}

pub struct RootController {
    engine: StepEngine,
    store: Arc<dyn DialogStateStore>,
    locks: ConversationLocks,
    welcome_message: String,
}

impl std::fmt::Debug for RootController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootController")
            .field("engine", &self.engine)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

impl RootController {
    pub fn new(engine: StepEngine, store: Arc<dyn DialogStateStore>, welcome_message: &str) -> Self {
        Self {
            engine,
            store,
            locks: ConversationLocks::new(),
            welcome_message: welcome_message.to_string(),
        }
    }

    /// Process one inbound activity to completion
    pub async fn on_turn(&self, activity: &InboundActivity, sink: &dyn ActivitySink) -> Result<()> {
        let conversation = &activity.conversation;
        let _guard = self.locks.acquire(&conversation.key()).await;

        let mut outbound = Vec::new();

        let input = match activity.kind {
            ActivityKind::ConversationUpdate => {
                let added = activity.added_members().count();
                if added == 0 {
                    debug!(conversation = %conversation, "No members added, nothing to do");
                    return Ok(());
                }
                for _ in 0..added {
                    outbound.push(OutboundActivity::text(self.welcome_message.as_str()));
                }
                None
            }
            ActivityKind::Message => activity.text.as_deref(),
        };

        let stack = match self.store.load_state(conversation).await {
            Ok(Some(state)) => {
                let (dialog, step) = state.current_state();
                debug!(
                    conversation = %conversation,
                    in_dialog = state.in_dialog(),
                    dialog = ?dialog,
                    step = ?step,
                    "Loaded dialog state"
                );
                state.frames
            }
            Ok(None) => {
                if activity.kind == ActivityKind::Message {
                    outbound.push(OutboundActivity::text(self.welcome_message.as_str()));
                }
                Vec::new()
            }
            Err(e) if e.resets_conversation() => {
                log_state_reset(&conversation.key(), &e.to_string());
                outbound.push(OutboundActivity::text(RESET_MESSAGE));
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let turn_id = generate_uuid();
        log_turn(&conversation.key(), &turn_id, kind_label(activity.kind), stack.len());

        let stack = self.advance_or_reset(conversation, stack, input, &mut outbound).await?;

        let delivered = self.deliver(conversation, &outbound, sink).await;
        self.store.save(conversation, &stack).await?;

        debug!(
            conversation = %conversation,
            turn_id = %turn_id,
            depth = stack.len(),
            sent = outbound.len(),
            "Turn complete"
        );
        delivered
    }

    /// Advance, starting over at the root flow when the stack turns out unusable.
    /// Messages queued before the failure still go out ahead of the reset notice.
    async fn advance_or_reset(
        &self,
        conversation: &ConversationId,
        stack: Vec<Frame>,
        input: Option<&str>,
        outbound: &mut Vec<OutboundActivity>,
    ) -> Result<Vec<Frame>> {
        match self.engine.advance_into(conversation, stack, input, outbound).await {
            Ok(stack) => Ok(stack),
            Err(e) if e.resets_conversation() => {
                log_state_reset(&conversation.key(), &e.to_string());
                outbound.push(OutboundActivity::text(RESET_MESSAGE));
                self.engine.advance_into(conversation, Vec::new(), None, outbound).await
            }
            Err(e) => Err(e),
        }
    }

    /// Send in order; a failed send is logged and the rest still go out
    async fn deliver(
        &self,
        conversation: &ConversationId,
        outbound: &[OutboundActivity],
        sink: &dyn ActivitySink,
    ) -> Result<()> {
        let mut first_error = None;

        for activity in outbound {
            if let Err(e) = sink.send(conversation, activity).await {
                error!(conversation = %conversation, error = %e, "Failed to deliver message");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                if !outbound.is_empty() {
                    info!(conversation = %conversation, count = outbound.len(), "Delivered messages");
                }
                Ok(())
            }
        }
    }
}

fn kind_label(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Message => "message",
        ActivityKind::ConversationUpdate => "conversationUpdate",
    }
}
