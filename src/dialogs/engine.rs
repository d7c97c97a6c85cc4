//! Step engine
//!
//! The single transition function for a conversation turn: given the loaded
//! frame stack and the user's input, run steps until one suspends on a prompt
//! or the stack empties, and report the new stack plus the messages to send.

use std::sync::Arc;
use tracing::debug;

use crate::models::OutboundActivity;
use crate::state::{ConversationId, Frame, FrameValue};
use crate::utils::errors::{AzBuddyError, Result};
use crate::utils::logging::log_dialog_transition;
use super::flow::{FlowRegistry, StepContext, StepOutcome, StepServices};

/// Upper bound on step runs within one turn
pub const MAX_TRANSITIONS_PER_TURN: usize = 64;

/// New stack and outbound messages produced by one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub stack: Vec<Frame>,
    pub actions: Vec<OutboundActivity>,
}

impl TurnOutcome {
    /// The conversation left every flow this turn
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StepEngine {
    registry: Arc<FlowRegistry>,
    services: Arc<StepServices>,
}

impl StepEngine {
    pub fn new(registry: Arc<FlowRegistry>, services: Arc<StepServices>) -> Self {
        Self { registry, services }
    }

    /// Advance a conversation by one inbound event.
    ///
    /// An empty stack starts the root flow and ignores `input`. Otherwise
    /// `input` answers the pending prompt of the innermost frame; `None`
    /// repeats that prompt. Answers the prompt rejects repeat it as well and
    /// leave the stack untouched.
    pub async fn advance(
        &self,
        conversation: &ConversationId,
        stack: Vec<Frame>,
        input: Option<&str>,
    ) -> Result<TurnOutcome> {
        let mut actions = Vec::new();
        let stack = self.advance_into(conversation, stack, input, &mut actions).await?;
        Ok(TurnOutcome { stack, actions })
    }

    /// Like [`advance`](Self::advance), appending messages to `actions` as steps
    /// queue them. On error, whatever the steps queued before failing is kept.
    pub async fn advance_into(
        &self,
        conversation: &ConversationId,
        mut stack: Vec<Frame>,
        input: Option<&str>,
        actions: &mut Vec<OutboundActivity>,
    ) -> Result<Vec<Frame>> {
        let result = match stack.last_mut() {
            None => {
                debug!(conversation = %conversation, root = self.registry.root(), "Starting root flow");
                if !self.registry.contains(self.registry.root()) {
                    return Err(AzBuddyError::InvalidInput(format!(
                        "Root flow '{}' is not registered",
                        self.registry.root()
                    )));
                }
                stack.push(Frame::new(self.registry.root()));
                None
            }
            Some(_) => {
                self.registry.validate_stack(conversation, &stack)?;
                let Some(top) = stack.last_mut() else {
                    return Ok(stack);
                };
                let Some(pending) = top.pending.clone() else {
                    return Err(AzBuddyError::corruption(conversation.key(), "no pending prompt"));
                };

                let Some(input) = input else {
                    actions.push(pending.to_activity());
                    return Ok(stack);
                };

                match pending.resolve(input) {
                    Ok(value) => {
                        top.pending = None;
                        Some(value)
                    }
                    Err(AzBuddyError::Validation(message)) => {
                        debug!(conversation = %conversation, dialog = %top.dialog_name,
                               step = top.step_index, "Answer rejected, prompting again");
                        if !message.is_empty() {
                            actions.push(OutboundActivity::text(message));
                        }
                        actions.push(pending.to_activity());
                        return Ok(stack);
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        self.run(conversation, &mut stack, result, actions).await?;
        Ok(stack)
    }

    /// Run steps from the innermost frame until one suspends or the stack empties
    async fn run(
        &self,
        conversation: &ConversationId,
        stack: &mut Vec<Frame>,
        mut result: Option<FrameValue>,
        actions: &mut Vec<OutboundActivity>,
    ) -> Result<()> {
        let mut transitions = 0;

        while let Some(frame) = stack.last_mut() {
            transitions += 1;
            if transitions > MAX_TRANSITIONS_PER_TURN {
                return Err(AzBuddyError::RunawayFlow {
                    dialog: frame.dialog_name.clone(),
                    transitions,
                });
            }

            let flow = self.registry.get(&frame.dialog_name).ok_or_else(|| {
                AzBuddyError::corruption(
                    conversation.key(),
                    format!("unknown dialog '{}'", frame.dialog_name),
                )
            })?;

            let outcome = match flow.get(frame.step_index) {
                Some(step) => {
                    let mut ctx = StepContext::new(
                        conversation.clone(),
                        frame,
                        result.take(),
                        self.services.clone(),
                    );
                    let outcome = (step.run)(&mut ctx).await;
                    actions.extend(ctx.finish(frame));
                    outcome?
                }
                // Falling off the end of a flow ends it with the last result
                None => StepOutcome::EndDialog(result.take()),
            };

            log_dialog_transition(
                &conversation.key(),
                &frame.dialog_name,
                frame.step_index,
                outcome.label(),
            );

            match outcome {
                StepOutcome::Prompt(prompt) => {
                    if frame.step_index + 1 >= flow.len() {
                        return Err(AzBuddyError::corruption(
                            conversation.key(),
                            format!("final step of '{}' cannot prompt", frame.dialog_name),
                        ));
                    }
                    actions.push(prompt.to_activity());
                    frame.pending = Some(prompt);
                    frame.step_index += 1;
                    break;
                }
                StepOutcome::BeginChild(name) => {
                    if !self.registry.contains(&name) {
                        return Err(AzBuddyError::corruption(
                            conversation.key(),
                            format!("unknown child dialog '{}'", name),
                        ));
                    }
                    stack.push(Frame::new(&name));
                }
                StepOutcome::EndDialog(value) => {
                    stack.pop();
                    if let Some(parent) = stack.last_mut() {
                        parent.step_index += 1;
                        result = value;
                    }
                }
                StepOutcome::ReplaceDialog(name) => {
                    if !self.registry.contains(&name) {
                        return Err(AzBuddyError::corruption(
                            conversation.key(),
                            format!("unknown replacement dialog '{}'", name),
                        ));
                    }
                    stack.pop();
                    stack.push(Frame::new(&name));
                }
            }
        }

        Ok(())
    }
}
