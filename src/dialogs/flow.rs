//! Flow definitions
//!
//! A flow is a fixed, ordered list of named steps. Each step receives the
//! frame's accumulated values plus the result of whatever the previous step
//! waited on, and answers with a [`StepOutcome`] telling the engine what to do
//! next.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use futures::future::BoxFuture;

use crate::config::AzureConfig;
use crate::models::OutboundActivity;
use crate::services::ResourceProvider;
use crate::state::{ConversationId, Frame, FrameValue};
use crate::utils::errors::{AzBuddyError, Result};
use super::prompt::Prompt;

/// What the engine does after a step ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Send the prompt and suspend until the user answers
    Prompt(Prompt),
    /// Push a child flow; its end value resumes this frame at the next step
    BeginChild(String),
    /// Pop this frame, handing the value to the parent
    EndDialog(Option<FrameValue>),
    /// Pop this frame and start the named flow from scratch in its place
    ReplaceDialog(String),
}

impl StepOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Prompt(_) => "prompt",
            StepOutcome::BeginChild(_) => "begin_child",
            StepOutcome::EndDialog(_) => "end_dialog",
            StepOutcome::ReplaceDialog(_) => "replace_dialog",
        }
    }
}

/// Settings the built-in flows read when building prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOptions {
    pub locations: Vec<String>,
    pub storage_skus: Vec<String>,
    /// `None` lists every resource group
    pub resource_group_filter: Option<String>,
}

impl From<&AzureConfig> for FlowOptions {
    fn from(config: &AzureConfig) -> Self {
        let filter = config.resource_group_filter.trim();
        Self {
            locations: config.locations.clone(),
            storage_skus: config.storage_skus.clone(),
            resource_group_filter: (!filter.is_empty()).then(|| filter.to_string()),
        }
    }
}

/// Collaborators shared by every step, built once at startup
#[derive(Clone)]
pub struct StepServices {
    pub provider: Arc<dyn ResourceProvider>,
    pub options: FlowOptions,
}

impl StepServices {
    pub fn new(provider: Arc<dyn ResourceProvider>, options: FlowOptions) -> Self {
        Self { provider, options }
    }
}

impl std::fmt::Debug for StepServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepServices")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Everything a step can see and touch while it runs
pub struct StepContext {
    conversation: ConversationId,
    dialog: String,
    step_index: usize,
    values: BTreeMap<String, FrameValue>,
    result: Option<FrameValue>,
    outbox: Vec<OutboundActivity>,
    services: Arc<StepServices>,
}

impl StepContext {
    pub(crate) fn new(
        conversation: ConversationId,
        frame: &mut Frame,
        result: Option<FrameValue>,
        services: Arc<StepServices>,
    ) -> Self {
        Self {
            conversation,
            dialog: frame.dialog_name.clone(),
            step_index: frame.step_index,
            values: std::mem::take(&mut frame.values),
            result,
            outbox: Vec::new(),
            services,
        }
    }

    /// Hand the values back to the frame and release queued messages
    pub(crate) fn finish(self, frame: &mut Frame) -> Vec<OutboundActivity> {
        frame.values = self.values;
        self.outbox
    }

    fn missing(&self, what: String) -> AzBuddyError {
        AzBuddyError::corruption(
            self.conversation.key(),
            format!("{} missing at {}[{}]", what, self.dialog, self.step_index),
        )
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    /// The result as text; its absence means the stack no longer matches the flow
    pub fn result_text(&self) -> Result<String> {
        match &self.result {
            Some(value) => Ok(value.to_string()),
            None => Err(self.missing("step result".to_string())),
        }
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<FrameValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// A value an earlier step stored
    pub fn value_text(&self, key: &str) -> Result<String> {
        match self.values.get(key) {
            Some(value) => Ok(value.to_string()),
            None => Err(self.missing(format!("value '{}'", key))),
        }
    }

    /// Queue a plain message ahead of whatever the step returns
    pub fn send(&mut self, text: impl Into<String>) {
        self.outbox.push(OutboundActivity::text(text));
    }

    pub fn provider(&self) -> Arc<dyn ResourceProvider> {
        self.services.provider.clone()
    }

    pub fn options(&self) -> &FlowOptions {
        &self.services.options
    }
}

/// Signature shared by every step function
pub type StepFn = for<'a> fn(&'a mut StepContext) -> BoxFuture<'a, Result<StepOutcome>>;

#[derive(Clone, Copy)]
pub struct FlowStep {
    pub name: &'static str,
    pub run: StepFn,
}

impl std::fmt::Debug for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStep").field("name", &self.name).finish()
    }
}

/// Immutable list of steps for one dialog
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    name: String,
    steps: Vec<FlowStep>,
}

impl FlowDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, name: &'static str, run: StepFn) -> Self {
        self.steps.push(FlowStep { name, run });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FlowStep> {
        self.steps.get(index)
    }
}

/// All flows the engine can run, plus which one starts a conversation
#[derive(Debug, Clone)]
pub struct FlowRegistry {
    flows: HashMap<String, FlowDefinition>,
    root: String,
}

impl FlowRegistry {
    pub fn new(root: &str) -> Self {
        Self {
            flows: HashMap::new(),
            root: root.to_string(),
        }
    }

    /// The resource creation flows
    pub fn azure() -> Self {
        Self::new(super::resource::RESOURCE_DIALOG)
            .register(super::resource::resource_flow())
            .register(super::resource_group::resource_group_flow())
            .register(super::storage_account::storage_account_flow())
    }

    pub fn register(mut self, flow: FlowDefinition) -> Self {
        self.flows.insert(flow.name().to_string(), flow);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FlowDefinition> {
        self.flows.get(name)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Check a loaded stack against the registered flows.
    ///
    /// Every frame must name a known flow and point at one of its steps, and the
    /// innermost frame must be waiting on a prompt.
    pub fn validate_stack(&self, conversation: &ConversationId, frames: &[Frame]) -> Result<()> {
        for frame in frames {
            let flow = self.get(&frame.dialog_name).ok_or_else(|| {
                AzBuddyError::corruption(
                    conversation.key(),
                    format!("unknown dialog '{}'", frame.dialog_name),
                )
            })?;

            if frame.step_index >= flow.len() {
                return Err(AzBuddyError::corruption(
                    conversation.key(),
                    format!(
                        "step {} out of range for '{}' ({} steps)",
                        frame.step_index,
                        frame.dialog_name,
                        flow.len()
                    ),
                ));
            }
        }

        if let Some(top) = frames.last() {
            if !top.is_suspended() {
                return Err(AzBuddyError::corruption(
                    conversation.key(),
                    format!("'{}' is not waiting on a prompt", top.dialog_name),
                ));
            }
        }

        Ok(())
    }
}
