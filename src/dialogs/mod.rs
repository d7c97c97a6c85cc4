//! Dialogs module
//!
//! Flow definitions, prompts and the engine that drives a conversation's
//! dialog stack one turn at a time.

pub mod engine;
pub mod flow;
pub mod prompt;
pub mod resource;
pub mod resource_group;
pub mod storage_account;

pub use engine::{StepEngine, TurnOutcome, MAX_TRANSITIONS_PER_TURN};
pub use flow::{
    FlowDefinition, FlowOptions, FlowRegistry, FlowStep, StepContext, StepFn, StepOutcome,
    StepServices,
};
pub use prompt::{Prompt, PromptKind, TextValidation};
pub use resource::RESOURCE_DIALOG;
pub use resource_group::RESOURCE_GROUP_DIALOG;
pub use storage_account::STORAGE_ACCOUNT_DIALOG;
