//! Prompts issued by dialog steps
//!
//! A prompt is persisted on its frame while the conversation waits for the
//! answer, so a bad answer can be met with the exact same prompt again.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::OutboundActivity;
use crate::state::FrameValue;
use crate::utils::errors::{AzBuddyError, Result};
use crate::utils::helpers::match_choice;

/// Compiled validation patterns, keyed by source
static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

fn compiled_pattern(pattern: &str) -> Result<Regex> {
    let mut patterns = PATTERNS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(regex) = patterns.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern)
        .map_err(|e| AzBuddyError::Config(format!("Invalid prompt pattern: {}", e)))?;
    patterns.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// Rules a free-text answer has to satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValidation {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Regex the whole answer must match
    pub pattern: Option<String>,
    /// Sent before the prompt is repeated
    pub retry_message: String,
}

impl TextValidation {
    /// Azure resource group naming rules
    pub fn resource_group_name() -> Self {
        Self {
            min_length: Some(1),
            max_length: Some(90),
            pattern: Some(r"^[-\w.()]*[-\w()]$".to_string()),
            retry_message: "Resource group names can use letters, digits, '-', '_', '.', '(' and ')', \
                            must not end with '.', and can be at most 90 characters."
                .to_string(),
        }
    }

    /// Azure storage account naming rules
    pub fn storage_account_name() -> Self {
        Self {
            min_length: Some(3),
            max_length: Some(24),
            pattern: Some(r"^[a-z0-9]+$".to_string()),
            retry_message: "Storage account names must be 3 to 24 lowercase letters or digits."
                .to_string(),
        }
    }

    fn check(&self, input: &str) -> Result<()> {
        let length = input.chars().count();

        if let Some(min_length) = self.min_length {
            if length < min_length {
                return Err(AzBuddyError::Validation(self.retry_message.clone()));
            }
        }

        if let Some(max_length) = self.max_length {
            if length > max_length {
                return Err(AzBuddyError::Validation(self.retry_message.clone()));
            }
        }

        if let Some(pattern) = &self.pattern {
            if !compiled_pattern(pattern)?.is_match(input) {
                return Err(AzBuddyError::Validation(self.retry_message.clone()));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PromptKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validation: Option<TextValidation>,
    },
    Choice {
        choices: Vec<String>,
    },
}

/// An outbound request for user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    #[serde(flatten)]
    pub kind: PromptKind,
}

impl Prompt {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: PromptKind::Text { validation: None },
        }
    }

    pub fn validated_text(text: &str, validation: TextValidation) -> Self {
        Self {
            text: text.to_string(),
            kind: PromptKind::Text {
                validation: Some(validation),
            },
        }
    }

    pub fn choice(text: &str, choices: Vec<String>) -> Self {
        Self {
            text: text.to_string(),
            kind: PromptKind::Choice { choices },
        }
    }

    pub fn choices(&self) -> Option<&[String]> {
        match &self.kind {
            PromptKind::Choice { choices } => Some(choices),
            PromptKind::Text { .. } => None,
        }
    }

    /// Turn an answer into the value handed to the next step.
    ///
    /// Choices resolve to their canonical label. A rejected answer is a
    /// `Validation` error carrying the message to show, if any.
    pub fn resolve(&self, input: &str) -> Result<FrameValue> {
        match &self.kind {
            PromptKind::Choice { choices } => match_choice(choices, input)
                .map(FrameValue::from)
                .ok_or_else(|| AzBuddyError::Validation(String::new())),
            PromptKind::Text { validation } => {
                let input = input.trim();
                if let Some(validation) = validation {
                    validation.check(input)?;
                }
                Ok(FrameValue::from(input))
            }
        }
    }

    pub fn to_activity(&self) -> OutboundActivity {
        match &self.kind {
            PromptKind::Choice { choices } => {
                OutboundActivity::with_choices(self.text.clone(), choices.clone())
            }
            PromptKind::Text { .. } => OutboundActivity::text(self.text.clone()),
        }
    }
}
