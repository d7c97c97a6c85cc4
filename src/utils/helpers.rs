//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use uuid::Uuid;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Find the enumerated choice matching user input.
///
/// Matching is case-insensitive and ignores surrounding whitespace; the canonical
/// label is returned so later steps never see the user's spelling.
pub fn match_choice<'a>(choices: &'a [String], input: &str) -> Option<&'a str> {
    let input = input.trim().to_lowercase();
    choices
        .iter()
        .find(|choice| choice.to_lowercase() == input)
        .map(String::as_str)
}

/// Render choices as an inline list for channels without keyboards
pub fn format_choices(choices: &[String]) -> String {
    choices
        .iter()
        .map(|choice| format!("  - {}", choice))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Last path segment of an Azure resource ID
pub fn resource_name_from_id(id: &str) -> Option<&str> {
    id.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}
