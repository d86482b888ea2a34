//! Prompt-input sanitizers
//!
//! Short custom fields (relationship, purpose, tone) go through a hard gate:
//! anything suspicious is rejected. Drafts are cleaned instead, with injection
//! markers redacted to `[removed]`. Both share one forbidden-pattern list.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use super::DomainError;

pub const MAX_CUSTOM_INPUT_CHARS: usize = 50;
pub const MIN_DRAFT_CHARS: usize = 10;
pub const REDACTION: &str = "[removed]";

static FORBIDDEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)---[A-Z\s]+---",
        r"(?i)\[SYSTEM\]",
        r"(?i)\[ASSISTANT\]",
        r"(?i)ignore\s+(previous|all|above)",
        r"(?i)forget\s+(everything|instructions)",
        r"(?i)new\s+(role|instruction|system)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid forbidden pattern"))
    .collect()
});

static ALLOWED_CUSTOM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[\p{L}\p{N}\s.,!?'"()\-:/]+$"#).expect("valid allow-list pattern")
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid regex"));
static DRAFT_CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B-\x1F\x7F]").expect("valid regex"));
static NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} contains a forbidden pattern")]
    ForbiddenPattern { field: &'static str },

    #[error("{field} contains characters that are not allowed")]
    DisallowedCharacters { field: &'static str },
}

impl From<SanitizeError> for DomainError {
    fn from(err: SanitizeError) -> Self {
        DomainError::validation(err.to_string())
    }
}

fn contains_forbidden(text: &str) -> bool {
    FORBIDDEN_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Hard gate for a short free-text option
pub fn sanitize_custom_input(field: &'static str, input: &str) -> Result<String, SanitizeError> {
    let collapsed = WHITESPACE_RUN.replace_all(input.trim(), " ");
    let cleaned = CONTROL_CHARS.replace_all(&collapsed, "").trim().to_string();

    if cleaned.is_empty() {
        return Err(SanitizeError::Empty { field });
    }

    if cleaned.chars().count() > MAX_CUSTOM_INPUT_CHARS {
        return Err(SanitizeError::TooLong {
            field,
            max: MAX_CUSTOM_INPUT_CHARS,
        });
    }

    if contains_forbidden(&cleaned) {
        return Err(SanitizeError::ForbiddenPattern { field });
    }

    if !ALLOWED_CUSTOM.is_match(&cleaned) {
        return Err(SanitizeError::DisallowedCharacters { field });
    }

    Ok(cleaned)
}

/// Clean a draft of at most `max_chars` characters, redacting injection markers
pub fn sanitize_draft(draft: &str, max_chars: usize) -> Result<String, SanitizeError> {
    let trimmed = draft.trim();
    let len = trimmed.chars().count();

    if len > max_chars {
        return Err(SanitizeError::TooLong {
            field: "draft",
            max: max_chars,
        });
    }

    if len < MIN_DRAFT_CHARS {
        return Err(SanitizeError::TooShort {
            field: "draft",
            min: MIN_DRAFT_CHARS,
        });
    }

    let cleaned = DRAFT_CONTROL_CHARS.replace_all(trimmed, "");
    let cleaned = NEWLINE_RUN.replace_all(&cleaned, "\n\n");
    let mut cleaned = SPACE_RUN.replace_all(&cleaned, " ").into_owned();

    for pattern in FORBIDDEN_PATTERNS.iter() {
        if pattern.is_match(&cleaned) {
            warn!(pattern = %pattern.as_str(), "Redacting forbidden pattern in draft");
            cleaned = pattern.replace_all(&cleaned, REDACTION).into_owned();
        }
    }

    Ok(cleaned)
}

/// Sanitized relationship, purpose and tone; absent or blank values stay absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomInputs {
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub tone: Option<String>,
}

pub fn sanitize_custom_inputs(
    relationship: Option<&str>,
    purpose: Option<&str>,
    tone: Option<&str>,
) -> Result<CustomInputs, SanitizeError> {
    fn field(
        name: &'static str,
        value: Option<&str>,
    ) -> Result<Option<String>, SanitizeError> {
        match value {
            Some(v) if !v.trim().is_empty() => sanitize_custom_input(name, v).map(Some),
            _ => Ok(None),
        }
    }

    Ok(CustomInputs {
        relationship: field("relationship", relationship)?,
        purpose: field("purpose", purpose)?,
        tone: field("tone", tone)?,
    })
}
