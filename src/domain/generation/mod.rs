//! Email generation request/response types and the token budget

mod prompt;

pub use prompt::{build_system_prompt, build_user_prompt, parse_generation, ParsedGeneration};

use serde::{Deserialize, Serialize};

use super::sanitize::MIN_DRAFT_CHARS;
use super::tier::TierLimits;
use super::DomainError;

pub const MAX_DRAFT_CHARS: usize = 600;
const MAX_OPTION_CHARS: usize = 50;
const RATIONALE_TOKEN_BONUS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl Language {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ko" => Some(Self::Ko),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// Requested email length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthOption {
    Short,
    Medium,
    Long,
}

impl LengthOption {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            _ => None,
        }
    }

    /// Draft character budget; overrides the tier default when chosen
    pub fn max_input_chars(&self) -> usize {
        match self {
            Self::Short => 150,
            Self::Medium => 300,
            Self::Long => 600,
        }
    }

    pub fn output_tokens(&self) -> u32 {
        match self {
            Self::Short => 100,
            Self::Medium => 200,
            Self::Long => 400,
        }
    }
}

/// Output token cap for one generation
pub fn max_output_tokens(
    limits: &TierLimits,
    length: Option<LengthOption>,
    include_rationale: bool,
) -> u32 {
    let base = length
        .map(|l| l.output_tokens())
        .unwrap_or(limits.max_tokens_per_request);
    let bonus = if include_rationale {
        RATIONALE_TOKEN_BONUS
    } else {
        0
    };

    (base + bonus).min(limits.max_tokens_per_request)
}

/// Raw generate-email body as received
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEmailInput {
    pub draft: Option<String>,
    pub language: Option<String>,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub tone: Option<String>,
    pub length: Option<String>,
    pub include_rationale: Option<bool>,
    pub save_as_archive: Option<bool>,
}

/// Schema-validated generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub draft: String,
    pub language: Language,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub tone: Option<String>,
    pub length: Option<LengthOption>,
    pub include_rationale: bool,
    pub save_as_archive: bool,
}

impl GenerationRequest {
    /// Any option beyond the default counts as an advanced feature
    pub fn uses_advanced_features(&self) -> bool {
        self.tone.is_some() || self.length.is_some() || self.include_rationale
    }
}

impl GenerateEmailInput {
    pub fn validate(self) -> Result<GenerationRequest, DomainError> {
        let draft = self
            .draft
            .ok_or_else(|| DomainError::validation("draft is required"))?;
        let draft_len = draft.chars().count();

        if draft_len < MIN_DRAFT_CHARS {
            return Err(DomainError::validation(format!(
                "draft must be at least {} characters",
                MIN_DRAFT_CHARS
            )));
        }

        if draft_len > MAX_DRAFT_CHARS {
            return Err(DomainError::validation(format!(
                "draft must be at most {} characters",
                MAX_DRAFT_CHARS
            )));
        }

        let language = self
            .language
            .as_deref()
            .and_then(Language::parse)
            .ok_or_else(|| DomainError::validation("language must be one of: ko, en"))?;

        let length = match self.length.as_deref() {
            None => None,
            Some(value) => Some(LengthOption::parse(value).ok_or_else(|| {
                DomainError::validation("length must be one of: short, medium, long")
            })?),
        };

        Ok(GenerationRequest {
            draft,
            language,
            relationship: bounded_option("relationship", self.relationship)?,
            purpose: bounded_option("purpose", self.purpose)?,
            tone: bounded_option("tone", self.tone)?,
            length,
            include_rationale: self.include_rationale.unwrap_or(false),
            save_as_archive: self.save_as_archive.unwrap_or(true),
        })
    }
}

fn bounded_option(field: &str, value: Option<String>) -> Result<Option<String>, DomainError> {
    match value {
        Some(v) if v.chars().count() > MAX_OPTION_CHARS => Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_OPTION_CHARS
        ))),
        Some(v) if v.trim().is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Options actually applied to the generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub characters_used: usize,
    pub tokens_used: u64,
    pub credit_charged: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_credits: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub applied_filters: AppliedFilters,
    pub metadata: GenerationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tier::{LimitsTable, Tier};

    fn input(draft: &str) -> GenerateEmailInput {
        GenerateEmailInput {
            draft: Some(draft.to_string()),
            language: Some("ko".to_string()),
            relationship: None,
            purpose: None,
            tone: None,
            length: None,
            include_rationale: None,
            save_as_archive: None,
        }
    }

    #[test]
    fn test_validate_defaults() {
        let request = input("교수님께 면담 요청 드립니다").validate().unwrap();

        assert_eq!(request.language, Language::Ko);
        assert!(!request.include_rationale);
        assert!(request.save_as_archive);
        assert!(!request.uses_advanced_features());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert!(input("short").validate().is_err());
        assert!(input(&"a".repeat(601)).validate().is_err());

        let mut bad_language = input("a perfectly fine draft");
        bad_language.language = Some("fr".into());
        assert!(bad_language.validate().is_err());

        let mut bad_length = input("a perfectly fine draft");
        bad_length.length = Some("huge".into());
        assert!(bad_length.validate().is_err());

        let mut long_tone = input("a perfectly fine draft");
        long_tone.tone = Some("t".repeat(51));
        assert!(long_tone.validate().is_err());
    }

    #[test]
    fn test_advanced_detection() {
        let mut with_tone = input("a perfectly fine draft");
        with_tone.tone = Some("formal".into());
        assert!(with_tone.validate().unwrap().uses_advanced_features());

        let mut with_length = input("a perfectly fine draft");
        with_length.length = Some("short".into());
        assert!(with_length.validate().unwrap().uses_advanced_features());

        let mut rationale_false = input("a perfectly fine draft");
        rationale_false.include_rationale = Some(false);
        assert!(!rationale_false.validate().unwrap().uses_advanced_features());
    }

    #[test]
    fn test_length_budgets() {
        assert_eq!(LengthOption::Short.max_input_chars(), 150);
        assert_eq!(LengthOption::Medium.max_input_chars(), 300);
        assert_eq!(LengthOption::Long.max_input_chars(), 600);
    }

    #[test]
    fn test_max_output_tokens() {
        let table = LimitsTable::default();

        assert_eq!(
            max_output_tokens(table.for_tier(Tier::Premium), Some(LengthOption::Short), false),
            100
        );
        assert_eq!(
            max_output_tokens(table.for_tier(Tier::Premium), Some(LengthOption::Short), true),
            400
        );
        assert_eq!(
            max_output_tokens(table.for_tier(Tier::Free), Some(LengthOption::Long), false),
            200
        );
        assert_eq!(max_output_tokens(table.for_tier(Tier::Guest), None, false), 100);
    }

    #[test]
    fn test_result_serialization() {
        let result = GenerationResult {
            email: "Dear".into(),
            rationale: None,
            applied_filters: AppliedFilters {
                language: Language::En,
                relationship: None,
                purpose: None,
                tone: Some("formal".into()),
                length: Some(LengthOption::Short),
            },
            metadata: GenerationMetadata {
                characters_used: 12,
                tokens_used: 50,
                credit_charged: 1,
                remaining_credits: Some(4),
            },
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["appliedFilters"]["length"], "short");
        assert_eq!(json["metadata"]["creditCharged"], 1);
        assert_eq!(json["metadata"]["remainingCredits"], 4);
        assert!(json.get("rationale").is_none());
    }
}
