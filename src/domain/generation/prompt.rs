//! Prompt construction and response parsing for email generation

use once_cell::sync::Lazy;
use regex::Regex;

use super::{GenerationRequest, Language, LengthOption};

pub const RATIONALE_SEPARATOR: &str = "---RATIONALE---";

static SEPARATOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[-=]{3,}\s*(RATIONALE|피드백|FEEDBACK)\s*[-=]{3,}")
        .expect("valid separator pattern")
});

pub fn build_system_prompt(language: Language) -> String {
    let language_name = match language {
        Language::Ko => "Korean",
        Language::En => "English",
    };

    format!(
        "You are an expert email writing assistant specializing in professional and personal correspondence. \
         Your goal is to refine user input into well-structured, appropriate emails while maintaining the user's core message. \
         Always respond in {}.",
        language_name
    )
}

/// User instruction embedding the draft and constraints.
/// `include_rationale` is the effective flag, not the raw request field.
pub fn build_user_prompt(request: &GenerationRequest, include_rationale: bool) -> String {
    let korean = request.language == Language::Ko;
    let mut prompt = String::new();

    if korean {
        prompt.push_str(&format!(
            "다음 내용을 바탕으로 이메일을 작성해주세요:\n\"{}\"\n",
            request.draft
        ));
    } else {
        prompt.push_str(&format!(
            "Please write an email based on the following content:\n\"{}\"\n",
            request.draft
        ));
    }

    let mut constraints = Vec::new();

    if let Some(ref relationship) = request.relationship {
        let label = relationship_label(relationship, korean);
        constraints.push(if korean {
            format!("- 수신자와의 관계: {}", label)
        } else {
            format!("- Relationship to recipient: {}", label)
        });
    }

    if let Some(ref purpose) = request.purpose {
        let label = purpose_label(purpose, korean);
        constraints.push(if korean {
            format!("- 이메일 목적: {}", label)
        } else {
            format!("- Purpose: {}", label)
        });
    }

    if let Some(ref tone) = request.tone {
        let label = tone_label(tone, korean);
        constraints.push(if korean {
            format!("- 톤: {}", label)
        } else {
            format!("- Tone: {}", label)
        });
    }

    if let Some(length) = request.length {
        let label = length_label(length, korean);
        constraints.push(if korean {
            format!("- 길이: {}", label)
        } else {
            format!("- Length: {}", label)
        });
    }

    if constraints.is_empty() {
        prompt.push_str(if korean {
            "\n상황에 가장 적절한 형식으로 작성해주세요."
        } else {
            "\nPlease write in the most appropriate format for the situation."
        });
    } else {
        prompt.push_str(if korean {
            "\n다음 조건을 고려해주세요:\n"
        } else {
            "\nPlease consider the following conditions:\n"
        });
        prompt.push_str(&constraints.join("\n"));
    }

    if include_rationale {
        if korean {
            prompt.push_str(&format!(
                "\n\n응답 형식:\n1. 먼저 완성된 이메일을 작성하고\n2. \"{}\" 구분자 다음에\n3. 왜 이렇게 작성했는지 개선 근거를 상세히 설명해주세요.\n   (어떤 표현을 선택했는지, 왜 그 톤을 사용했는지, 구조는 왜 이렇게 했는지 등)",
                RATIONALE_SEPARATOR
            ));
        } else {
            prompt.push_str(&format!(
                "\n\nResponse format:\n1. First, write the complete email\n2. After the \"{}\" separator\n3. Explain in detail why you wrote it this way.\n   (Which expressions you chose, why you used that tone, why you structured it this way, etc.)",
                RATIONALE_SEPARATOR
            ));
        }
    } else {
        prompt.push_str(if korean {
            "\n\n완성된 이메일만 작성해주세요."
        } else {
            "\n\nPlease write only the completed email."
        });
    }

    prompt
}

fn relationship_label(value: &str, korean: bool) -> String {
    let label = match (value, korean) {
        ("professor", true) => "교수님",
        ("supervisor", true) => "상사",
        ("colleague", true) => "동료",
        ("client", true) => "고객",
        ("friend", true) => "친구",
        _ => value,
    };
    label.to_string()
}

fn purpose_label(value: &str, korean: bool) -> String {
    let label = match (value, korean) {
        ("request", true) => "요청",
        ("apology", true) => "사과",
        ("thank", true) => "감사",
        ("inquiry", true) => "문의",
        ("report", true) => "보고",
        _ => value,
    };
    label.to_string()
}

fn tone_label(value: &str, korean: bool) -> String {
    let label = match (value, korean) {
        ("formal", true) => "격식있는",
        ("polite", true) => "공손한",
        ("casual", true) => "캐주얼",
        ("friendly", true) => "친근한",
        _ => value,
    };
    label.to_string()
}

fn length_label(length: LengthOption, korean: bool) -> &'static str {
    match (length, korean) {
        (LengthOption::Short, true) => "짧고 간결하게",
        (LengthOption::Medium, true) => "적당한 길이로",
        (LengthOption::Long, true) => "상세하게",
        (LengthOption::Short, false) => "short and concise",
        (LengthOption::Medium, false) => "moderate length",
        (LengthOption::Long, false) => "detailed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGeneration {
    pub email: String,
    pub rationale: Option<String>,
}

/// Split model output into the email and an optional rationale
pub fn parse_generation(text: &str) -> ParsedGeneration {
    let parts: Vec<&str> = SEPARATOR_PATTERN.split(text).collect();

    if parts.len() < 2 {
        return ParsedGeneration {
            email: text.trim().to_string(),
            rationale: None,
        };
    }

    let rationale = parts[parts.len() - 1].trim();

    ParsedGeneration {
        email: parts[0].trim().to_string(),
        rationale: if rationale.is_empty() {
            None
        } else {
            Some(rationale.to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(language: Language) -> GenerationRequest {
        GenerationRequest {
            draft: "내일 면담 가능한지 여쭙고 싶어요".to_string(),
            language,
            relationship: None,
            purpose: None,
            tone: None,
            length: None,
            include_rationale: false,
            save_as_archive: true,
        }
    }

    #[test]
    fn test_system_prompt_language() {
        assert!(build_system_prompt(Language::Ko).ends_with("Always respond in Korean."));
        assert!(build_system_prompt(Language::En).ends_with("Always respond in English."));
    }

    #[test]
    fn test_user_prompt_without_constraints() {
        let prompt = build_user_prompt(&request(Language::Ko), false);

        assert!(prompt.contains("내일 면담 가능한지 여쭙고 싶어요"));
        assert!(prompt.contains("상황에 가장 적절한 형식으로"));
        assert!(prompt.ends_with("완성된 이메일만 작성해주세요."));
    }

    #[test]
    fn test_user_prompt_labels() {
        let mut req = request(Language::Ko);
        req.relationship = Some("professor".into());
        req.tone = Some("formal".into());
        req.purpose = Some("my own purpose".into());
        req.length = Some(LengthOption::Short);

        let prompt = build_user_prompt(&req, false);
        assert!(prompt.contains("- 수신자와의 관계: 교수님"));
        assert!(prompt.contains("- 톤: 격식있는"));
        assert!(prompt.contains("- 이메일 목적: my own purpose"));
        assert!(prompt.contains("- 길이: 짧고 간결하게"));
    }

    #[test]
    fn test_user_prompt_rationale_instructions() {
        let prompt = build_user_prompt(&request(Language::En), true);
        assert!(prompt.contains(RATIONALE_SEPARATOR));
        assert!(!prompt.contains("Please write only the completed email."));
    }

    #[test]
    fn test_parse_with_separator() {
        let parsed = parse_generation("Dear Professor,\nThanks.\n---RATIONALE---\nUsed a formal tone.  ");
        assert_eq!(parsed.email, "Dear Professor,\nThanks.");
        assert_eq!(parsed.rationale.as_deref(), Some("Used a formal tone."));
    }

    #[test]
    fn test_parse_accepts_label_variants() {
        let parsed = parse_generation("본문\n=== 피드백 ===\n설명");
        assert_eq!(parsed.email, "본문");
        assert_eq!(parsed.rationale.as_deref(), Some("설명"));

        let parsed = parse_generation("Body\n----rationale----\nWhy");
        assert_eq!(parsed.rationale.as_deref(), Some("Why"));
    }

    #[test]
    fn test_parse_without_separator() {
        let parsed = parse_generation("  Just the email.  ");
        assert_eq!(parsed.email, "Just the email.");
        assert!(parsed.rationale.is_none());
    }
}
