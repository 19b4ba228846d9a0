//! User-text validation and safety screening.
//!
//! All free-text input (reflections, mentor messages, check-in notes)
//! passes through a length cap and a safety screen before any write.
//! The screen is a small set of regex patterns; messages that trip a
//! crisis pattern get crisis resources attached to the rejection so
//! the client can surface them.

use std::sync::LazyLock;

use regex::RegexSet;

/// Maximum length for user-generated text content.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Maximum length for mission titles and intents.
pub const MAX_MISSION_TEXT_LENGTH: usize = 200;

/// Maximum length for check-in notes.
pub const MAX_NOTE_LENGTH: usize = 500;

/// Severity of a safety violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    High,
    Critical,
}

/// A crisis support resource surfaced on critical rejections.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CrisisResource {
    pub name: &'static str,
    pub phone: &'static str,
    pub url: &'static str,
}

/// Crisis resources shown when self-harm or crisis language is detected.
pub const CRISIS_RESOURCES: &[CrisisResource] = &[
    CrisisResource {
        name: "988 Suicide & Crisis Lifeline",
        phone: "988",
        url: "https://988lifeline.org",
    },
    CrisisResource {
        name: "Crisis Text Line",
        phone: "Text HOME to 741741",
        url: "https://www.crisistextline.org",
    },
    CrisisResource {
        name: "SAMHSA National Helpline",
        phone: "1-800-662-4357",
        url: "https://www.samhsa.gov/find-help/national-helpline",
    },
];

/// A rejected text, with severity and user-facing message.
#[derive(Debug, Clone)]
pub struct TextRejection {
    pub severity: Severity,
    pub message: String,
    /// Present when the rejection should surface crisis resources.
    pub resources: bool,
}

static SELF_HARM_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(kill|harm|hurt|injure)\s+(yourself|myself|themselves|oneself)\b",
        r"(?i)\b(how to|ways to|methods to)\s+(die|kill yourself|end it|end life)\b",
        r"(?i)\b(suicide|self-harm|self-injury)\b",
    ])
    .expect("self-harm patterns compile")
});

static CRISIS_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(can't go on|want to die|end it all|no point|hopeless)\b",
        r"(?i)\b(thinking about|considering|planning)\s+(suicide|ending it|death)\b",
    ])
    .expect("crisis patterns compile")
});

static VIOLENCE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\b(kill|murder|harm|hurt|attack)\s+(someone|others|people|them)\b",
        r"(?i)\b(bomb|weapon|gun|knife|poison)\s+(threat|plan|attack)\b",
    ])
    .expect("violence patterns compile")
});

/// Validate free-form user text: length cap plus safety screen.
pub fn validate_user_text(text: &str) -> Result<(), TextRejection> {
    if text.is_empty() {
        return Ok(());
    }

    if text.len() > MAX_TEXT_LENGTH {
        return Err(TextRejection {
            severity: Severity::Low,
            message: format!("Text must be less than {MAX_TEXT_LENGTH} characters"),
            resources: false,
        });
    }

    if SELF_HARM_PATTERNS.is_match(text) || CRISIS_PATTERNS.is_match(text) {
        return Err(TextRejection {
            severity: Severity::Critical,
            message: "We're concerned about your wellbeing. Please reach out to a crisis \
                      support service for immediate help."
                .to_string(),
            resources: true,
        });
    }

    if VIOLENCE_PATTERNS.is_match(text) {
        return Err(TextRejection {
            severity: Severity::High,
            message: "Your message contains content that suggests harm to others. This type \
                      of content is not allowed."
                .to_string(),
            resources: false,
        });
    }

    Ok(())
}

/// Validate a mission title or intent (short text, no safety screen).
pub fn validate_mission_text(text: &str) -> Result<(), TextRejection> {
    if text.trim().is_empty() {
        return Err(TextRejection {
            severity: Severity::Low,
            message: "Text cannot be empty".to_string(),
            resources: false,
        });
    }
    if text.len() > MAX_MISSION_TEXT_LENGTH {
        return Err(TextRejection {
            severity: Severity::Low,
            message: format!("Text must be less than {MAX_MISSION_TEXT_LENGTH} characters"),
            resources: false,
        });
    }
    Ok(())
}

/// Truncate text to a maximum length on a char boundary.
#[must_use]
pub fn truncate_text(text: &str, max_length: usize) -> &str {
    if text.len() <= max_length {
        return text;
    }
    let mut end = max_length;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_text_passes() {
        assert!(validate_user_text("Had a productive day today.").is_ok());
        assert!(validate_user_text("").is_ok());
    }

    #[test]
    fn over_long_text_is_rejected() {
        let text = "a".repeat(MAX_TEXT_LENGTH + 1);
        let rejection = validate_user_text(&text).unwrap_err();
        assert_eq!(rejection.severity, Severity::Low);
    }

    #[test]
    fn crisis_language_is_critical_with_resources() {
        let rejection = validate_user_text("I feel hopeless and want to die").unwrap_err();
        assert_eq!(rejection.severity, Severity::Critical);
        assert!(rejection.resources);
    }

    #[test]
    fn violence_is_rejected_without_resources() {
        let rejection = validate_user_text("I want to attack someone tomorrow").unwrap_err();
        assert_eq!(rejection.severity, Severity::High);
        assert!(!rejection.resources);
    }

    #[test]
    fn mission_text_rejects_empty_and_long() {
        assert!(validate_mission_text("Morning Meditation").is_ok());
        assert!(validate_mission_text("   ").is_err());
        assert!(validate_mission_text(&"x".repeat(201)).is_err());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("héllo", 2), "h");
    }
}
