//! Text-generation service contract.
//!
//! The service itself (and the network call behind it) lives outside this
//! crate. Here we only define what the rest of the system needs from it:
//! the prompt we send, the raw text we get back, and a small fixed set of
//! failure kinds that map to user-facing messages.

use crate::parser::parse_suggestions;
use crate::{Exercise, Result, SuggestionDefaults};
use std::fmt;

/// Classified service failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationErrorKind {
    Auth,
    RateLimit,
    ModelUnavailable,
    Timeout,
    MalformedResponse,
    Generic,
}

impl GenerationErrorKind {
    /// Message shown to the user for this kind of failure
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationErrorKind::Auth => {
                "Authentication error. Please check your API configuration."
            }
            GenerationErrorKind::RateLimit => {
                "API rate limit exceeded. Please wait a moment and try again."
            }
            GenerationErrorKind::ModelUnavailable => "Model unavailable. Please try again later.",
            GenerationErrorKind::Timeout => "Request timeout - the API took too long to respond.",
            GenerationErrorKind::MalformedResponse => "Invalid response format from AI service.",
            GenerationErrorKind::Generic => {
                "An error occurred while generating suggestions. Please try again."
            }
        }
    }
}

/// A failed generation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationError {
    pub kind: GenerationErrorKind,
    /// Provider detail, for logs only
    pub detail: String,
}

impl GenerationError {
    pub fn new(kind: GenerationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Build an error by classifying raw provider text
    pub fn from_provider_message(message: &str) -> Self {
        Self::new(classify_failure(message), message)
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.user_message())
    }
}

impl std::error::Error for GenerationError {}

/// Map a provider error message onto a failure kind
pub fn classify_failure(message: &str) -> GenerationErrorKind {
    let lower = message.to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if mentions(&["timeout", "timed out"]) {
        GenerationErrorKind::Timeout
    } else if mentions(&["api_key", "api key", "key", "unauthorized", "401", "403"]) {
        GenerationErrorKind::Auth
    } else if mentions(&["quota", "limit", "429"]) {
        GenerationErrorKind::RateLimit
    } else if mentions(&["model", "not found"]) {
        GenerationErrorKind::ModelUnavailable
    } else {
        GenerationErrorKind::Generic
    }
}

/// Something that turns a workout request into raw exercise text
pub trait GenerationService {
    fn generate(
        &self,
        prompt: &str,
        equipment: &[String],
    ) -> std::result::Result<String, GenerationError>;
}

/// Adapter over text that has already been retrieved (a file, stdin, a cache)
#[derive(Clone, Debug)]
pub struct TextResponse {
    text: String,
}

impl TextResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl GenerationService for TextResponse {
    fn generate(
        &self,
        _prompt: &str,
        _equipment: &[String],
    ) -> std::result::Result<String, GenerationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(GenerationError::new(
                GenerationErrorKind::MalformedResponse,
                "response contained no text",
            ));
        }
        Ok(text.to_string())
    }
}

/// Instructions sent to the service for a user request
///
/// When equipment is given, the service is told to stay within it.
pub fn build_prompt(request: &str, equipment: &[String]) -> String {
    let constraint = if equipment.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nIMPORTANT: Only suggest exercises that can be performed using the following \
             equipment: {}. Do not suggest exercises that require equipment not in this list.",
            equipment.join(", ")
        )
    };

    format!(
        r#"Generate a strength training workout based on this request:

"{request}"{constraint}

Return a list of exercises. For each exercise, include:
- Exercise name (just the name, no numbers or qualifiers)
- Recommended reps as a single number (if applicable)
- Recommended sets (if applicable)

IMPORTANT FORMATTING RULES:
- Use format: "Exercise Name - X reps, Y sets"
- For rep ranges (e.g., 12-15), use the first number only: "12 reps"
- For "per leg" or "per side" exercises, include total reps (e.g., "10 reps per leg" should be "10 reps")
- For time-based exercises (e.g., 45-60 seconds), use the first number as reps: "45 reps"
- Do NOT include "per leg", "per side", or time units in the exercise name
- Keep exercise names simple and clean
- Bodyweight exercises (push-ups, squats, planks, etc.) should be clearly named - the system will automatically detect them

Only return the exercise list. One exercise per line. No commentary or extra text."#,
        request = request.trim(),
        constraint = constraint,
    )
}

/// Ask the service for exercises and turn its answer into workout entries
///
/// Suggestions missing reps or sets receive `defaults`. An answer with no
/// usable lines is an empty list, not an error.
pub fn suggest_exercises(
    service: &dyn GenerationService,
    request: &str,
    equipment: &[String],
    defaults: SuggestionDefaults,
) -> Result<Vec<Exercise>> {
    let prompt = build_prompt(request, equipment);
    let text = service.generate(&prompt, equipment).map_err(|e| {
        tracing::warn!("Generation failed ({:?}): {}", e.kind, e.detail);
        e
    })?;

    let exercises = parse_suggestions(&text)
        .into_iter()
        .map(|s| s.into_exercise(defaults))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("Generated {} exercises", exercises.len());
    Ok(exercises)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct FailingService(&'static str);

    impl GenerationService for FailingService {
        fn generate(
            &self,
            _prompt: &str,
            _equipment: &[String],
        ) -> std::result::Result<String, GenerationError> {
            Err(GenerationError::from_provider_message(self.0))
        }
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure("API_KEY_INVALID"),
            GenerationErrorKind::Auth
        );
        assert_eq!(
            classify_failure("Resource has been exhausted (e.g. check quota)."),
            GenerationErrorKind::RateLimit
        );
        assert_eq!(classify_failure("HTTP 429"), GenerationErrorKind::RateLimit);
        assert_eq!(
            classify_failure("models/gemini-x is not found"),
            GenerationErrorKind::ModelUnavailable
        );
        assert_eq!(
            classify_failure("request timed out after 30s"),
            GenerationErrorKind::Timeout
        );
        assert_eq!(
            classify_failure("Internal error"),
            GenerationErrorKind::Generic
        );
    }

    #[test]
    fn test_error_display_hides_detail() {
        let err = GenerationError::from_provider_message("API key sk-123 rejected");
        assert_eq!(err.kind, GenerationErrorKind::Auth);
        assert!(!err.to_string().contains("sk-123"));
    }

    #[test]
    fn test_prompt_equipment_constraint() {
        let prompt = build_prompt("  upper body  ", &[]);
        assert!(prompt.contains("\"upper body\""));
        assert!(!prompt.contains("following equipment"));

        let equipment = vec!["Dumbbells".to_string(), "Bench".to_string()];
        let prompt = build_prompt("upper body", &equipment);
        assert!(prompt.contains("following equipment: Dumbbells, Bench."));
    }

    #[test]
    fn test_suggest_applies_defaults() {
        let service = TextResponse::new(
            "1. Push-ups - 12 reps, 3 sets\n2. Dumbbell Row\n3. Plank - 30-45 seconds\n",
        );
        let exercises = suggest_exercises(
            &service,
            "quick full body",
            &[],
            SuggestionDefaults { reps: 8, sets: 4 },
        )
        .unwrap();

        assert_eq!(exercises.len(), 3);
        assert_eq!((exercises[0].reps, exercises[0].sets), (12, 3));
        assert_eq!((exercises[1].reps, exercises[1].sets), (8, 4));
        assert!(!exercises[1].is_bodyweight);
        assert_eq!((exercises[2].reps, exercises[2].sets), (30, 4));
        assert!(exercises[2].is_bodyweight);
    }

    #[test]
    fn test_empty_response_is_malformed() {
        let err = suggest_exercises(
            &TextResponse::new("   "),
            "legs",
            &[],
            SuggestionDefaults::default(),
        )
        .unwrap_err();

        match err {
            Error::Generation(e) => assert_eq!(e.kind, GenerationErrorKind::MalformedResponse),
            other => panic!("Expected generation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unusable_response_yields_no_exercises() {
        let exercises = suggest_exercises(
            &TextResponse::new("---\n::\n"),
            "legs",
            &[],
            SuggestionDefaults::default(),
        )
        .unwrap();
        assert!(exercises.is_empty());
    }

    #[test]
    fn test_service_failure_propagates() {
        let err = suggest_exercises(
            &FailingService("quota exceeded"),
            "legs",
            &[],
            SuggestionDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Generation(GenerationError {
                kind: GenerationErrorKind::RateLimit,
                ..
            })
        ));
    }
}
