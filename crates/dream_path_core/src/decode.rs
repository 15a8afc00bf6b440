//! crates/dream_path_core/src/decode.rs
//!
//! Parses provider output into typed artifacts. Providers often wrap the JSON in a
//! markdown fence or surround it with prose, so the array is cut out of the text
//! before parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::collections::HashSet;

use crate::domain::{FlashCard, GamePair, GenerationMode, GenerationResult, QuizQuestion};

static OPENING_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```[A-Za-z0-9_+-]*\s*").expect("opening fence pattern is valid")
});
static CLOSING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*```$").expect("closing fence pattern is valid"));

/// Raised when provider output cannot be turned into the expected artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct DecodeError {
    pub reason: String,
    /// The untouched provider output, kept for diagnostics.
    pub raw: String,
}

impl DecodeError {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// How much checking happens after a successful parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Accept whatever shape deserializes.
    #[default]
    Lenient,
    /// Also enforce the artifact schema (field contents, option counts, answer membership).
    Strict,
}

/// Removes a leading language-tagged or bare code fence and a trailing fence.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }
    let start = OPENING_FENCE.find(text).map_or(0, |m| m.end());
    let body = &text[start..];
    let end = CLOSING_FENCE.find(body).map_or(body.len(), |m| m.start());
    &body[..end]
}

/// Returns the span from the first `[` to the last `]`, if both exist in that order.
pub fn extract_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

/// Decodes a JSON array of `T` out of raw provider text.
pub fn decode_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, DecodeError> {
    let unfenced = strip_code_fence(raw);
    let candidate = extract_array(unfenced).unwrap_or(unfenced);
    serde_json::from_str(candidate).map_err(|e| DecodeError::new(e.to_string(), raw))
}

//=========================================================================================
// Schema Validation
//=========================================================================================

/// Post-parse checks applied under `DecodePolicy::Strict`.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("field `{field}` is empty"))
    } else {
        Ok(())
    }
}

impl Validate for FlashCard {
    fn validate(&self) -> Result<(), String> {
        require("term", &self.term)?;
        require("definition", &self.definition)
    }
}

impl Validate for GamePair {
    fn validate(&self) -> Result<(), String> {
        require("term", &self.term)?;
        require("match", &self.matched)
    }
}

impl Validate for QuizQuestion {
    fn validate(&self) -> Result<(), String> {
        require("question", &self.question)?;
        if self.options.len() != 4 {
            return Err(format!(
                "expected 4 options, found {}",
                self.options.len()
            ));
        }
        let unique: HashSet<&str> = self.options.iter().map(String::as_str).collect();
        if unique.len() != self.options.len() {
            return Err("options are not unique".to_string());
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(format!(
                "correctAnswer `{}` is not one of the options",
                self.correct_answer
            ));
        }
        Ok(())
    }
}

fn decode_items<T>(raw: &str, policy: DecodePolicy) -> Result<Vec<T>, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    let items: Vec<T> = decode_array(raw)?;
    if policy == DecodePolicy::Strict {
        if items.is_empty() {
            return Err(DecodeError::new("response contained no items", raw));
        }
        for (index, item) in items.iter().enumerate() {
            item.validate()
                .map_err(|reason| DecodeError::new(format!("item {index}: {reason}"), raw))?;
        }
    }
    Ok(items)
}

/// Maps provider output for `mode` into a typed result. Lesson text is returned untouched.
pub fn decode_artifact(
    mode: GenerationMode,
    raw: &str,
    policy: DecodePolicy,
) -> Result<GenerationResult, DecodeError> {
    Ok(match mode {
        GenerationMode::Lesson => GenerationResult::Lesson(raw.to_string()),
        GenerationMode::Flashcards => GenerationResult::Flashcards(decode_items(raw, policy)?),
        GenerationMode::Quiz => GenerationResult::Quiz(decode_items(raw, policy)?),
        GenerationMode::Game => GenerationResult::Game(decode_items(raw, policy)?),
    })
}
