use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::TranslationState;

/// Errors that can occur when parsing a language code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language: {0}")]
pub struct ParseLanguageError(pub String);

/// The language chosen when the attempt was started.
///
/// Immutable for the life of the attempt. Question content is authored in
/// English; attempts taken in Hindi rely on the translation endpoint to
/// render questions in Devanagari script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "hi", alias = "hindi")]
    Hindi,
}

impl Language {
    /// True when question content must be translated into a target script.
    #[must_use]
    pub fn requires_translation(&self) -> bool {
        matches!(self, Self::Hindi)
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "hi" | "hindi" => Ok(Self::Hindi),
            other => Err(ParseLanguageError(other.to_string())),
        }
    }
}

/// True if the text contains at least one character from the Devanagari block.
#[must_use]
pub fn contains_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Seed a question's translation state from snapshot text.
///
/// Script presence is a heuristic, not ground truth: a purely numeric or
/// symbolic question can look untranslated even after translation. It is only
/// used to seed state when an attempt resumes with partially translated
/// content; afterwards the explicit per-question state is authoritative.
#[must_use]
pub fn infer_translation_state(text: &str, language: Language) -> TranslationState {
    if language.requires_translation() && contains_devanagari(text) {
        TranslationState::Translated
    } else {
        TranslationState::Original
    }
}
