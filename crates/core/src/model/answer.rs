use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ANSWER OPTION ────────────────────────────────────────────────────────────
//

/// Errors that can occur when parsing an answer option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown answer option: {0}")]
pub struct ParseOptionError(pub String);

/// One of the four choices of a multiple-choice question.
///
/// Serialized as the bare letter (`"A"`..`"D"`), which is also the wire
/// representation the answer-persistence endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
}

impl AnswerOption {
    /// All options in display order.
    pub const ALL: [AnswerOption; 4] = [Self::A, Self::B, Self::C, Self::D];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerOption {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(ParseOptionError(other.to_string())),
        }
    }
}

//
// ─── QUESTION RESPONSE ────────────────────────────────────────────────────────
//

/// The user's state for a single question: selection plus review mark.
///
/// `selected` is never defaulted: `None` means "not answered", which is a
/// different fact than any answered value. The mark is independent of whether
/// the question is answered; it exists purely for the user's own triage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionResponse {
    pub selected: Option<AnswerOption>,
    pub marked_for_review: bool,
}

impl QuestionResponse {
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    /// Returns a copy with the selection replaced and the mark preserved.
    #[must_use]
    pub fn with_selection(self, selected: Option<AnswerOption>) -> Self {
        Self { selected, ..self }
    }

    /// Returns a copy with the mark flipped and the selection preserved.
    #[must_use]
    pub fn with_mark_toggled(self) -> Self {
        Self {
            marked_for_review: !self.marked_for_review,
            ..self
        }
    }
}
