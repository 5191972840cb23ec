use serde::{Deserialize, Serialize};

use crate::model::{AnswerOption, QuestionId};

//
// ─── TRANSLATION STATE ────────────────────────────────────────────────────────
//

/// Which rendition of the question text is currently held in memory.
///
/// Tracked explicitly per question rather than re-derived from script
/// presence, so short numeric questions cannot be misclassified and
/// "translated back to original" is distinguishable from "never translated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationState {
    Original,
    Translated,
}

/// Direction of a translation request.
///
/// Moving back to the original is a symmetric request for the canonical text
/// by question id; the client never reconstructs originals locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslationDirection {
    #[serde(rename = "target")]
    ToTarget,
    #[serde(rename = "original")]
    ToOriginal,
}

impl TranslationDirection {
    /// The state a question must be in to need a request in this direction.
    #[must_use]
    pub fn source_state(&self) -> TranslationState {
        match self {
            Self::ToTarget => TranslationState::Original,
            Self::ToOriginal => TranslationState::Translated,
        }
    }

    /// The state a question ends up in once a response is merged.
    #[must_use]
    pub fn result_state(&self) -> TranslationState {
        match self {
            Self::ToTarget => TranslationState::Translated,
            Self::ToOriginal => TranslationState::Original,
        }
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        match self {
            Self::ToTarget => Self::ToOriginal,
            Self::ToOriginal => Self::ToTarget,
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Replacement text for one question, as returned by the translation endpoint.
///
/// Carries the full per-field tuple (stem plus all four options) so a merge
/// is a plain field-wise overwrite, idempotent for equal data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedText {
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

/// One multiple-choice question of the exam set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    translation: TranslationState,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: [String; 4],
        translation: TranslationState,
    ) -> Self {
        let [option_a, option_b, option_c, option_d] = options;
        Self {
            id,
            text: text.into(),
            option_a,
            option_b,
            option_c,
            option_d,
            translation,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The display text for one of the four choices.
    #[must_use]
    pub fn option(&self, option: AnswerOption) -> &str {
        match option {
            AnswerOption::A => &self.option_a,
            AnswerOption::B => &self.option_b,
            AnswerOption::C => &self.option_c,
            AnswerOption::D => &self.option_d,
        }
    }

    #[must_use]
    pub fn translation(&self) -> TranslationState {
        self.translation
    }

    /// Overwrite the question's text fields with a translation payload.
    ///
    /// Late or duplicate payloads are harmless: equal data overwrites itself
    /// and the state simply lands on the direction's result state again.
    pub fn apply_text(&mut self, patch: &TranslatedText, state: TranslationState) {
        self.text = patch.text.clone();
        self.option_a = patch.option_a.clone();
        self.option_b = patch.option_b.clone();
        self.option_c = patch.option_c.clone();
        self.option_d = patch.option_d.clone();
        self.translation = state;
    }
}
