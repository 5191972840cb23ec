mod answer;
mod attempt;
mod ids;
mod language;
mod question;

pub use answer::{AnswerOption, ParseOptionError, QuestionResponse};
pub use attempt::{AttemptError, AttemptSession, AttemptStatus};
pub use ids::{AttemptId, ParseIdError, QuestionId, ResultId};
pub use language::{Language, ParseLanguageError, contains_devanagari, infer_translation_state};
pub use question::{Question, TranslatedText, TranslationDirection, TranslationState};
