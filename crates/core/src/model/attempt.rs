use std::collections::HashMap;
use thiserror::Error;

use crate::model::{
    AnswerOption, AttemptId, Language, Question, QuestionId, QuestionResponse, TranslatedText,
    TranslationState,
};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt has no questions")]
    NoQuestions,

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    #[error("response references unknown question id: {0}")]
    UnknownQuestion(QuestionId),
}

//
// ─── STATUS ───────────────────────────────────────────────────────────────────
//

/// Lifecycle status of an attempt as the backend sees it.
///
/// `Submitted` is terminal: once reached, answers, marks and timers are
/// frozen for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
}

//
// ─── ATTEMPT SESSION ──────────────────────────────────────────────────────────
//

/// The in-memory record of one timed exam attempt.
///
/// Questions and responses are kept apart on purpose: translation merges
/// touch only the question sequence, answer operations touch only the
/// response map, so the two never contend on the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSession {
    id: AttemptId,
    status: AttemptStatus,
    duration_seconds: u32,
    elapsed_at_load_seconds: u32,
    language: Language,
    questions: Vec<Question>,
    responses: HashMap<QuestionId, QuestionResponse>,
}

impl AttemptSession {
    /// Build an attempt session from a fetched snapshot.
    ///
    /// `responses` seeds previously persisted answers/marks; every key must
    /// refer to a question in the sequence.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NoQuestions` for an empty exam set,
    /// `AttemptError::DuplicateQuestion` for repeated ids, and
    /// `AttemptError::UnknownQuestion` for orphaned responses.
    pub fn new(
        id: AttemptId,
        status: AttemptStatus,
        duration_seconds: u32,
        elapsed_at_load_seconds: u32,
        language: Language,
        questions: Vec<Question>,
        responses: HashMap<QuestionId, QuestionResponse>,
    ) -> Result<Self, AttemptError> {
        if questions.is_empty() {
            return Err(AttemptError::NoQuestions);
        }

        let mut seen = HashMap::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            if seen.insert(question.id(), index).is_some() {
                return Err(AttemptError::DuplicateQuestion(question.id()));
            }
        }
        if let Some(orphan) = responses.keys().find(|id| !seen.contains_key(id)) {
            return Err(AttemptError::UnknownQuestion(*orphan));
        }

        Ok(Self {
            id,
            status,
            duration_seconds,
            elapsed_at_load_seconds,
            language,
            questions,
            responses,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn elapsed_at_load_seconds(&self) -> u32 {
        self.elapsed_at_load_seconds
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_by_id(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn index_of(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id() == id)
    }

    /// The user's current response for a question; absent means untouched.
    #[must_use]
    pub fn response(&self, id: QuestionId) -> QuestionResponse {
        self.responses.get(&id).copied().unwrap_or_default()
    }

    // ── Answer mutations (no-ops unless in progress) ──

    /// Set the selected option, preserving the review mark.
    ///
    /// Returns the resulting response, or `None` if the attempt is terminal
    /// or the question id is unknown.
    pub fn select_option(
        &mut self,
        id: QuestionId,
        option: AnswerOption,
    ) -> Option<QuestionResponse> {
        self.update_response(id, |r| r.with_selection(Some(option)))
    }

    /// Remove the selected option only; the review mark is untouched.
    pub fn clear_selection(&mut self, id: QuestionId) -> Option<QuestionResponse> {
        self.update_response(id, |r| r.with_selection(None))
    }

    /// Flip the review mark, independent of whether the question is answered.
    pub fn toggle_mark(&mut self, id: QuestionId) -> Option<QuestionResponse> {
        self.update_response(id, QuestionResponse::with_mark_toggled)
    }

    fn update_response(
        &mut self,
        id: QuestionId,
        apply: impl FnOnce(QuestionResponse) -> QuestionResponse,
    ) -> Option<QuestionResponse> {
        if !self.is_in_progress() || self.question_by_id(id).is_none() {
            return None;
        }
        let entry = self.responses.entry(id).or_default();
        *entry = apply(*entry);
        Some(*entry)
    }

    // ── Translation merge ──

    /// Merge one translation payload into the question sequence.
    ///
    /// A payload for an id that is not in the sequence is dropped; stale or
    /// duplicate payloads overwrite with equal data and are no-ops in effect.
    /// Returns whether a question was touched.
    pub fn apply_translation(
        &mut self,
        id: QuestionId,
        patch: &TranslatedText,
        state: TranslationState,
    ) -> bool {
        if self.status == AttemptStatus::Submitted {
            return false;
        }
        match self.questions.iter_mut().find(|q| q.id() == id) {
            Some(question) => {
                question.apply_text(patch, state);
                true
            }
            None => false,
        }
    }

    // ── Terminal transition ──

    /// Freeze the attempt. Idempotent.
    pub fn mark_submitted(&mut self) {
        self.status = AttemptStatus::Submitted;
    }

    // ── Derived counts ──

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.responses.values().filter(|r| r.is_answered()).count()
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.responses
            .values()
            .filter(|r| r.marked_for_review)
            .count()
    }

    #[must_use]
    pub fn marked_and_answered_count(&self) -> usize {
        self.responses
            .values()
            .filter(|r| r.marked_for_review && r.is_answered())
            .count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.question_count().saturating_sub(self.answered_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranslationState;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            ["A1".into(), "A2".into(), "A3".into(), "A4".into()],
            TranslationState::Original,
        )
    }

    fn build_attempt(question_ids: &[u64]) -> AttemptSession {
        AttemptSession::new(
            AttemptId::new(10),
            AttemptStatus::InProgress,
            3_600,
            0,
            Language::English,
            question_ids.iter().copied().map(build_question).collect(),
            HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn empty_exam_set_is_rejected() {
        let err = AttemptSession::new(
            AttemptId::new(1),
            AttemptStatus::InProgress,
            600,
            0,
            Language::English,
            Vec::new(),
            HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::NoQuestions);
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let err = AttemptSession::new(
            AttemptId::new(1),
            AttemptStatus::InProgress,
            600,
            0,
            Language::English,
            vec![build_question(1), build_question(1)],
            HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::DuplicateQuestion(QuestionId::new(1)));
    }

    #[test]
    fn orphan_responses_are_rejected() {
        let mut responses = HashMap::new();
        responses.insert(QuestionId::new(99), QuestionResponse::default());
        let err = AttemptSession::new(
            AttemptId::new(1),
            AttemptStatus::InProgress,
            600,
            0,
            Language::English,
            vec![build_question(1)],
            responses,
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::UnknownQuestion(QuestionId::new(99)));
    }

    #[test]
    fn last_selection_wins_and_mark_survives() {
        let mut attempt = build_attempt(&[1, 2]);
        let q1 = QuestionId::new(1);

        attempt.toggle_mark(q1).unwrap();
        attempt.select_option(q1, AnswerOption::A).unwrap();
        attempt.select_option(q1, AnswerOption::C).unwrap();

        let response = attempt.response(q1);
        assert_eq!(response.selected, Some(AnswerOption::C));
        assert!(response.marked_for_review);

        attempt.clear_selection(q1).unwrap();
        let response = attempt.response(q1);
        assert_eq!(response.selected, None);
        assert!(response.marked_for_review);
    }

    #[test]
    fn mutations_after_submit_are_ignored() {
        let mut attempt = build_attempt(&[1]);
        let q1 = QuestionId::new(1);
        attempt.select_option(q1, AnswerOption::B).unwrap();
        attempt.mark_submitted();

        assert!(attempt.select_option(q1, AnswerOption::D).is_none());
        assert!(attempt.toggle_mark(q1).is_none());
        assert!(attempt.clear_selection(q1).is_none());
        assert_eq!(attempt.response(q1).selected, Some(AnswerOption::B));

        let patch = TranslatedText {
            text: "x".into(),
            option_a: "x".into(),
            option_b: "x".into(),
            option_c: "x".into(),
            option_d: "x".into(),
        };
        assert!(!attempt.apply_translation(q1, &patch, TranslationState::Translated));
    }

    #[test]
    fn unknown_question_mutations_are_ignored() {
        let mut attempt = build_attempt(&[1]);
        assert!(
            attempt
                .select_option(QuestionId::new(42), AnswerOption::A)
                .is_none()
        );
    }

    #[test]
    fn answered_and_marked_counts() {
        let mut attempt = build_attempt(&[1, 2, 3]);
        attempt.select_option(QuestionId::new(1), AnswerOption::B).unwrap();
        attempt.toggle_mark(QuestionId::new(2)).unwrap();

        assert_eq!(attempt.answered_count(), 1);
        assert_eq!(attempt.marked_count(), 1);
        assert_eq!(attempt.marked_and_answered_count(), 0);
        assert_eq!(attempt.unanswered_count(), 2);
    }

    #[test]
    fn translation_merge_targets_by_id() {
        let mut attempt = build_attempt(&[1, 2]);
        let patch = TranslatedText {
            text: "प्रश्न".into(),
            option_a: "क".into(),
            option_b: "ख".into(),
            option_c: "ग".into(),
            option_d: "घ".into(),
        };

        assert!(attempt.apply_translation(QuestionId::new(2), &patch, TranslationState::Translated));
        assert!(!attempt.apply_translation(QuestionId::new(9), &patch, TranslationState::Translated));

        assert_eq!(attempt.question_at(0).unwrap().text(), "Question 1");
        assert_eq!(attempt.question_at(1).unwrap().text(), "प्रश्न");
        assert_eq!(
            attempt.question_at(1).unwrap().translation(),
            TranslationState::Translated
        );
    }
}
