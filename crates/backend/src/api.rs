//! Contracts for the collaborator endpoints the exam session consumes.
//!
//! The session controller only ever talks to these traits; the HTTP adapter
//! and the in-memory test double both live behind them. Payload structs
//! mirror the wire format so adapters can serialize/deserialize without
//! leaking transport concerns into the domain layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use exam_core::model::{
    AnswerOption, AttemptError, AttemptId, AttemptSession, AttemptStatus, Language, Question,
    QuestionId, QuestionResponse, ResultId, TranslatedText, TranslationDirection,
    infer_translation_state,
};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// The endpoint answered with something other than the expected
    /// structured format (e.g. an HTML error page).
    #[error("unexpected content type: {0:?}")]
    UnexpectedContentType(Option<String>),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

//
// ─── SNAPSHOT PAYLOADS ────────────────────────────────────────────────────────
//

/// Previously persisted answer state embedded in the attempt snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    pub selected_option: Option<AnswerOption>,
    #[serde(default)]
    pub marked_for_review: bool,
}

/// One question as delivered by `GET attempt/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
    pub question_id: QuestionId,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    #[serde(default)]
    pub response: Option<ResponseSnapshot>,
}

/// The full attempt snapshot returned by the attempt-fetch endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSnapshot {
    pub attempt_id: AttemptId,
    pub status: AttemptStatus,
    pub duration_seconds: u32,
    pub elapsed_seconds: u32,
    pub language: Language,
    pub questions: Vec<QuestionSnapshot>,
}

impl AttemptSnapshot {
    /// Convert the snapshot into the in-memory attempt session.
    ///
    /// Prior responses are seeded into the response map; each question's
    /// translation state is seeded from script presence in the snapshot text
    /// (a resumed Hindi attempt may arrive partially translated).
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` for an empty, duplicated, or inconsistent
    /// question set.
    pub fn into_session(self) -> Result<AttemptSession, AttemptError> {
        let language = self.language;
        let mut questions = Vec::with_capacity(self.questions.len());
        let mut responses = HashMap::new();

        for snapshot in self.questions {
            if let Some(prior) = snapshot.response {
                responses.insert(
                    snapshot.question_id,
                    QuestionResponse {
                        selected: prior.selected_option,
                        marked_for_review: prior.marked_for_review,
                    },
                );
            }
            let state = infer_translation_state(&snapshot.text, language);
            questions.push(Question::new(
                snapshot.question_id,
                snapshot.text,
                [
                    snapshot.option_a,
                    snapshot.option_b,
                    snapshot.option_c,
                    snapshot.option_d,
                ],
                state,
            ));
        }

        AttemptSession::new(
            self.attempt_id,
            self.status,
            self.duration_seconds,
            self.elapsed_seconds,
            language,
            questions,
            responses,
        )
    }
}

//
// ─── REQUEST PAYLOADS ─────────────────────────────────────────────────────────
//

/// Body of `POST attempt/{id}/answer`.
///
/// Always carries the full response tuple so replaying the same call is
/// idempotent on the backend; a cleared selection is an explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerPayload {
    pub question_id: QuestionId,
    pub selected_option: Option<AnswerOption>,
    pub marked_for_review: bool,
}

/// Body of `POST attempt/{id}/mark-review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPayload {
    pub question_id: QuestionId,
    pub marked_for_review: bool,
}

/// Body of `POST attempt/{id}/translate-questions`: one batched call per
/// prefetch window, never one call per question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub question_ids: Vec<QuestionId>,
    pub direction: TranslationDirection,
}

/// Per-question replacement text in a translation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedTextPayload {
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl TranslatedTextPayload {
    #[must_use]
    pub fn into_text(self) -> TranslatedText {
        TranslatedText {
            text: self.text,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
        }
    }

    #[must_use]
    pub fn from_text(text: &TranslatedText) -> Self {
        Self {
            text: text.text.clone(),
            option_a: text.option_a.clone(),
            option_b: text.option_b.clone(),
            option_c: text.option_c.clone(),
            option_d: text.option_d.clone(),
        }
    }
}

/// Response of the translation endpoint. Questions absent from the map are
/// left untouched by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translations: HashMap<QuestionId, TranslatedTextPayload>,
}

/// Response of `POST attempt/{id}/submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub result_id: ResultId,
}

//
// ─── ENDPOINT CONTRACTS ───────────────────────────────────────────────────────
//

/// One-shot attempt fetch.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fetch the attempt snapshot.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on network failure, non-success status, or a
    /// response that is not the expected structured format.
    async fn fetch_attempt(&self, id: AttemptId) -> Result<AttemptSnapshot, BackendError>;
}

/// Fire-and-forget sink for answers and review marks.
#[async_trait]
pub trait ResponsePersistence: Send + Sync {
    /// Persist the full response tuple for one question.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on network failure or non-success status.
    async fn save_answer(&self, id: AttemptId, answer: &AnswerPayload)
    -> Result<(), BackendError>;

    /// Persist the review mark only (the smaller of the two endpoints).
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on network failure or non-success status.
    async fn save_mark(&self, id: AttemptId, mark: &MarkPayload) -> Result<(), BackendError>;
}

/// Stateless text-in/text-out translation of question content.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate (or restore) the requested questions in one batch.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on network failure, non-success status, or a
    /// malformed payload.
    async fn translate(
        &self,
        id: AttemptId,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse, BackendError>;
}

/// The terminal submission endpoint.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Submit the attempt, yielding the result id used to route onward.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on network failure, non-success status, or a
    /// response that is not the expected structured format.
    async fn submit(&self, id: AttemptId) -> Result<ResultId, BackendError>;
}
