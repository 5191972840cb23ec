//! In-memory backend double for tests and offline runs.
//!
//! Records every call it receives and can be scripted to fail per endpoint
//! or to stall a submission behind a gate, which is how the controller's
//! single-flight guarantee is exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use exam_core::model::{AttemptId, QuestionId, ResultId, TranslatedText, TranslationDirection};

use crate::api::{
    AnswerPayload, AttemptRepository, AttemptSnapshot, BackendError, MarkPayload,
    ResponsePersistence, SubmissionGateway, TranslateRequest, TranslateResponse,
    TranslatedTextPayload, TranslationProvider,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct InMemoryBackend {
    snapshot: Mutex<Option<AttemptSnapshot>>,
    target_texts: Mutex<HashMap<QuestionId, TranslatedText>>,
    original_texts: Mutex<HashMap<QuestionId, TranslatedText>>,

    answers: Mutex<Vec<AnswerPayload>>,
    marks: Mutex<Vec<MarkPayload>>,
    translate_requests: Mutex<Vec<TranslateRequest>>,

    fail_persistence: AtomicBool,
    fail_translation: AtomicBool,
    fail_submit: AtomicBool,

    submit_calls: AtomicUsize,
    submit_gate: Mutex<Option<Arc<Notify>>>,
    next_result_id: AtomicU64,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_result_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_snapshot(snapshot: AttemptSnapshot) -> Self {
        let backend = Self::new();
        *lock(&backend.snapshot) = Some(snapshot);
        backend
    }

    pub fn set_snapshot(&self, snapshot: AttemptSnapshot) {
        *lock(&self.snapshot) = Some(snapshot);
    }

    /// Register the canned target-script rendition for one question.
    pub fn insert_target_text(&self, id: QuestionId, text: TranslatedText) {
        lock(&self.target_texts).insert(id, text);
    }

    /// Register the canonical original rendition for one question.
    pub fn insert_original_text(&self, id: QuestionId, text: TranslatedText) {
        lock(&self.original_texts).insert(id, text);
    }

    pub fn fail_persistence(&self, fail: bool) {
        self.fail_persistence.store(fail, Ordering::SeqCst);
    }

    pub fn fail_translation(&self, fail: bool) {
        self.fail_translation.store(fail, Ordering::SeqCst);
    }

    pub fn fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// Make the next submissions park until the returned gate is notified.
    pub fn hold_submit(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.submit_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_submit(&self) {
        if let Some(gate) = lock(&self.submit_gate).take() {
            // notify_one stores a permit, so an unparked-but-unregistered
            // waiter still gets through.
            gate.notify_one();
        }
    }

    // ── Recorded traffic ──

    #[must_use]
    pub fn answers(&self) -> Vec<AnswerPayload> {
        lock(&self.answers).clone()
    }

    #[must_use]
    pub fn marks(&self) -> Vec<MarkPayload> {
        lock(&self.marks).clone()
    }

    #[must_use]
    pub fn translate_requests(&self) -> Vec<TranslateRequest> {
        lock(&self.translate_requests).clone()
    }

    #[must_use]
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryBackend {
    async fn fetch_attempt(&self, _id: AttemptId) -> Result<AttemptSnapshot, BackendError> {
        lock(&self.snapshot)
            .clone()
            .ok_or_else(|| BackendError::Unavailable("no snapshot loaded".into()))
    }
}

#[async_trait]
impl ResponsePersistence for InMemoryBackend {
    async fn save_answer(
        &self,
        _id: AttemptId,
        answer: &AnswerPayload,
    ) -> Result<(), BackendError> {
        if self.fail_persistence.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("answer sink down".into()));
        }
        lock(&self.answers).push(answer.clone());
        Ok(())
    }

    async fn save_mark(&self, _id: AttemptId, mark: &MarkPayload) -> Result<(), BackendError> {
        if self.fail_persistence.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("mark sink down".into()));
        }
        lock(&self.marks).push(mark.clone());
        Ok(())
    }
}

#[async_trait]
impl TranslationProvider for InMemoryBackend {
    async fn translate(
        &self,
        _id: AttemptId,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse, BackendError> {
        lock(&self.translate_requests).push(request.clone());
        if self.fail_translation.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("translation down".into()));
        }

        let texts = match request.direction {
            TranslationDirection::ToTarget => lock(&self.target_texts),
            TranslationDirection::ToOriginal => lock(&self.original_texts),
        };
        // Questions without a canned rendition are simply absent from the
        // payload, which the caller must tolerate.
        let translations = request
            .question_ids
            .iter()
            .filter_map(|id| {
                texts
                    .get(id)
                    .map(|text| (*id, TranslatedTextPayload::from_text(text)))
            })
            .collect();
        Ok(TranslateResponse { translations })
    }
}

#[async_trait]
impl SubmissionGateway for InMemoryBackend {
    async fn submit(&self, _id: AttemptId) -> Result<ResultId, BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.submit_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("submit down".into()));
        }
        Ok(ResultId::new(self.next_result_id.fetch_add(1, Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{QuestionSnapshot, ResponseSnapshot};
    use exam_core::model::{AnswerOption, AttemptStatus, Language};

    fn snapshot() -> AttemptSnapshot {
        AttemptSnapshot {
            attempt_id: AttemptId::new(1),
            status: AttemptStatus::InProgress,
            duration_seconds: 600,
            elapsed_seconds: 0,
            language: Language::English,
            questions: vec![QuestionSnapshot {
                question_id: QuestionId::new(1),
                text: "Q1".into(),
                option_a: "a".into(),
                option_b: "b".into(),
                option_c: "c".into(),
                option_d: "d".into(),
                response: Some(ResponseSnapshot {
                    selected_option: Some(AnswerOption::A),
                    marked_for_review: false,
                }),
            }],
        }
    }

    #[tokio::test]
    async fn fetch_requires_a_loaded_snapshot() {
        let backend = InMemoryBackend::new();
        assert!(backend.fetch_attempt(AttemptId::new(1)).await.is_err());

        backend.set_snapshot(snapshot());
        let fetched = backend.fetch_attempt(AttemptId::new(1)).await.unwrap();
        assert_eq!(fetched.questions.len(), 1);
    }

    #[tokio::test]
    async fn translation_omits_questions_without_canned_text() {
        let backend = InMemoryBackend::new();
        backend.insert_target_text(
            QuestionId::new(1),
            TranslatedText {
                text: "क".into(),
                option_a: String::new(),
                option_b: String::new(),
                option_c: String::new(),
                option_d: String::new(),
            },
        );

        let response = backend
            .translate(
                AttemptId::new(1),
                &TranslateRequest {
                    question_ids: vec![QuestionId::new(1), QuestionId::new(2)],
                    direction: TranslationDirection::ToTarget,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.translations.len(), 1);
        assert!(response.translations.contains_key(&QuestionId::new(1)));
        assert_eq!(backend.translate_requests().len(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_surface_as_unavailable() {
        let backend = InMemoryBackend::new();
        backend.fail_persistence(true);
        let payload = AnswerPayload {
            question_id: QuestionId::new(1),
            selected_option: None,
            marked_for_review: false,
        };
        assert!(
            backend
                .save_answer(AttemptId::new(1), &payload)
                .await
                .is_err()
        );
        assert!(backend.answers().is_empty());
    }

    #[tokio::test]
    async fn submit_counts_calls_and_mints_result_ids() {
        let backend = InMemoryBackend::new();
        let first = backend.submit(AttemptId::new(1)).await.unwrap();
        let second = backend.submit(AttemptId::new(1)).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(backend.submit_calls(), 2);
    }
}
