//! The attempt controller: one object the host drives for the whole exam.
//!
//! Owns the live session behind a mutex with short critical sections; every
//! network await happens outside the lock. Answer persistence and
//! translation batches are fire-and-forget spawned tasks, the one-second
//! tick comes from `run_ticker` (or directly from tests), and both submit
//! triggers — the user's confirmation and the clock's zero crossing —
//! funnel into the same single-flight submission operation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use backend::{
    AnswerPayload, AttemptRepository, MarkPayload, ResponsePersistence, SubmissionGateway,
    TranslationProvider,
};
use exam_core::Clock;
use exam_core::model::{
    AnswerOption, AttemptId, QuestionId, QuestionResponse, ResultId, TranslationDirection,
};
use exam_core::timer::TickOutcome;

use crate::error::{LoadError, SubmitError};
use crate::hooks::PresentationHooks;
use crate::loader::load_attempt;
use crate::session::{ExamSession, StartSubmit};
use crate::translation::{PrefetchHandles, TranslationPrefetcher};
use crate::view::{self, PaletteEntry, ReviewSummary};

//
// ─── SUBMISSION TYPES ─────────────────────────────────────────────────────────
//

/// What asked for the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The user confirmed on the review step.
    Manual,
    /// The global countdown crossed zero.
    Auto,
}

/// Result of a submission request that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Terminal: route to the results view under this id.
    Submitted(ResultId),
    /// Another submission is outstanding; this trigger was dropped, not
    /// queued.
    Ignored,
    /// The attempt was already submitted.
    AlreadyTerminal,
}

//
// ─── CONTROLLER ───────────────────────────────────────────────────────────────
//

pub struct AttemptController {
    attempt_id: AttemptId,
    clock: Clock,
    session: Arc<Mutex<ExamSession>>,
    responses: Arc<dyn ResponsePersistence>,
    submissions: Arc<dyn SubmissionGateway>,
    prefetcher: TranslationPrefetcher,
    hooks: Arc<dyn PresentationHooks>,
}

impl AttemptController {
    /// Load the attempt and wrap it in a controller.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the snapshot cannot be fetched or is
    /// inconsistent; the caller should treat that as the permanent
    /// load-failed state and offer only an exit path.
    pub async fn load(
        attempt_id: AttemptId,
        attempts: &dyn AttemptRepository,
        responses: Arc<dyn ResponsePersistence>,
        translations: Arc<dyn TranslationProvider>,
        submissions: Arc<dyn SubmissionGateway>,
        hooks: Arc<dyn PresentationHooks>,
        clock: Clock,
    ) -> Result<Self, LoadError> {
        let session = load_attempt(attempt_id, attempts, hooks.as_ref(), clock).await?;
        Ok(Self {
            attempt_id,
            clock,
            session: Arc::new(Mutex::new(session)),
            responses,
            submissions,
            prefetcher: TranslationPrefetcher::new(attempt_id, translations),
            hooks,
        })
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.prefetcher = self.prefetcher.with_settle_delay(settle_delay);
        self
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    fn lock_session(&self) -> MutexGuard<'_, ExamSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the live session under the lock.
    pub fn with_session<R>(&self, f: impl FnOnce(&ExamSession) -> R) -> R {
        f(&self.lock_session())
    }

    /// Prefetch the first window without waiting for a navigation event.
    /// Call once after construction (and after any builder configuration).
    pub fn warm_up(&self) -> PrefetchHandles {
        self.prefetcher.on_navigate(&self.session)
    }

    // ── Answer store ──

    /// Select an option, preserving the review mark, and replicate the full
    /// response tuple to the backend without blocking. Returns false when
    /// the session no longer accepts answers or the id is unknown.
    pub fn select_option(&self, id: QuestionId, option: AnswerOption) -> bool {
        let applied = self.lock_session().select_option(id, option);
        match applied {
            Some(response) => {
                self.persist_answer(id, response);
                true
            }
            None => false,
        }
    }

    /// Clear the selection only (persisted as an explicit null); the review
    /// mark is untouched.
    pub fn clear_response(&self, id: QuestionId) -> bool {
        let applied = self.lock_session().clear_selection(id);
        match applied {
            Some(response) => {
                self.persist_answer(id, response);
                true
            }
            None => false,
        }
    }

    /// Flip the review mark and replicate it through the dedicated
    /// mark-review endpoint. Returns the new flag value.
    pub fn toggle_mark(&self, id: QuestionId) -> Option<bool> {
        let applied = self.lock_session().toggle_mark(id)?;
        let payload = MarkPayload {
            question_id: id,
            marked_for_review: applied.marked_for_review,
        };
        let responses = Arc::clone(&self.responses);
        let attempt_id = self.attempt_id;
        tokio::spawn(async move {
            if let Err(err) = responses.save_mark(attempt_id, &payload).await {
                warn!(question_id = %payload.question_id, error = %err, "mark save failed");
            }
        });
        Some(applied.marked_for_review)
    }

    /// Replication is best-effort: a failure is logged and local state
    /// remains the source of truth for the rest of the session.
    fn persist_answer(&self, id: QuestionId, response: QuestionResponse) {
        let payload = AnswerPayload {
            question_id: id,
            selected_option: response.selected,
            marked_for_review: response.marked_for_review,
        };
        let responses = Arc::clone(&self.responses);
        let attempt_id = self.attempt_id;
        tokio::spawn(async move {
            if let Err(err) = responses.save_answer(attempt_id, &payload).await {
                warn!(question_id = %payload.question_id, error = %err, "answer save failed");
            }
        });
    }

    // ── Navigation ──

    /// Jump to a question (bounds-clamped), then kick the prefetch passes.
    /// The cursor commit and timer reset happen before any prefetch work.
    pub fn go_to(&self, index: usize) -> PrefetchHandles {
        {
            self.lock_session().go_to(index);
        }
        self.prefetcher.on_navigate(&self.session)
    }

    pub fn next(&self) -> PrefetchHandles {
        {
            self.lock_session().next();
        }
        self.prefetcher.on_navigate(&self.session)
    }

    pub fn prev(&self) -> PrefetchHandles {
        {
            self.lock_session().prev();
        }
        self.prefetcher.on_navigate(&self.session)
    }

    /// Switch which rendition the user reads. Restoring originals asks the
    /// backend for canonical text by id through the same prefetcher.
    pub fn set_display(&self, direction: TranslationDirection) -> PrefetchHandles {
        let changed = self.lock_session().set_display(direction);
        if changed {
            self.prefetcher.on_navigate(&self.session)
        } else {
            PrefetchHandles::default()
        }
    }

    pub fn toggle_display(&self) -> PrefetchHandles {
        let direction = self.with_session(|s| s.display().flipped());
        self.set_display(direction)
    }

    // ── Clock ──

    pub fn pause(&self) -> bool {
        self.lock_session().pause()
    }

    pub fn resume(&self) -> bool {
        self.lock_session().resume()
    }

    /// Advance the session clock by one second. On the zero crossing this
    /// drives the auto-submit path before returning; the submission outcome
    /// is observable through the session phase.
    pub async fn tick(&self) -> TickOutcome {
        let outcome = { self.lock_session().tick() };
        if outcome == TickOutcome::Expired {
            info!(attempt_id = %self.attempt_id, "countdown expired, auto-submitting");
            if let Err(err) = self.submit_with(SubmitTrigger::Auto).await {
                warn!(error = %err, "auto-submit failed, attempt stays in progress");
            }
        }
        outcome
    }

    /// Drive `tick` from a wall-clock one-second interval until the attempt
    /// reaches its terminal state.
    #[must_use]
    pub fn run_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of an interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                controller.tick().await;
                if controller.with_session(ExamSession::is_terminal) {
                    break;
                }
            }
        })
    }

    // ── Submission ──

    /// Submit on explicit user confirmation.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError` when the backend call fails; the attempt stays
    /// in progress and may be retried (manually or by the auto path).
    pub async fn submit(&self) -> Result<SubmitOutcome, SubmitError> {
        self.submit_with(SubmitTrigger::Manual).await
    }

    /// Both triggers funnel here; at most one submission is ever in flight.
    /// A trigger that finds one outstanding is dropped, not queued.
    async fn submit_with(&self, trigger: SubmitTrigger) -> Result<SubmitOutcome, SubmitError> {
        match { self.lock_session().begin_submit() } {
            StartSubmit::AlreadyInFlight => return Ok(SubmitOutcome::Ignored),
            StartSubmit::AlreadyTerminal => return Ok(SubmitOutcome::AlreadyTerminal),
            StartSubmit::Started => {}
        }

        match self.submissions.submit(self.attempt_id).await {
            Ok(result_id) => {
                {
                    self.lock_session().complete_submit(result_id, self.clock.now());
                }
                self.hooks.exit_fullscreen();
                info!(attempt_id = %self.attempt_id, %result_id, ?trigger, "attempt submitted");
                Ok(SubmitOutcome::Submitted(result_id))
            }
            Err(err) => {
                {
                    self.lock_session().fail_submit();
                }
                warn!(attempt_id = %self.attempt_id, error = %err, ?trigger, "submission failed");
                Err(SubmitError::Backend(err))
            }
        }
    }

    // ── Read models ──

    #[must_use]
    pub fn review_summary(&self) -> ReviewSummary {
        self.with_session(view::review_summary)
    }

    #[must_use]
    pub fn palette(&self) -> Vec<PaletteEntry> {
        self.with_session(view::palette)
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use backend::{AttemptSnapshot, InMemoryBackend, QuestionSnapshot};
    use exam_core::model::{AttemptStatus, Language, TranslatedText, TranslationState};
    use exam_core::time::fixed_clock;

    use crate::hooks::{NoopHooks, RecordingHooks};
    use crate::session::SessionPhase;

    fn question_snapshot(id: u64) -> QuestionSnapshot {
        QuestionSnapshot {
            question_id: QuestionId::new(id),
            text: format!("Question {id}"),
            option_a: "a".into(),
            option_b: "b".into(),
            option_c: "c".into(),
            option_d: "d".into(),
            response: None,
        }
    }

    fn snapshot(question_count: u64, duration_seconds: u32, language: Language) -> AttemptSnapshot {
        AttemptSnapshot {
            attempt_id: AttemptId::new(1),
            status: AttemptStatus::InProgress,
            duration_seconds,
            elapsed_seconds: 0,
            language,
            questions: (1..=question_count).map(question_snapshot).collect(),
        }
    }

    fn hindi_text(id: u64) -> TranslatedText {
        TranslatedText {
            text: format!("प्रश्न {id}"),
            option_a: "क".into(),
            option_b: "ख".into(),
            option_c: "ग".into(),
            option_d: "घ".into(),
        }
    }

    async fn build_controller(
        backend: &Arc<InMemoryBackend>,
        hooks: Arc<dyn PresentationHooks>,
    ) -> AttemptController {
        AttemptController::load(
            AttemptId::new(1),
            backend.as_ref(),
            Arc::clone(backend) as Arc<dyn ResponsePersistence>,
            Arc::clone(backend) as Arc<dyn TranslationProvider>,
            Arc::clone(backend) as Arc<dyn SubmissionGateway>,
            hooks,
            fixed_clock(),
        )
        .await
        .unwrap()
        .with_settle_delay(Duration::ZERO)
    }

    /// Give fire-and-forget tasks a chance to run to completion. The
    /// in-memory backend never parks (outside the submit gate), so a few
    /// yields are enough on the test runtime.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn answers_replicate_in_the_background() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            3,
            3_600,
            Language::English,
        )));
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        assert!(controller.select_option(QuestionId::new(1), AnswerOption::B));
        settle().await;
        assert_eq!(controller.toggle_mark(QuestionId::new(1)), Some(true));
        settle().await;
        assert!(controller.clear_response(QuestionId::new(1)));
        settle().await;

        let answers = backend.answers();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].selected_option, Some(AnswerOption::B));
        // The cleared selection is persisted as an explicit null with the
        // mark still attached.
        assert_eq!(answers[1].selected_option, None);
        assert!(answers[1].marked_for_review);

        let marks = backend.marks();
        assert_eq!(marks.len(), 1);
        assert!(marks[0].marked_for_review);
    }

    #[tokio::test]
    async fn persistence_failure_keeps_local_state() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            2,
            3_600,
            Language::English,
        )));
        backend.fail_persistence(true);
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        assert!(controller.select_option(QuestionId::new(2), AnswerOption::D));
        settle().await;

        assert!(backend.answers().is_empty());
        // Local state is authoritative for the rest of the session.
        let selected =
            controller.with_session(|s| s.attempt().response(QuestionId::new(2)).selected);
        assert_eq!(selected, Some(AnswerOption::D));
    }

    #[tokio::test]
    async fn manual_submit_reaches_terminal_state() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            2,
            3_600,
            Language::English,
        )));
        let hooks = Arc::new(RecordingHooks::new());
        let controller =
            build_controller(&backend, Arc::clone(&hooks) as Arc<dyn PresentationHooks>).await;

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
        assert!(controller.with_session(ExamSession::is_terminal));
        assert_eq!(hooks.exited(), 1);

        // Every subsystem is inert afterwards.
        assert!(!controller.select_option(QuestionId::new(1), AnswerOption::A));
        assert_eq!(controller.tick().await, TickOutcome::Inert);
        assert_eq!(
            controller.submit().await.unwrap(),
            SubmitOutcome::AlreadyTerminal
        );
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn second_trigger_while_in_flight_is_dropped() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            1,
            3_600,
            Language::English,
        )));
        backend.hold_submit();
        let controller = Arc::new(build_controller(&backend, Arc::new(NoopHooks)).await);

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.submit().await })
        };
        settle().await;

        // The first submission is parked at the gate; a second trigger is
        // dropped without another backend call.
        assert_eq!(controller.submit().await.unwrap(), SubmitOutcome::Ignored);
        assert_eq!(backend.submit_calls(), 1);

        backend.release_submit();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn expiry_auto_submits_exactly_once() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            1,
            2,
            Language::English,
        )));
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        assert!(matches!(
            controller.tick().await,
            TickOutcome::Running { remaining_seconds: 1 }
        ));
        assert_eq!(controller.tick().await, TickOutcome::Expired);

        assert!(controller.with_session(ExamSession::is_terminal));
        assert_eq!(backend.submit_calls(), 1);

        assert_eq!(controller.tick().await, TickOutcome::Inert);
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn failed_auto_submit_retries_while_deadline_holds() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            1,
            1,
            Language::English,
        )));
        backend.fail_submit(true);
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        assert_eq!(controller.tick().await, TickOutcome::Expired);
        assert_eq!(
            controller.with_session(ExamSession::phase),
            SessionPhase::SubmitFailed
        );
        assert_eq!(backend.submit_calls(), 1);

        // The deadline still holds, so the next tick fires the trigger
        // again; this time the backend recovers.
        backend.fail_submit(false);
        assert_eq!(controller.tick().await, TickOutcome::Expired);
        assert!(controller.with_session(ExamSession::is_terminal));
        assert_eq!(backend.submit_calls(), 2);
    }

    #[tokio::test]
    async fn failed_manual_submit_allows_retry() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            1,
            3_600,
            Language::English,
        )));
        backend.fail_submit(true);
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        assert!(controller.submit().await.is_err());
        assert_eq!(
            controller.with_session(ExamSession::phase),
            SessionPhase::SubmitFailed
        );

        backend.fail_submit(false);
        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    }

    #[tokio::test]
    async fn navigation_prefetches_both_windows() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            8,
            3_600,
            Language::Hindi,
        )));
        for id in 1..=8 {
            backend.insert_target_text(QuestionId::new(id), hindi_text(id));
        }
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        controller.warm_up().join().await;

        // Immediate window 1..=3, lookahead window 4..=5.
        let states: Vec<_> = controller.with_session(|s| {
            s.attempt()
                .questions()
                .iter()
                .map(|q| q.translation())
                .collect()
        });
        assert_eq!(
            states,
            vec![
                TranslationState::Translated,
                TranslationState::Translated,
                TranslationState::Translated,
                TranslationState::Translated,
                TranslationState::Translated,
                TranslationState::Original,
                TranslationState::Original,
                TranslationState::Original,
            ]
        );

        // Each pass is one batched call, not one call per question. The two
        // passes race on the runtime, so sizes are checked order-free.
        let requests = backend.translate_requests();
        assert_eq!(requests.len(), 2);
        let mut sizes: Vec<_> = requests.iter().map(|r| r.question_ids.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 3]);

        // Moving on only fetches what the new windows still need: already
        // translated questions are skipped, never re-requested.
        controller.go_to(4).join().await;
        let requests = backend.translate_requests();
        let mut fetched: Vec<_> = requests
            .iter()
            .flat_map(|r| r.question_ids.iter().copied())
            .collect();
        fetched.sort_unstable();
        let expected: Vec<_> = (1..=8).map(QuestionId::new).collect();
        assert_eq!(fetched, expected);
    }

    #[tokio::test]
    async fn english_attempts_never_call_the_translator() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            5,
            3_600,
            Language::English,
        )));
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        controller.warm_up().join().await;
        controller.next().join().await;

        assert!(backend.translate_requests().is_empty());
    }

    #[tokio::test]
    async fn translation_failure_is_silent_and_retryable() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            3,
            3_600,
            Language::Hindi,
        )));
        backend.fail_translation(true);
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        controller.warm_up().join().await;

        // Questions keep their prior language state.
        let states: Vec<_> = controller.with_session(|s| {
            s.attempt()
                .questions()
                .iter()
                .map(|q| q.translation())
                .collect()
        });
        assert!(states.iter().all(|s| *s == TranslationState::Original));

        // The in-flight set was drained, so a later pass can try again.
        backend.fail_translation(false);
        for id in 1..=3 {
            backend.insert_target_text(QuestionId::new(id), hindi_text(id));
        }
        controller.go_to(0).join().await;
        let state = controller.with_session(|s| s.attempt().questions()[0].translation());
        assert_eq!(state, TranslationState::Translated);
    }

    #[tokio::test]
    async fn display_toggle_restores_originals_from_the_backend() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            3,
            3_600,
            Language::Hindi,
        )));
        for id in 1..=3 {
            backend.insert_target_text(QuestionId::new(id), hindi_text(id));
            backend.insert_original_text(
                QuestionId::new(id),
                TranslatedText {
                    text: format!("Question {id}"),
                    option_a: "a".into(),
                    option_b: "b".into(),
                    option_c: "c".into(),
                    option_d: "d".into(),
                },
            );
        }
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        controller.warm_up().join().await;
        assert_eq!(
            controller.with_session(|s| s.current_question().text().to_owned()),
            "प्रश्न 1"
        );

        controller.toggle_display().join().await;
        assert_eq!(
            controller.with_session(|s| s.current_question().text().to_owned()),
            "Question 1"
        );
        assert_eq!(
            controller.with_session(|s| s.current_question().translation()),
            TranslationState::Original
        );

        let directions: Vec<_> = backend
            .translate_requests()
            .iter()
            .map(|r| r.direction)
            .collect();
        assert!(directions.contains(&TranslationDirection::ToOriginal));
    }

    #[tokio::test]
    async fn review_summary_matches_the_confirmation_scenario() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            10,
            3_600,
            Language::English,
        )));
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        controller.select_option(QuestionId::new(1), AnswerOption::B);
        controller.go_to(1);
        controller.toggle_mark(QuestionId::new(2));

        let summary = controller.review_summary();
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.marked, 1);
        assert_eq!(summary.marked_and_answered, 0);
        assert_eq!(summary.unanswered, 9);

        let palette = controller.palette();
        assert!(palette[1].is_current);
    }

    #[tokio::test]
    async fn navigation_resets_the_question_timer() {
        let backend = Arc::new(InMemoryBackend::with_snapshot(snapshot(
            4,
            3_600,
            Language::English,
        )));
        let controller = build_controller(&backend, Arc::new(NoopHooks)).await;

        controller.tick().await;
        controller.tick().await;
        assert_eq!(controller.with_session(ExamSession::question_elapsed_seconds), 2);

        controller.go_to(3);
        assert_eq!(controller.with_session(ExamSession::question_elapsed_seconds), 0);
        assert_eq!(controller.with_session(ExamSession::cursor), 3);
    }
}
