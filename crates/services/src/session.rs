use chrono::{DateTime, Utc};

use exam_core::model::{
    AnswerOption, AttemptSession, AttemptStatus, Question, QuestionId, QuestionResponse, ResultId,
    TranslatedText, TranslationDirection, TranslationState,
};
use exam_core::timer::{Countdown, QuestionTimer, TickOutcome};

//
// ─── PHASE ────────────────────────────────────────────────────────────────────
//

/// Client-side lifecycle of the attempt, refining the backend status.
///
/// `Submitting` and `SubmitFailed` both still carry backend status
/// `in_progress`; only `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    Submitting,
    SubmitFailed,
    Submitted,
}

/// Outcome of trying to move into the `Submitting` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartSubmit {
    Started,
    AlreadyInFlight,
    AlreadyTerminal,
}

//
// ─── EXAM SESSION ─────────────────────────────────────────────────────────────
//

/// The live state of one timed exam attempt: attempt data plus the two
/// timers, the navigation cursor, the display direction, and the submission
/// phase machine.
///
/// Built once per attempt id by the loader and discarded after the terminal
/// transition (or on navigating away).
#[derive(Debug)]
pub struct ExamSession {
    attempt: AttemptSession,
    phase: SessionPhase,
    countdown: Countdown,
    question_timer: QuestionTimer,
    cursor: usize,
    display: TranslationDirection,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    result_id: Option<ResultId>,
}

impl ExamSession {
    /// Wrap a freshly loaded attempt. `started_at` should come from the
    /// services layer clock to keep time deterministic.
    #[must_use]
    pub fn new(attempt: AttemptSession, started_at: DateTime<Utc>) -> Self {
        let mut countdown = Countdown::new(
            attempt.duration_seconds(),
            attempt.elapsed_at_load_seconds(),
        );
        let phase = match attempt.status() {
            AttemptStatus::InProgress => SessionPhase::InProgress,
            AttemptStatus::Submitted => {
                countdown.stop();
                SessionPhase::Submitted
            }
        };

        Self {
            attempt,
            phase,
            countdown,
            question_timer: QuestionTimer::default(),
            cursor: 0,
            display: TranslationDirection::ToTarget,
            started_at,
            submitted_at: None,
            result_id: None,
        }
    }

    #[must_use]
    pub fn attempt(&self) -> &AttemptSession {
        &self.attempt
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn result_id(&self) -> Option<ResultId> {
        self.result_id
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.countdown.remaining_seconds()
    }

    #[must_use]
    pub fn question_elapsed_seconds(&self) -> u32 {
        self.question_timer.elapsed_seconds()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The question currently in view. The cursor is always in bounds for a
    /// non-empty exam set, which the attempt constructor guarantees.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.attempt.questions()[self.cursor]
    }

    #[must_use]
    pub fn display(&self) -> TranslationDirection {
        self.display
    }

    /// Change the rendition the user wants to read. Returns false when the
    /// direction is unchanged or the session is terminal.
    pub fn set_display(&mut self, direction: TranslationDirection) -> bool {
        if self.is_terminal() || self.display == direction {
            return false;
        }
        self.display = direction;
        true
    }

    // ── Clock ──

    fn timers_running(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::InProgress | SessionPhase::SubmitFailed
        )
    }

    /// Advance both timers by one second.
    ///
    /// The per-question timer only moves when the countdown actually ran,
    /// so pausing freezes both.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.timers_running() {
            return TickOutcome::Inert;
        }
        let outcome = self.countdown.tick();
        if matches!(outcome, TickOutcome::Running { .. } | TickOutcome::Expired) {
            self.question_timer.tick();
        }
        outcome
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.countdown.is_paused()
    }

    /// Freeze the countdown without resetting it. A review-time convenience,
    /// not a network operation. Returns whether the flag changed.
    pub fn pause(&mut self) -> bool {
        if !self.timers_running() || self.countdown.is_paused() {
            return false;
        }
        self.countdown.pause();
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.timers_running() || !self.countdown.is_paused() {
            return false;
        }
        self.countdown.resume();
        true
    }

    // ── Navigation ──

    /// Move the cursor, clamped to the exam set bounds. Commits the index
    /// first, then resets the per-question timer. Returns the committed
    /// index. Inert once terminal.
    pub fn go_to(&mut self, index: usize) -> usize {
        if self.is_terminal() {
            return self.cursor;
        }
        self.cursor = index.min(self.attempt.question_count() - 1);
        self.question_timer.reset();
        self.cursor
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.cursor.saturating_add(1))
    }

    pub fn prev(&mut self) -> usize {
        self.go_to(self.cursor.saturating_sub(1))
    }

    // ── Answer state (no-ops unless the attempt is still mutable) ──

    fn answers_mutable(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::InProgress | SessionPhase::SubmitFailed
        )
    }

    /// Set the selection for a question, preserving its review mark.
    pub fn select_option(
        &mut self,
        id: QuestionId,
        option: AnswerOption,
    ) -> Option<QuestionResponse> {
        if !self.answers_mutable() {
            return None;
        }
        self.attempt.select_option(id, option)
    }

    /// Clear the selection only; the review mark stays.
    pub fn clear_selection(&mut self, id: QuestionId) -> Option<QuestionResponse> {
        if !self.answers_mutable() {
            return None;
        }
        self.attempt.clear_selection(id)
    }

    /// Flip the review mark for a question.
    pub fn toggle_mark(&mut self, id: QuestionId) -> Option<QuestionResponse> {
        if !self.answers_mutable() {
            return None;
        }
        self.attempt.toggle_mark(id)
    }

    // ── Translation merge ──

    /// Merge a translation payload; see `AttemptSession::apply_translation`.
    pub fn apply_translation(
        &mut self,
        id: QuestionId,
        patch: &TranslatedText,
        state: TranslationState,
    ) -> bool {
        self.attempt.apply_translation(id, patch, state)
    }

    // ── Submission phase machine ──

    /// Try to claim the single submission slot.
    pub fn begin_submit(&mut self) -> StartSubmit {
        match self.phase {
            SessionPhase::Submitted => StartSubmit::AlreadyTerminal,
            SessionPhase::Submitting => StartSubmit::AlreadyInFlight,
            SessionPhase::InProgress | SessionPhase::SubmitFailed => {
                self.phase = SessionPhase::Submitting;
                StartSubmit::Started
            }
        }
    }

    /// The terminal transition: freeze the attempt and both timers.
    pub fn complete_submit(&mut self, result_id: ResultId, at: DateTime<Utc>) {
        self.phase = SessionPhase::Submitted;
        self.attempt.mark_submitted();
        self.countdown.stop();
        self.result_id = Some(result_id);
        self.submitted_at = Some(at);
    }

    /// Record a failed submission. The attempt stays in progress; if the
    /// deadline is already crossed, the expiry trigger is re-armed so the
    /// auto-submit path can fire again.
    pub fn fail_submit(&mut self) {
        if self.phase == SessionPhase::Submitting {
            self.phase = SessionPhase::SubmitFailed;
            self.countdown.rearm_expiry();
        }
    }
}
