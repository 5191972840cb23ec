//! Presentation-agnostic read models over the live session.
//!
//! Everything here is a pure function of the current session state and is
//! recomputed on every call rather than cached: each value depends on the
//! union of the response map, the cursor, and the phase, and the question
//! counts involved are small.

use exam_core::model::{QuestionId, QuestionResponse};

use crate::session::ExamSession;

//
// ─── QUESTION STATUS ──────────────────────────────────────────────────────────
//

/// Triage status of one question for the palette grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    Marked,
    AnsweredAndMarked,
}

impl QuestionStatus {
    #[must_use]
    pub fn of(response: QuestionResponse) -> Self {
        match (response.is_answered(), response.marked_for_review) {
            (false, false) => Self::Unanswered,
            (true, false) => Self::Answered,
            (false, true) => Self::Marked,
            (true, true) => Self::AnsweredAndMarked,
        }
    }
}

/// Palette grid entry for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub index: usize,
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    pub is_current: bool,
}

/// Status of a single question by id, or `None` for an unknown id.
#[must_use]
pub fn question_status(session: &ExamSession, id: QuestionId) -> Option<QuestionStatus> {
    session.attempt().question_by_id(id)?;
    Some(QuestionStatus::of(session.attempt().response(id)))
}

/// The full palette in question order.
#[must_use]
pub fn palette(session: &ExamSession) -> Vec<PaletteEntry> {
    let cursor = session.cursor();
    session
        .attempt()
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| PaletteEntry {
            index,
            question_id: question.id(),
            status: QuestionStatus::of(session.attempt().response(question.id())),
            is_current: index == cursor,
        })
        .collect()
}

//
// ─── REVIEW SUMMARY ───────────────────────────────────────────────────────────
//

/// Counts shown on the submit confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub marked_and_answered: usize,
    pub unanswered: usize,
}

#[must_use]
pub fn review_summary(session: &ExamSession) -> ReviewSummary {
    let attempt = session.attempt();
    ReviewSummary {
        total: attempt.question_count(),
        answered: attempt.answered_count(),
        marked: attempt.marked_count(),
        marked_and_answered: attempt.marked_and_answered_count(),
        unanswered: attempt.unanswered_count(),
    }
}

//
// ─── TIME FORMATTING ──────────────────────────────────────────────────────────
//

/// Render remaining seconds as `mm:ss`, or `h:mm:ss` past the hour mark.
#[must_use]
pub fn format_remaining(total_seconds: u32) -> String {
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
