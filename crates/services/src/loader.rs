//! One-shot attempt load.

use tracing::info;

use backend::AttemptRepository;
use exam_core::Clock;
use exam_core::model::AttemptId;

use crate::error::LoadError;
use crate::hooks::PresentationHooks;
use crate::session::ExamSession;

/// Fetch the attempt snapshot once and build the live session from it.
///
/// Prior answers and marks are seeded from the snapshot, the initial
/// remaining time is computed from duration minus time already spent, and
/// fullscreen presentation is requested best-effort. No retry is attempted:
/// a failure here is fatal to the session and the caller's only path is to
/// offer the user a way out.
///
/// # Errors
///
/// Returns `LoadError` on network failure, non-success status, a response
/// that is not the expected structured format, or an inconsistent snapshot.
pub async fn load_attempt(
    attempt_id: AttemptId,
    attempts: &dyn AttemptRepository,
    hooks: &dyn PresentationHooks,
    clock: Clock,
) -> Result<ExamSession, LoadError> {
    let snapshot = attempts.fetch_attempt(attempt_id).await?;
    let session = ExamSession::new(snapshot.into_session()?, clock.now());

    hooks.enter_fullscreen();

    info!(
        attempt_id = %attempt_id,
        questions = session.attempt().question_count(),
        remaining_seconds = session.remaining_seconds(),
        language = %session.attempt().language(),
        "attempt loaded"
    );
    Ok(session)
}
