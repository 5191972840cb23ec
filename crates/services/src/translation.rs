//! Background translation prefetch.
//!
//! Ensures the question in view and a short lookahead window are rendered
//! in the reader's chosen script without ever blocking navigation. Two
//! passes run per navigation event: an immediate window of three starting
//! at the cursor, and after a settle delay a window of two starting three
//! questions ahead, so translation latency is amortized over reading time
//! instead of paid for the whole exam set up front.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use backend::{TranslateRequest, TranslationProvider};
use exam_core::model::{AttemptId, QuestionId, TranslationDirection};

use crate::session::ExamSession;

/// Questions covered by the immediate pass: the cursor plus the next two.
pub const IMMEDIATE_WINDOW: usize = 3;
/// The background pass starts this many questions ahead of the cursor.
pub const LOOKAHEAD_OFFSET: usize = 3;
/// Questions covered by the background pass.
pub const LOOKAHEAD_WINDOW: usize = 2;
/// Delay before the background pass, so it never competes with the
/// immediate batch while the user is still reading.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Join handles for the tasks one navigation event spawned.
///
/// Callers normally drop this (the work is fire-and-forget); tests await it
/// to make completion deterministic.
#[derive(Debug, Default)]
pub struct PrefetchHandles {
    pub immediate: Option<JoinHandle<()>>,
    pub lookahead: Option<JoinHandle<()>>,
}

impl PrefetchHandles {
    /// Wait for both passes to finish. Panics from the tasks are ignored;
    /// the passes have no observable result beyond the merged session.
    pub async fn join(self) {
        if let Some(handle) = self.immediate {
            let _ = handle.await;
        }
        if let Some(handle) = self.lookahead {
            let _ = handle.await;
        }
    }
}

/// Two-tier prefetcher over the translation endpoint.
///
/// Holds the in-flight id set used to dedupe overlapping windows; requests
/// are batched (one call per window, never per question) and failures are
/// swallowed after a log line, leaving questions in their prior state.
pub struct TranslationPrefetcher {
    attempt_id: AttemptId,
    provider: Arc<dyn TranslationProvider>,
    settle_delay: Duration,
    in_flight: Arc<Mutex<HashSet<QuestionId>>>,
}

impl TranslationPrefetcher {
    #[must_use]
    pub fn new(attempt_id: AttemptId, provider: Arc<dyn TranslationProvider>) -> Self {
        Self {
            attempt_id,
            provider,
            settle_delay: DEFAULT_SETTLE_DELAY,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    #[must_use]
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Whether this session needs prefetching at all. English attempts show
    /// authored text as-is and never touch the translation endpoint.
    fn enabled(session: &ExamSession) -> bool {
        session.attempt().language().requires_translation() && !session.is_terminal()
    }

    /// Ids in `[start, start + len)` that still show the source rendition
    /// for the active direction and have no request outstanding.
    fn plan_window(
        session: &ExamSession,
        in_flight: &HashSet<QuestionId>,
        start: usize,
        len: usize,
    ) -> Vec<QuestionId> {
        let source = session.display().source_state();
        (start..start.saturating_add(len))
            .filter_map(|index| session.attempt().question_at(index))
            .filter(|question| question.translation() == source)
            .map(exam_core::model::Question::id)
            .filter(|id| !in_flight.contains(id))
            .collect()
    }

    /// Kick both passes for the session's current cursor position.
    ///
    /// Called on every navigation event, on display-direction changes, and
    /// once right after load. Returns immediately; all network work runs on
    /// spawned tasks that re-lock the session only to merge results.
    pub fn on_navigate(&self, session: &Arc<Mutex<ExamSession>>) -> PrefetchHandles {
        let immediate = {
            let guard = lock(session);
            if !Self::enabled(&guard) {
                return PrefetchHandles::default();
            }
            let mut in_flight = lock(&self.in_flight);
            let ids = Self::plan_window(&guard, &in_flight, guard.cursor(), IMMEDIATE_WINDOW);
            in_flight.extend(ids.iter().copied());
            (!ids.is_empty()).then(|| (ids, guard.display()))
        };

        PrefetchHandles {
            immediate: immediate
                .map(|(ids, direction)| self.spawn_batch(Arc::clone(session), ids, direction)),
            lookahead: Some(self.spawn_lookahead(Arc::clone(session))),
        }
    }

    fn spawn_batch(
        &self,
        session: Arc<Mutex<ExamSession>>,
        ids: Vec<QuestionId>,
        direction: TranslationDirection,
    ) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let in_flight = Arc::clone(&self.in_flight);
        let attempt_id = self.attempt_id;
        tokio::spawn(run_batch(
            provider, session, in_flight, attempt_id, ids, direction,
        ))
    }

    fn spawn_lookahead(&self, session: Arc<Mutex<ExamSession>>) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let in_flight = Arc::clone(&self.in_flight);
        let attempt_id = self.attempt_id;
        let settle_delay = self.settle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;

            // The window is planned at fire time, against wherever the
            // cursor is now.
            let planned = {
                let guard = lock(&session);
                if !Self::enabled(&guard) {
                    return;
                }
                let mut in_flight_guard = lock(&in_flight);
                let start = guard.cursor().saturating_add(LOOKAHEAD_OFFSET);
                let ids =
                    Self::plan_window(&guard, &in_flight_guard, start, LOOKAHEAD_WINDOW);
                in_flight_guard.extend(ids.iter().copied());
                (!ids.is_empty()).then(|| (ids, guard.display()))
            };

            if let Some((ids, direction)) = planned {
                run_batch(provider, session, in_flight, attempt_id, ids, direction).await;
            }
        })
    }
}

/// One batched request plus the merge of whatever comes back.
///
/// Out-of-order or stale completions are harmless: merges are per-field,
/// keyed by id, and overwrite with equal or newer data. Questions absent
/// from the response payload are left untouched.
async fn run_batch(
    provider: Arc<dyn TranslationProvider>,
    session: Arc<Mutex<ExamSession>>,
    in_flight: Arc<Mutex<HashSet<QuestionId>>>,
    attempt_id: AttemptId,
    ids: Vec<QuestionId>,
    direction: TranslationDirection,
) {
    let request = TranslateRequest {
        question_ids: ids.clone(),
        direction,
    };
    match provider.translate(attempt_id, &request).await {
        Ok(response) => {
            let merged = response.translations.len();
            let mut guard = lock(&session);
            for (id, payload) in response.translations {
                guard.apply_translation(id, &payload.into_text(), direction.result_state());
            }
            debug!(requested = ids.len(), merged, ?direction, "translation batch merged");
        }
        Err(err) => {
            // Silent to the user: the questions stay in their prior
            // language state and navigation is never interrupted.
            warn!(error = %err, requested = ids.len(), ?direction, "translation batch failed");
        }
    }

    let mut in_flight_guard = lock(&in_flight);
    for id in &ids {
        in_flight_guard.remove(id);
    }
}
