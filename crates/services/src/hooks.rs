//! Presentation callbacks handed into the session controller.
//!
//! The surrounding product uses no ambient event bus here: the exam session
//! has no legitimate cross-page listeners, so the few effects it needs from
//! its host are explicit callbacks passed in at construction.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Host-provided presentation effects.
///
/// Both calls are best-effort by contract: a host that cannot enter
/// fullscreen simply does nothing, and the controller never learns about it.
pub trait PresentationHooks: Send + Sync {
    /// Requested once after a successful load.
    fn enter_fullscreen(&self) {}

    /// Requested once after a successful terminal submission.
    fn exit_fullscreen(&self) {}
}

/// Hooks for hosts with no presentation surface (headless runs, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl PresentationHooks for NoopHooks {}

/// Hooks that count invocations, for asserting controller behavior.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    entered: AtomicUsize,
    exited: AtomicUsize,
}

impl RecordingHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn exited(&self) -> usize {
        self.exited.load(Ordering::SeqCst)
    }
}

impl PresentationHooks for RecordingHooks {
    fn enter_fullscreen(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
    }

    fn exit_fullscreen(&self) {
        self.exited.fetch_add(1, Ordering::SeqCst);
    }
}
