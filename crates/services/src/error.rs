//! Shared error types for the services crate.
//!
//! The taxonomy follows how failures are surfaced: load errors are fatal to
//! the session, submission errors are recoverable and user-visible, while
//! persistence and translation failures never become errors at all — they
//! are logged and swallowed so a timed test is not interrupted.

use thiserror::Error;

use backend::BackendError;
use exam_core::model::AttemptError;

/// Errors emitted by the attempt loader. Fatal: no exam can be taken and the
/// only path left to the user is out.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Attempt(#[from] AttemptError),
}

/// Errors emitted by the submission coordinator. Recoverable: the attempt
/// stays in progress and another submission (manual or auto) is permitted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}
