#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod gestures;
pub mod hooks;
pub mod loader;
pub mod session;
pub mod translation;
pub mod view;

pub use exam_core::Clock;

pub use controller::{AttemptController, SubmitOutcome, SubmitTrigger};
pub use error::{LoadError, SubmitError};
pub use gestures::{Sidebar, SidebarAction, SwipeTracker};
pub use hooks::{NoopHooks, PresentationHooks, RecordingHooks};
pub use loader::load_attempt;
pub use session::{ExamSession, SessionPhase, StartSubmit};
pub use translation::{PrefetchHandles, TranslationPrefetcher};
pub use view::{PaletteEntry, QuestionStatus, ReviewSummary};
