#![forbid(unsafe_code)]

pub mod api;
pub mod http;
pub mod memory;

pub use api::{
    AnswerPayload, AttemptRepository, AttemptSnapshot, BackendError, MarkPayload,
    QuestionSnapshot, ResponsePersistence, ResponseSnapshot, SubmissionGateway, SubmitResponse,
    TranslateRequest, TranslateResponse, TranslatedTextPayload, TranslationProvider,
};
pub use http::{BackendConfig, HttpBackend};
pub use memory::InMemoryBackend;
