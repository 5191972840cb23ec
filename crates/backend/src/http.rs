//! HTTP adapter for the exam backend's REST endpoints.

use std::env;

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use url::Url;

use exam_core::model::{AttemptId, ResultId};

use crate::api::{
    AnswerPayload, AttemptRepository, AttemptSnapshot, BackendError, MarkPayload,
    ResponsePersistence, SubmissionGateway, SubmitResponse, TranslateRequest, TranslateResponse,
    TranslationProvider,
};

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
    pub session_token: String,
}

impl BackendConfig {
    #[must_use]
    pub fn new(base_url: Url, session_token: impl Into<String>) -> Self {
        Self {
            base_url,
            session_token: session_token.into(),
        }
    }

    /// Read configuration from `EXAM_BASE_URL` / `EXAM_SESSION_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_BASE_URL").ok()?.parse::<Url>().ok()?;
        let session_token = env::var("EXAM_SESSION_TOKEN").ok()?;
        if session_token.trim().is_empty() {
            return None;
        }
        Some(Self::new(base_url, session_token))
    }
}

//
// ─── CLIENT ───────────────────────────────────────────────────────────────────
//

/// `reqwest`-backed implementation of every endpoint contract.
///
/// No call is retried and no client-side timeout is imposed; the exam's own
/// countdown is the only hard deadline in this subsystem.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{path}",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }

    fn check_status(response: Response) -> Result<Response, BackendError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(BackendError::HttpStatus(response.status()))
        }
    }

    /// Reject responses that are not the expected structured format, e.g. a
    /// proxy's HTML error page delivered with a 200.
    fn check_json(response: Response) -> Result<Response, BackendError> {
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        match content_type.as_deref() {
            Some(value) if value.starts_with("application/json") => Ok(response),
            _ => Err(BackendError::UnexpectedContentType(content_type)),
        }
    }
}

#[async_trait]
impl AttemptRepository for HttpBackend {
    async fn fetch_attempt(&self, id: AttemptId) -> Result<AttemptSnapshot, BackendError> {
        tracing::debug!(attempt_id = %id, "fetching attempt snapshot");
        let response = self
            .client
            .get(self.endpoint(&format!("attempt/{id}")))
            .bearer_auth(&self.config.session_token)
            .send()
            .await?;
        let response = Self::check_json(Self::check_status(response)?)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ResponsePersistence for HttpBackend {
    async fn save_answer(
        &self,
        id: AttemptId,
        answer: &AnswerPayload,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint(&format!("attempt/{id}/answer")))
            .bearer_auth(&self.config.session_token)
            .json(answer)
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    async fn save_mark(&self, id: AttemptId, mark: &MarkPayload) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint(&format!("attempt/{id}/mark-review")))
            .bearer_auth(&self.config.session_token)
            .json(mark)
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }
}

#[async_trait]
impl TranslationProvider for HttpBackend {
    async fn translate(
        &self,
        id: AttemptId,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse, BackendError> {
        let response = self
            .client
            .post(self.endpoint(&format!("attempt/{id}/translate-questions")))
            .bearer_auth(&self.config.session_token)
            .json(request)
            .send()
            .await?;
        let response = Self::check_json(Self::check_status(response)?)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SubmissionGateway for HttpBackend {
    async fn submit(&self, id: AttemptId) -> Result<ResultId, BackendError> {
        tracing::debug!(attempt_id = %id, "submitting attempt");
        let response = self
            .client
            .post(self.endpoint(&format!("attempt/{id}/submit")))
            .bearer_auth(&self.config.session_token)
            .send()
            .await?;
        let response = Self::check_json(Self::check_status(response)?)?;
        let body: SubmitResponse = response.json().await?;
        Ok(body.result_id)
    }
}
