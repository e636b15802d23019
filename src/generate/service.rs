//! Generation service transport
//!
//! The service is reached through the [`GenerationService`] trait so the
//! response handling in [`super::generate`] can be driven by canned responses.

use async_trait::async_trait;
use serde::Serialize;

use crate::common::Result;

/// Default generation service location
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8888";

/// Some spec hosts redirect a few times before serving content
pub const MAX_REDIRECTS: usize = 15;

/// Body of `POST /specs`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub api_key: String,
    pub swagger: String,
}

/// Raw response from the service, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

/// Something that can turn a raw spec into an annotated spec and test plans
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submit the request and return whatever came back, whatever the status
    async fn submit(&self, request: &GenerationRequest) -> Result<ServiceResponse>;
}

/// [`GenerationService`] over HTTP
pub struct HttpGenerationService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerationService {
    /// Create a client for the service rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("mqgo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/specs", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn submit(&self, request: &GenerationRequest) -> Result<ServiceResponse> {
        tracing::debug!(endpoint = %self.endpoint, bytes = request.swagger.len(), "submitting spec");

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(status, "generation service responded");
        Ok(ServiceResponse { status, body })
    }
}
