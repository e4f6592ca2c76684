use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::traits::GenerationBackend;
use super::types::{BackendError, GenerateRequest, GenerateResponse};
use crate::config::BackendConfig;

/// JSON-over-HTTP client for the `/ask/` or `/generate/` route.
pub struct HttpBackend {
    client: Client,
    url: Url,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base = config.resolve_base_url();
        let url = Self::endpoint_url(&base, config.endpoint.path())?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        tracing::info!("Generation backend at {}", url);
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn endpoint_url(base: &str, path: &str) -> Result<Url> {
        let mut base = Url::parse(base).with_context(|| format!("Invalid base URL: {}", base))?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .with_context(|| format!("Failed to join {} onto {}", path, base))
    }

    fn map_send_error(e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, BackendError> {
        tracing::debug!(
            "POST {} ({} history messages, max_tokens={})",
            self.url,
            request.history.len(),
            request.max_tokens
        );

        let response = self
            .client
            .post(self.url.clone())
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Backend returned HTTP {}: {}", status.as_u16(), body);
            return Err(BackendError::RequestFailed(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
