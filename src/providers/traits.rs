use async_trait::async_trait;

use super::types::{BackendError, GenerateRequest, GenerateResponse};

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, BackendError>;
}
