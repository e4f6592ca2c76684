pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use traits::GenerationBackend;
pub use types::{BackendError, GenerateRequest, GenerateResponse};
